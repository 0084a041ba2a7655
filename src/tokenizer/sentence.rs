use std::iter;

use log::{debug, info};

use crate::codec::{Codec, GloVeCodec, OOV_INDEX};
use crate::core::error::{Error, Result};
use crate::core::types::{EOS_NAME, Example, Token};
use crate::reader::{TextSource, blocks};
use crate::vectors::VectorSource;

use super::Tokenizer;
use super::segment::Segmenter;
use super::window::{Windows, windows};

/// Word-level tokenizer that marks sentence ends
///
/// The segmenter splits text into sentences of words; each sentence is
/// followed by one `-EOS-` meta token and the whole sequence is windowed like
/// characters are. EOS is ordinary window content.
#[derive(Debug, Clone)]
pub struct SentenceTokenizer<S> {
    codec: GloVeCodec,
    context_size: usize,
    segmenter: S,
}

fn sentence_tokens(sentences: Vec<Vec<String>>) -> impl Iterator<Item = Token> {
    sentences
        .into_iter()
        .flat_map(|words| words.into_iter().map(Token::text).chain(iter::once(Token::eos())))
}

impl<S: Segmenter> SentenceTokenizer<S> {
    /// # Errors
    /// - [`Error::InvalidContextSize`] if `context_size` is zero
    /// - [`Error::MissingMetaToken`] if the codec has no `-EOS-` slot
    pub fn new(codec: GloVeCodec, context_size: usize, segmenter: S) -> Result<Self> {
        if context_size == 0 {
            return Err(Error::InvalidContextSize(context_size));
        }
        if codec.index(&Token::eos()) == OOV_INDEX {
            return Err(Error::MissingMetaToken(EOS_NAME.to_string()));
        }
        Ok(Self {
            codec,
            context_size,
            segmenter,
        })
    }

    /// Build the codec from the `capacity` most frequent words of `source`,
    /// with `-EOS-` as its only meta token
    pub fn create<V: VectorSource + ?Sized>(
        source: &V,
        capacity: usize,
        context_size: usize,
        segmenter: S,
    ) -> Result<Self> {
        let codec = GloVeCodec::create(source, capacity, [EOS_NAME])?;
        info!("Sentence tokenizer: {}, context size {}", codec, context_size);
        Self::new(codec, context_size, segmenter)
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Lazily produce examples from documents, one paragraph at a time
    ///
    /// A read or segmentation error is yielded once and ends the stream.
    pub fn tokenize_documents<'a, T: TextSource>(
        &'a self,
        sources: &'a [T],
    ) -> impl Iterator<Item = Result<Example>> + 'a {
        let stream = blocks(sources).flat_map(move |block| {
            let tokens: Vec<Result<Token>> = match block
                .map_err(Error::from)
                .and_then(|text| self.segmenter.sentences(&text))
            {
                Ok(sentences) => {
                    debug!("Segmented block into {} sentences", sentences.len());
                    sentence_tokens(sentences).map(Ok).collect()
                }
                Err(e) => vec![Err(e)],
            };
            tokens
        });
        Windows::new(stream, self.context_size)
    }
}

impl<S: Segmenter> Tokenizer for SentenceTokenizer<S> {
    type Codec = GloVeCodec;

    fn codec(&self) -> &GloVeCodec {
        &self.codec
    }

    fn context_size(&self) -> usize {
        self.context_size
    }

    fn tokenize<'a>(&'a self, text: &'a str) -> Result<impl Iterator<Item = Example> + 'a> {
        let sentences = self.segmenter.sentences(text)?;
        Ok(windows(sentence_tokens(sentences), self.context_size))
    }
}
