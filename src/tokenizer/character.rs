use log::info;

use crate::codec::TokenCodec;
use crate::core::error::{Error, Result};
use crate::core::types::{Example, Token};
use crate::reader::{TextSource, characters};

use super::Tokenizer;
use super::window::{Windows, windows};

/// Character-level tokenizer over a closed [`TokenCodec`]
///
/// Targets are the literal characters of the text; characters missing from
/// the codec are only mapped to OOV when an example is encoded.
#[derive(Debug, Clone)]
pub struct CharacterTokenizer {
    codec: TokenCodec,
    context_size: usize,
}

impl CharacterTokenizer {
    pub fn new(codec: TokenCodec, context_size: usize) -> Result<Self> {
        if context_size == 0 {
            return Err(Error::InvalidContextSize(context_size));
        }
        Ok(Self {
            codec,
            context_size,
        })
    }

    /// Scan the documents once to build the character codec
    ///
    /// `limit` caps how many characters are read, across all sources.
    pub fn create_from_documents<S: TextSource>(
        sources: &[S],
        context_size: usize,
        limit: Option<usize>,
    ) -> Result<Self> {
        if context_size == 0 {
            return Err(Error::InvalidContextSize(context_size));
        }
        let stream = characters(sources).take(limit.unwrap_or(usize::MAX));
        let codec = TokenCodec::try_create_from_tokens(stream)?;
        info!(
            "Character tokenizer over {} sources: {}, context size {}",
            sources.len(),
            codec,
            context_size
        );
        Self::new(codec, context_size)
    }

    /// Lazily produce examples from documents, re-reading them from the start
    pub fn tokenize_documents<'a, S: TextSource>(
        &'a self,
        sources: &'a [S],
        limit: Option<usize>,
    ) -> impl Iterator<Item = Result<Example>> + 'a {
        let stream = characters(sources)
            .take(limit.unwrap_or(usize::MAX))
            .map(|c| c.map(Token::from).map_err(Error::from));
        Windows::new(stream, self.context_size)
    }
}

impl Tokenizer for CharacterTokenizer {
    type Codec = TokenCodec;

    fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn context_size(&self) -> usize {
        self.context_size
    }

    fn tokenize<'a>(&'a self, text: &'a str) -> Result<impl Iterator<Item = Example> + 'a> {
        Ok(windows(text.chars().map(Token::from), self.context_size))
    }
}
