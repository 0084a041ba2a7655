/// Tokenizers turn raw text into (context window, target) training examples
///
/// Both variants share the same windowing: the context starts as PAD, each
/// token becomes a target once, and PAD targets trail the text until the
/// window holds only PAD.
pub mod character;
pub mod segment;
pub mod sentence;
pub mod window;

pub use character::CharacterTokenizer;
pub use segment::{PunctuationSegmenter, Segmenter};
pub use sentence::SentenceTokenizer;

use crate::codec::Codec;
use crate::core::error::Result;
use crate::core::types::{EncodedExample, Example};

pub trait Tokenizer {
    type Codec: Codec;

    fn codec(&self) -> &Self::Codec;

    fn context_size(&self) -> usize;

    /// Examples over `text`, with the literal tokens as targets
    fn tokenize<'a>(&'a self, text: &'a str) -> Result<impl Iterator<Item = Example> + 'a>;

    /// Examples over `text`, encoded with this tokenizer's codec
    fn encoded<'a>(&'a self, text: &'a str) -> Result<impl Iterator<Item = EncodedExample> + 'a> {
        let codec = self.codec();
        Ok(self.tokenize(text)?.map(move |example| example.encode(codec)))
    }
}
