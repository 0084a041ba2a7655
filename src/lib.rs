pub mod codec;
pub mod core;
/// Eager materialization of encoded examples into training arrays
///
/// Everything here collects its whole input. Feed it a bounded slice of a
/// tokenizer's stream, not an entire corpus.
pub mod data;
/// Sliding-window text generation driven by an external model
///
/// The model is anything that turns a context of indices into one logit per
/// vocabulary entry. The generator owns the context, the sampling and the
/// decoding; it never trains anything.
pub mod generate;
pub mod math;
/// Lazy, repeatable readers over one or more text sources
///
/// Sources are re-opened on every pass, so the same slice of sources can be
/// scanned once to build a codec and again to produce training windows.
pub mod reader;
pub mod tokenizer;
pub mod vectors;

pub use crate::codec::{Codec, GloVeCodec, SavedCodec, TokenCodec, load_codec};
pub use crate::core::error::{Error, Result};
pub use crate::core::types::{EncodedExample, Example, Token};
pub use crate::tokenizer::{
    CharacterTokenizer, PunctuationSegmenter, Segmenter, SentenceTokenizer, Tokenizer,
};
