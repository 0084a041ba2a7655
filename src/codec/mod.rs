/// Codecs map tokens to dense integer indices and back
///
/// Two strategies share the [`Codec`] trait:
/// - [`TokenCodec`]: closed vocabulary collected from a training scan
/// - [`GloVeCodec`]: open vocabulary bounded by a pretrained vector table
///
/// Both reserve index 0 for PAD and index 1 for OOV. Codecs are immutable once
/// built, so a single instance can be shared by any number of readers.
pub mod glove_codec;
pub mod io;
pub mod persist;
pub mod token_codec;
mod vocabulary;

use std::borrow::Borrow;

use ndarray::Array1;

use crate::core::error::{Error, Result};
use crate::core::types::Token;

pub use glove_codec::GloVeCodec;
pub use persist::{SavedCodec, load_codec};
pub use token_codec::TokenCodec;

pub const PAD_INDEX: usize = 0;
pub const OOV_INDEX: usize = 1;
/// Number of slots every codec reserves before its own vocabulary
pub const RESERVED_SLOTS: usize = 2;

pub trait Codec {
    /// Total number of indices, used to size a model's output layer
    fn vocabulary_size(&self) -> usize;

    /// Index of a token, falling back to [`OOV_INDEX`] for anything unknown
    fn index(&self, token: &Token) -> usize;

    /// Token stored at an index
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] when `index >= vocabulary_size()`
    fn token(&self, index: usize) -> Result<&Token>;

    /// Lazily encode a token sequence, one index per token
    fn encode<I>(&self, tokens: I) -> impl Iterator<Item = usize>
    where
        I: IntoIterator,
        I::Item: Borrow<Token>,
    {
        tokens.into_iter().map(move |token| self.index(token.borrow()))
    }

    /// Lazily decode an index sequence. Each out-of-range index yields an error.
    fn decode<I>(&self, indices: I) -> impl Iterator<Item = Result<Token>>
    where
        I: IntoIterator<Item = usize>,
    {
        indices.into_iter().map(move |index| self.token(index).cloned())
    }

    /// Discrete numeric form of an index: a one-hot row of length `vocabulary_size`
    fn one_hot(&self, index: usize) -> Result<Array1<f32>> {
        let vocabulary_size = self.vocabulary_size();
        if index >= vocabulary_size {
            return Err(Error::IndexOutOfRange {
                index,
                vocabulary_size,
            });
        }
        let mut row = Array1::zeros(vocabulary_size);
        row[index] = 1.0;
        Ok(row)
    }
}
