/// Pretrained word vector sources
///
/// A source is a table of words, each with a dense vector and a global
/// frequency rank (0 = most frequent). The GloVe codec only needs to look up
/// vectors and enumerate the top-N words by rank.
pub mod glove;

pub use glove::GloveVectors;

use crate::core::error::Result;

pub trait VectorSource {
    /// Length of every vector in the table
    fn dimension(&self) -> usize;

    /// Number of words available
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn vector(&self, word: &str) -> Option<&[f32]>;

    /// Frequency rank of a word, 0 being the most frequent
    fn rank(&self, word: &str) -> Option<usize>;

    /// The `n` most frequent words, most frequent first
    ///
    /// # Errors
    /// Returns [`crate::Error::CapacityExceeded`] when `n > len()`
    fn top_n(&self, n: usize) -> Result<Vec<&str>>;
}
