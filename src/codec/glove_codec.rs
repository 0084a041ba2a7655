use std::fmt;

use log::info;
use ndarray::{Array2, ArrayView1};

use crate::core::error::{Error, Result};
use crate::core::types::Token;
use crate::vectors::VectorSource;

use super::vocabulary::Vocabulary;
use super::{Codec, RESERVED_SLOTS};

/// Open-vocabulary word codec backed by pretrained embeddings
///
/// # Index layout
/// - 0: PAD
/// - 1: OOV
/// - 2..2+k: the k meta tokens, in the order they were supplied
/// - 2+k..: the N most frequent words of the vector source, most frequent first
///
/// The embedding matrix has one row per index. Rows for PAD, OOV and the meta
/// tokens are zero; word rows hold the pretrained vectors.
#[derive(Debug, Clone)]
pub struct GloVeCodec {
    vocabulary: Vocabulary,
    meta_count: usize,
    embedding: Array2<f32>,
}

impl GloVeCodec {
    /// Select the `capacity` most frequent words of `source` and reserve a slot
    /// for each meta token name
    ///
    /// # Errors
    /// - [`Error::CapacityExceeded`] if the source holds fewer than `capacity` words
    /// - [`Error::ReservedMetaToken`] if a meta name is `-PAD-` or `-OOV-`
    pub fn create<V, I, S>(source: &V, capacity: usize, meta: I) -> Result<Self>
    where
        V: VectorSource + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = source.top_n(capacity)?;

        let mut vocabulary = Vocabulary::new();
        for name in meta {
            let token = Token::meta(name);
            if token.is_reserved() {
                return Err(Error::ReservedMetaToken(token.value().to_string()));
            }
            vocabulary.insert(token);
        }
        let meta_count = vocabulary.len() - RESERVED_SLOTS;

        let mut embedding = Array2::zeros((vocabulary.len() + words.len(), source.dimension()));
        for word in words {
            let vector = source.vector(word).ok_or_else(|| {
                Error::MalformedCodec(format!("vector source has no vector for '{}'", word))
            })?;
            let row = vocabulary.len();
            if !vocabulary.insert(Token::text(word)) {
                return Err(Error::MalformedCodec(format!(
                    "vector source lists '{}' twice",
                    word
                )));
            }
            embedding.row_mut(row).assign(&ArrayView1::from(vector));
        }

        let codec = Self {
            vocabulary,
            meta_count,
            embedding,
        };
        info!(
            "Built GloVeCodec with {} words, {} meta tokens, vocabulary size {}",
            codec.capacity(),
            codec.meta_count,
            codec.vocabulary_size()
        );
        Ok(codec)
    }

    /// Rebuild a codec from stored parts
    ///
    /// # Errors
    /// Returns [`Error::MalformedCodec`] on duplicates, reserved names, or a
    /// matrix whose row count differs from the vocabulary size
    pub(crate) fn from_parts(
        meta: Vec<String>,
        words: Vec<String>,
        embedding: Array2<f32>,
    ) -> Result<Self> {
        let mut vocabulary = Vocabulary::new();
        let meta_count = meta.len();
        let entries = meta
            .into_iter()
            .map(Token::meta)
            .chain(words.into_iter().map(Token::text));
        for token in entries {
            if token.is_reserved() {
                return Err(Error::MalformedCodec(format!(
                    "reserved token '{}' stored as a meta token",
                    token
                )));
            }
            let description = token.to_string();
            if !vocabulary.insert(token) {
                return Err(Error::MalformedCodec(format!(
                    "duplicate entry '{}' in the vocabulary list",
                    description
                )));
            }
        }
        if embedding.nrows() != vocabulary.len() {
            return Err(Error::MalformedCodec(format!(
                "embedding matrix has {} rows for a vocabulary of {}",
                embedding.nrows(),
                vocabulary.len()
            )));
        }
        Ok(Self {
            vocabulary,
            meta_count,
            embedding,
        })
    }

    /// Number of pretrained words (N)
    pub fn capacity(&self) -> usize {
        self.vocabulary.len() - RESERVED_SLOTS - self.meta_count
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding.ncols()
    }

    /// The meta tokens, in index order
    pub fn meta_tokens(&self) -> &[Token] {
        &self.vocabulary.entries()[..self.meta_count]
    }

    /// The pretrained words, in index order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.entries()[self.meta_count..]
            .iter()
            .map(Token::value)
    }

    /// Dense `(vocabulary_size, embedding_dim)` table, row i for index i
    pub fn embedding_matrix(&self) -> &Array2<f32> {
        &self.embedding
    }

    /// Dense numeric form of an index: its embedding row
    pub fn embedding(&self, index: usize) -> Result<ArrayView1<'_, f32>> {
        if index >= self.vocabulary_size() {
            return Err(Error::IndexOutOfRange {
                index,
                vocabulary_size: self.vocabulary_size(),
            });
        }
        Ok(self.embedding.row(index))
    }
}

impl Codec for GloVeCodec {
    fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn index(&self, token: &Token) -> usize {
        self.vocabulary.index_of(token)
    }

    fn token(&self, index: usize) -> Result<&Token> {
        self.vocabulary.token(index)
    }
}

impl fmt::Display for GloVeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GloVeCodec: vocabulary size {}", self.vocabulary_size())
    }
}
