use log::debug;
use ndarray::{Array2, Array3, s};

use crate::codec::GloVeCodec;
use crate::core::error::{Error, Result};
use crate::core::types::EncodedExample;

/// Index contexts and one-hot labels, one row per example
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledData {
    /// `(N, context_size)` token indices
    pub contexts: Array2<usize>,
    /// `(N, vocabulary_size)` one-hot targets
    pub labels: Array2<f32>,
}

impl LabeledData {
    pub fn len(&self) -> usize {
        self.contexts.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_context(example: &EncodedExample, context_size: usize) -> Result<()> {
    if example.context.len() != context_size {
        return Err(Error::ContextLength {
            expected: context_size,
            actual: example.context.len(),
        });
    }
    Ok(())
}

fn check_index(index: usize, vocabulary_size: usize) -> Result<()> {
    if index >= vocabulary_size {
        return Err(Error::IndexOutOfRange {
            index,
            vocabulary_size,
        });
    }
    Ok(())
}

/// Collect encoded examples into a [`LabeledData`]
///
/// # Errors
/// - [`Error::ContextLength`] if a context is not `context_size` long
/// - [`Error::IndexOutOfRange`] if any index falls outside the vocabulary
pub fn labeled_data<I>(
    examples: I,
    context_size: usize,
    vocabulary_size: usize,
) -> Result<LabeledData>
where
    I: IntoIterator<Item = EncodedExample>,
{
    let examples: Vec<EncodedExample> = examples.into_iter().collect();
    let mut contexts = Array2::zeros((examples.len(), context_size));
    let mut labels = Array2::zeros((examples.len(), vocabulary_size));
    for (row, example) in examples.iter().enumerate() {
        check_context(example, context_size)?;
        for (position, &index) in example.context.iter().enumerate() {
            check_index(index, vocabulary_size)?;
            contexts[[row, position]] = index;
        }
        check_index(example.target, vocabulary_size)?;
        labels[[row, example.target]] = 1.0;
    }
    let rows = examples.len();
    debug!("Labeled {} examples over a vocabulary of {}", rows, vocabulary_size);
    Ok(LabeledData { contexts, labels })
}

/// Look up every context index in the codec's embedding matrix
///
/// Returns an `(N, context_size, embedding_dim)` tensor. The context size is
/// taken from the first example; later examples must match it.
pub fn embedded_contexts<I>(codec: &GloVeCodec, examples: I) -> Result<Array3<f32>>
where
    I: IntoIterator<Item = EncodedExample>,
{
    let examples: Vec<EncodedExample> = examples.into_iter().collect();
    let context_size = examples.first().map_or(0, |example| example.context.len());
    let mut tensor = Array3::zeros((examples.len(), context_size, codec.embedding_dim()));
    for (row, example) in examples.iter().enumerate() {
        check_context(example, context_size)?;
        for (position, &index) in example.context.iter().enumerate() {
            tensor
                .slice_mut(s![row, position, ..])
                .assign(&codec.embedding(index)?);
        }
    }
    Ok(tensor)
}
