use std::borrow::Borrow;
use std::collections::VecDeque;

use log::debug;
use ndarray::ArrayView1;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use crate::codec::{Codec, PAD_INDEX};
use crate::core::error::{Error, Result};
use crate::core::types::Token;
use crate::math::softmax;

/// Next-token scorer over a fixed-width context of indices
pub trait Predictor {
    /// One logit per vocabulary index for the token that follows `context`
    fn logits(&self, context: &[usize]) -> Result<Vec<f32>>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn logits(&self, context: &[usize]) -> Result<Vec<f32>> {
        (**self).logits(context)
    }
}

pub struct Generator<'a, C: ?Sized, P: ?Sized> {
    codec: &'a C,
    predictor: &'a P,
    context: VecDeque<usize>,
    temperature: f32,
    rng: StdRng,
}

impl<'a, C, P> Generator<'a, C, P>
where
    C: Codec + ?Sized,
    P: Predictor + ?Sized,
{
    /// Start from an all-PAD context
    ///
    /// A `temperature` of zero or less picks the highest logit every step.
    pub fn new(
        codec: &'a C,
        predictor: &'a P,
        context_size: usize,
        temperature: f32,
        seed: u64,
    ) -> Result<Self> {
        if context_size == 0 {
            return Err(Error::InvalidContextSize(context_size));
        }
        Ok(Self {
            codec,
            predictor,
            context: std::iter::repeat_n(PAD_INDEX, context_size).collect(),
            temperature,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Slide a prompt into the context; only its last `context_size` tokens stay
    pub fn with_prompt<I>(mut self, prompt: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Token>,
    {
        let indices: Vec<usize> = self.codec.encode(prompt).collect();
        for index in indices {
            self.push(index);
        }
        self
    }

    pub fn context(&self) -> Vec<usize> {
        self.context.iter().copied().collect()
    }

    fn push(&mut self, index: usize) {
        self.context.pop_front();
        self.context.push_back(index);
    }

    fn sample(&mut self, logits: &[f32]) -> Result<usize> {
        if self.temperature <= 0.0 {
            return Ok(logits
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (index, &logit)| {
                    if logit > best.1 { (index, logit) } else { best }
                })
                .0);
        }
        let probabilities = softmax(ArrayView1::from(logits), self.temperature);
        let distribution = WeightedIndex::new(probabilities.iter())
            .map_err(|e| Error::Sampling(e.to_string()))?;
        Ok(distribution.sample(&mut self.rng))
    }

    /// Predict, sample and slide one index into the context
    ///
    /// # Errors
    /// Returns [`Error::PredictionShape`] if the predictor's output length
    /// differs from the codec's vocabulary size
    pub fn next_index(&mut self) -> Result<usize> {
        let context = self.context();
        let logits = self.predictor.logits(&context)?;
        let expected = self.codec.vocabulary_size();
        if logits.len() != expected {
            return Err(Error::PredictionShape {
                expected,
                actual: logits.len(),
            });
        }
        let index = self.sample(&logits)?;
        self.push(index);
        Ok(index)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let index = self.next_index()?;
        self.codec.token(index).cloned()
    }

    pub fn generate(&mut self, n: usize) -> Result<Vec<Token>> {
        (0..n).map(|_| self.next_token()).collect()
    }

    /// Generate `n` tokens and join the non-meta ones with `separator`
    pub fn generate_text(&mut self, n: usize, separator: &str) -> Result<String> {
        let tokens = self.generate(n)?;
        let words: Vec<&str> = tokens
            .iter()
            .filter(|token| !token.is_meta())
            .map(Token::value)
            .collect();
        debug!("Generated {} tokens, {} kept", tokens.len(), words.len());
        Ok(words.join(separator))
    }
}
