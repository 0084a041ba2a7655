use std::collections::HashMap;

use crate::core::error::{Error, Result};
use crate::core::types::Token;

use super::{OOV_INDEX, RESERVED_SLOTS};

/// Dense, insertion-ordered token table shared by both codecs
///
/// Slots 0 and 1 always hold PAD and OOV. Every other token gets the next free
/// index the first time it is inserted.
#[derive(Debug, Clone)]
pub(crate) struct Vocabulary {
    tokens: Vec<Token>,
    index: HashMap<Token, usize>,
}

impl Vocabulary {
    pub(crate) fn new() -> Self {
        let mut vocabulary = Self {
            tokens: Vec::new(),
            index: HashMap::new(),
        };
        for reserved in [Token::pad(), Token::oov()] {
            vocabulary.index.insert(reserved.clone(), vocabulary.tokens.len());
            vocabulary.tokens.push(reserved);
        }
        vocabulary
    }

    /// Returns false when the token was already present
    pub(crate) fn insert(&mut self, token: Token) -> bool {
        if self.index.contains_key(&token) {
            return false;
        }
        self.index.insert(token.clone(), self.tokens.len());
        self.tokens.push(token);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn index_of(&self, token: &Token) -> usize {
        self.index.get(token).copied().unwrap_or(OOV_INDEX)
    }

    pub(crate) fn token(&self, index: usize) -> Result<&Token> {
        self.tokens.get(index).ok_or(Error::IndexOutOfRange {
            index,
            vocabulary_size: self.tokens.len(),
        })
    }

    /// Everything after the reserved slots, in index order
    pub(crate) fn entries(&self) -> &[Token] {
        &self.tokens[RESERVED_SLOTS..]
    }
}
