use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::Codec;

/// Name of the padding token (index 0 in every codec)
pub const PAD_NAME: &str = "-PAD-";
/// Name of the out-of-vocabulary token (index 1 in every codec)
pub const OOV_NAME: &str = "-OOV-";
/// Name of the end-of-sentence marker appended by the sentence tokenizer
pub const EOS_NAME: &str = "-EOS-";

/// Atomic unit of text: a character, a word, or a synthetic marker
///
/// Literal text and meta markers live in separate variants, so a meta token
/// never compares equal to a word that happens to share its spelling.
/// Tokens order by value first; text sorts before meta on a tie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Text(String),
    Meta(String),
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text(value.into())
    }

    pub fn meta(name: impl Into<String>) -> Self {
        Token::Meta(name.into())
    }

    pub fn pad() -> Self {
        Token::meta(PAD_NAME)
    }

    pub fn oov() -> Self {
        Token::meta(OOV_NAME)
    }

    pub fn eos() -> Self {
        Token::meta(EOS_NAME)
    }

    /// String key used for vocabulary lookups
    pub fn value(&self) -> &str {
        match self {
            Token::Text(value) | Token::Meta(value) => value,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Token::Meta(_))
    }

    /// True for the two slots every codec reserves (PAD and OOV)
    pub fn is_reserved(&self) -> bool {
        matches!(self, Token::Meta(name) if name == PAD_NAME || name == OOV_NAME)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(other.value())
            .then_with(|| self.is_meta().cmp(&other.is_meta()))
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<char> for Token {
    fn from(c: char) -> Self {
        Token::Text(c.to_string())
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::Text(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::Text(s)
    }
}

/// One training example: the tokens preceding a target, and the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Exactly `context_size` tokens, left-padded with PAD
    pub context: Vec<Token>,
    pub target: Token,
}

impl Example {
    pub fn new(context: Vec<Token>, target: Token) -> Self {
        Self { context, target }
    }

    /// Map the window and target through a codec. Unknown tokens become OOV.
    pub fn encode<C: Codec + ?Sized>(&self, codec: &C) -> EncodedExample {
        EncodedExample {
            context: self.context.iter().map(|token| codec.index(token)).collect(),
            target: codec.index(&self.target),
        }
    }
}

/// Integer form of an [`Example`], as consumed by a training loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedExample {
    pub context: Vec<usize>,
    pub target: usize,
}
