use std::convert::Infallible;
use std::fmt;

use log::{debug, info};

use crate::core::error::{Error, Result};
use crate::core::types::Token;

use super::Codec;
use super::vocabulary::Vocabulary;

/// Closed-vocabulary codec built from one scan over a token stream
///
/// Distinct tokens are numbered from 2 in order of first occurrence. Tokens
/// never seen during construction encode to OOV; the vocabulary never grows.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    vocabulary: Vocabulary,
}

impl TokenCodec {
    /// Build a codec from every distinct token in `tokens`
    pub fn create_from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        match Self::try_create_from_tokens(tokens.into_iter().map(|t| Ok::<_, Infallible>(t))) {
            Ok(codec) => codec,
            Err(never) => match never {},
        }
    }

    /// Build a codec from a fallible stream, e.g. characters read from files
    ///
    /// # Errors
    /// Stops at and returns the first error produced by the stream
    pub fn try_create_from_tokens<I, T, E>(tokens: I) -> std::result::Result<Self, E>
    where
        I: IntoIterator<Item = std::result::Result<T, E>>,
        T: Into<Token>,
    {
        let mut vocabulary = Vocabulary::new();
        let mut scanned = 0usize;
        for token in tokens {
            vocabulary.insert(token?.into());
            scanned += 1;
        }
        debug!("Scanned {} tokens", scanned);
        info!("Built TokenCodec with vocabulary size {}", vocabulary.len());
        Ok(Self { vocabulary })
    }

    /// Rebuild a codec from a stored vocabulary list (reserved slots excluded)
    ///
    /// # Errors
    /// Returns [`Error::MalformedCodec`] on duplicates or reserved tokens
    pub(crate) fn from_entries(entries: Vec<Token>) -> Result<Self> {
        let mut vocabulary = Vocabulary::new();
        for token in entries {
            if token.is_reserved() {
                return Err(Error::MalformedCodec(format!(
                    "reserved token '{}' stored in the vocabulary list",
                    token
                )));
            }
            let description = token.to_string();
            if !vocabulary.insert(token) {
                return Err(Error::MalformedCodec(format!(
                    "duplicate token '{}' in the vocabulary list",
                    description
                )));
            }
        }
        Ok(Self { vocabulary })
    }

    /// Vocabulary in index order, without the reserved slots
    pub fn entries(&self) -> &[Token] {
        self.vocabulary.entries()
    }
}

impl Codec for TokenCodec {
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

impl fmt::Display for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenCodec: vocabulary size {}", self.vocabulary_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{OOV_INDEX, PAD_INDEX};

    fn chars(s: &str) -> Vec<Token> {
        s.chars().map(Token::from).collect()
    }

    fn red_balloon() -> TokenCodec {
        TokenCodec::create_from_tokens("the red balloon".chars())
    }

    #[test]
    fn test_vocabulary_size() {
        // 11 distinct characters plus PAD and OOV
        assert_eq!(red_balloon().vocabulary_size(), 13);
    }

    #[test]
    fn test_display() {
        assert_eq!(red_balloon().to_string(), "TokenCodec: vocabulary size 13");
    }

    #[test]
    fn test_first_occurrence_order() {
        let codec = red_balloon();
        assert_eq!(codec.index(&Token::from('t')), 2);
        assert_eq!(codec.index(&Token::from('h')), 3);
        assert_eq!(codec.index(&Token::from('e')), 4);
        assert_eq!(codec.index(&Token::from(' ')), 5);
        assert_eq!(&codec.entries()[..3], &chars("the")[..]);
    }

    #[test]
    fn test_encode_decode() {
        let codec = red_balloon();
        let decoded: Vec<Token> = codec
            .decode(codec.encode(chars("red")))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(decoded, chars("red"));
    }

    #[test]
    fn test_encode_decode_with_unknown() {
        let codec = red_balloon();
        let encoded: Vec<usize> = codec.encode(chars("zed")).collect();
        assert_eq!(encoded[0], OOV_INDEX);
        let decoded: Vec<Token> = codec.decode(encoded).collect::<Result<_>>().unwrap();
        assert_eq!(decoded, vec![Token::oov(), Token::from('e'), Token::from('d')]);
    }

    #[test]
    fn test_every_observed_token_round_trips() {
        let codec = red_balloon();
        for c in "the red balloon".chars() {
            let token = Token::from(c);
            let decoded: Vec<Token> = codec
                .decode(codec.encode([&token]))
                .collect::<Result<_>>()
                .unwrap();
            assert_eq!(decoded, vec![token]);
        }
    }

    #[test]
    fn test_reserved_indices() {
        let codec = red_balloon();
        assert_eq!(codec.index(&Token::pad()), PAD_INDEX);
        assert_eq!(codec.index(&Token::oov()), OOV_INDEX);
        assert_eq!(codec.token(PAD_INDEX).unwrap(), &Token::pad());
        assert_eq!(codec.token(OOV_INDEX).unwrap(), &Token::oov());
    }

    #[test]
    fn test_decode_out_of_range() {
        let codec = red_balloon();
        let results: Vec<Result<Token>> = codec.decode([2, 13]).collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::IndexOutOfRange { index: 13, vocabulary_size: 13 })
        ));
    }

    #[test]
    fn test_meta_tokens_are_ordinary_entries() {
        let mut tokens = chars("ab");
        tokens.push(Token::eos());
        tokens.push(Token::pad());
        let codec = TokenCodec::create_from_tokens(tokens);
        assert_eq!(codec.vocabulary_size(), 5);
        assert_eq!(codec.index(&Token::eos()), 4);
        assert_eq!(codec.index(&Token::text("-EOS-")), OOV_INDEX);
    }

    #[test]
    fn test_encode_is_lazy_over_infinite_input() {
        let codec = red_balloon();
        let encoded: Vec<usize> = codec
            .encode(std::iter::repeat(Token::from('r')))
            .take(3)
            .collect();
        assert_eq!(encoded, vec![6, 6, 6]);
    }

    #[test]
    fn test_try_create_stops_at_first_error() {
        let stream = vec![Ok('a'), Err("unreadable"), Ok('b')];
        let result = TokenCodec::try_create_from_tokens(stream);
        assert_eq!(result.unwrap_err(), "unreadable");
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let result = TokenCodec::from_entries(chars("aba"));
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
        let result = TokenCodec::from_entries(vec![Token::oov()]);
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_one_hot() {
        let codec = red_balloon();
        let row = codec.one_hot(4).unwrap();
        assert_eq!(row.len(), 13);
        assert_eq!(row.sum(), 1.0);
        assert_eq!(row[4], 1.0);
        assert!(codec.one_hot(13).is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let codec = red_balloon();
        let expected: Vec<usize> = codec.encode(chars("balloon")).collect();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let encoded: Vec<usize> = codec.encode(chars("balloon")).collect();
                    assert_eq!(encoded, expected);
                });
            }
        });
    }
}
