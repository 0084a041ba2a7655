use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use crate::core::error::{Error, Result};

/// Sentence and word boundary detection
///
/// Implementations return the sentences of `text` in order, each as the
/// surface forms of its words. Segmenters are plain values owned by whoever
/// constructs them; a reference to a segmenter is a segmenter too.
pub trait Segmenter {
    fn sentences(&self, text: &str) -> Result<Vec<Vec<String>>>;
}

impl<T: Segmenter + ?Sized> Segmenter for &T {
    fn sentences(&self, text: &str) -> Result<Vec<Vec<String>>> {
        (**self).sentences(text)
    }
}

/// Rule based segmenter
///
/// Words come from the BERT pre-tokenizer: whitespace separates words and
/// every punctuation character stands alone. A sentence ends after a run of
/// terminal punctuation plus any closing quotes or brackets that follow it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationSegmenter;

impl PunctuationSegmenter {
    pub fn new() -> Self {
        Self
    }

    pub fn words(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.spans(text)?.into_iter().map(|span| span.word).collect())
    }

    fn spans(&self, text: &str) -> Result<Vec<Span>> {
        let mut pretokenized = PreTokenizedString::from(text);
        BertPreTokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| Error::Segmentation(e.to_string()))?;
        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(word, (start, end), _)| Span {
                word: word.to_string(),
                start,
                end,
            })
            .collect())
    }
}

/// A word and its byte offsets in the segmented text
struct Span {
    word: String,
    start: usize,
    end: usize,
}

fn is_terminal(word: &str) -> bool {
    matches!(word, "." | "!" | "?" | "…")
}

fn is_closer(word: &str) -> bool {
    matches!(word, "\"" | "'" | ")" | "]" | "”" | "’" | "»")
}

/// Straight quotes open as often as they close; one only closes a sentence
/// when nothing separates it from the word before it
fn is_ambiguous_quote(word: &str) -> bool {
    matches!(word, "\"" | "'")
}

impl Segmenter for PunctuationSegmenter {
    fn sentences(&self, text: &str) -> Result<Vec<Vec<String>>> {
        let mut sentences = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut closing = false;
        let mut previous_end = 0;

        for span in self.spans(text)? {
            let word = span.word.as_str();
            let continues = is_terminal(word)
                || (is_closer(word) && !(is_ambiguous_quote(word) && span.start > previous_end));
            if closing && !continues {
                sentences.push(std::mem::take(&mut current));
                closing = false;
            }
            closing |= is_terminal(word);
            previous_end = span.end;
            current.push(span.word);
        }
        if !current.is_empty() {
            sentences.push(current);
        }
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> Vec<Vec<String>> {
        PunctuationSegmenter::new().sentences(text).unwrap()
    }

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_single_sentence_without_punctuation() {
        assert_eq!(segment("The blue fox ran"), vec![sentence(&["The", "blue", "fox", "ran"])]);
    }

    #[test]
    fn test_punctuation_is_split_off() {
        assert_eq!(
            PunctuationSegmenter::new().words("The quick brown fox.").unwrap(),
            sentence(&["The", "quick", "brown", "fox", "."])
        );
    }

    #[test]
    fn test_multiple_sentences() {
        assert_eq!(
            segment("The fox ran. It hid!\nWhere?"),
            vec![
                sentence(&["The", "fox", "ran", "."]),
                sentence(&["It", "hid", "!"]),
                sentence(&["Where", "?"]),
            ]
        );
    }

    #[test]
    fn test_terminal_runs_stay_together() {
        assert_eq!(
            segment("Wait... what?!"),
            vec![sentence(&["Wait", ".", ".", "."]), sentence(&["what", "?", "!"])]
        );
    }

    #[test]
    fn test_closing_quote_belongs_to_sentence() {
        assert_eq!(
            segment("He said \"stop.\" Then left."),
            vec![
                sentence(&["He", "said", "\"", "stop", ".", "\""]),
                sentence(&["Then", "left", "."]),
            ]
        );
    }

    #[test]
    fn test_opening_quote_starts_next_sentence() {
        assert_eq!(
            segment("He left. 'Yes,' she said."),
            vec![
                sentence(&["He", "left", "."]),
                sentence(&["'", "Yes", ",", "'", "she", "said", "."]),
            ]
        );
        assert_eq!(
            segment("Stop! \"Why?\" he asked."),
            vec![
                sentence(&["Stop", "!"]),
                sentence(&["\"", "Why", "?", "\""]),
                sentence(&["he", "asked", "."]),
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(segment("").is_empty());
        assert!(segment("   \n ").is_empty());
    }
}
