use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info, warn};

use crate::core::error::{Error, Result};

use super::VectorSource;

/// Word vectors in the GloVe text format
///
/// Each line is `word v1 v2 ... vd`. GloVe distributions list words from most
/// to least frequent, so the line order is taken as the frequency rank. A
/// leading `count dim` header (fastText `.vec` files) is accepted and skipped.
///
/// The table is held in memory as one flat row-major buffer.
#[derive(Debug, Clone, Default)]
pub struct GloveVectors {
    words: Vec<String>,
    data: Vec<f32>,
    dimension: usize,
    index: HashMap<String, usize>,
}

impl GloveVectors {
    /// Build a table from `(word, vector)` pairs given in rank order
    ///
    /// # Errors
    /// Returns [`Error::MalformedVectors`] when vector lengths disagree
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vectors = Self::default();
        for (line, (word, vector)) in entries.into_iter().enumerate() {
            if line == 0 {
                vectors.dimension = vector.len();
            }
            vectors.push(word.into(), &vector, line + 1)?;
        }
        Ok(vectors)
    }

    /// Load a vector file, reading at most `limit` vectors
    ///
    /// Since the file is rank ordered, a limit only reads the prefix needed
    /// for a top-N codec instead of the whole table.
    pub fn load<P: AsRef<Path>>(path: P, limit: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let vectors = Self::from_reader(BufReader::with_capacity(1024 * 1024, file), limit)?;
        info!(
            "Loaded {} vectors of dimension {} from {}",
            vectors.len(),
            vectors.dimension,
            path.display()
        );
        Ok(vectors)
    }

    pub fn from_reader<R: BufRead>(reader: R, limit: Option<usize>) -> Result<Self> {
        let mut vectors = Self::default();
        let limit = limit.unwrap_or(usize::MAX);

        for (idx, line) in reader.lines().enumerate() {
            if vectors.words.len() >= limit {
                break;
            }
            let line = line?;
            let line_number = idx + 1;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            if vectors.dimension == 0 {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if idx == 0 && fields.len() == 2 {
                    if let (Ok(count), Ok(dimension)) =
                        (fields[0].parse::<usize>(), fields[1].parse::<usize>())
                    {
                        debug!("Vector file header: {} words, dimension {}", count, dimension);
                        vectors.dimension = dimension;
                        continue;
                    }
                }
                if fields.len() < 2 {
                    return Err(Error::MalformedVectors {
                        line: line_number,
                        reason: "expected a word followed by at least one value".to_string(),
                    });
                }
                vectors.dimension = fields.len() - 1;
            }

            let (word, vector) = parse_line(line, vectors.dimension, line_number)?;
            vectors.push(word.to_string(), &vector, line_number)?;
        }
        Ok(vectors)
    }

    fn push(&mut self, word: String, vector: &[f32], line: usize) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::MalformedVectors {
                line,
                reason: format!(
                    "vector for '{}' has {} values, expected {}",
                    word,
                    vector.len(),
                    self.dimension
                ),
            });
        }
        if self.index.contains_key(&word) {
            warn!("Duplicate vector for '{}' at line {}, keeping the first", word, line);
            return Ok(());
        }
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.data.extend_from_slice(vector);
        Ok(())
    }
}

/// Split a line into its word and values, reading the values from the right so
/// that words containing spaces survive
fn parse_line(line: &str, dimension: usize, line_number: usize) -> Result<(&str, Vec<f32>)> {
    let mut fields = line.rsplitn(dimension + 1, ' ');
    let mut vector = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let field = fields.next().ok_or_else(|| Error::MalformedVectors {
            line: line_number,
            reason: format!("expected {} values", dimension),
        })?;
        let value = field.parse::<f32>().map_err(|e| Error::MalformedVectors {
            line: line_number,
            reason: format!("invalid value '{}': {}", field, e),
        })?;
        vector.push(value);
    }
    vector.reverse();

    match fields.next() {
        Some(word) if !word.is_empty() => Ok((word, vector)),
        _ => Err(Error::MalformedVectors {
            line: line_number,
            reason: format!("expected a word followed by {} values", dimension),
        }),
    }
}

impl VectorSource for GloveVectors {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn vector(&self, word: &str) -> Option<&[f32]> {
        let row = *self.index.get(word)?;
        let start = row * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    fn rank(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    fn top_n(&self, n: usize) -> Result<Vec<&str>> {
        if n > self.words.len() {
            return Err(Error::CapacityExceeded {
                requested: n,
                available: self.words.len(),
            });
        }
        Ok(self.words[..n].iter().map(String::as_str).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "the 0.1 0.2 0.3\n\
                          , -0.5 0.25 1e-3\n\
                          fox 1 2 3\n";

    #[test]
    fn test_parse_glove_text() {
        let vectors = GloveVectors::from_reader(Cursor::new(SAMPLE), None).unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.dimension(), 3);
        assert_eq!(vectors.vector("fox"), Some(&[1.0f32, 2.0, 3.0][..]));
        assert_eq!(vectors.vector(","), Some(&[-0.5f32, 0.25, 0.001][..]));
        assert_eq!(vectors.rank("the"), Some(0));
        assert_eq!(vectors.rank("fox"), Some(2));
        assert_eq!(vectors.vector("cat"), None);
    }

    #[test]
    fn test_header_line_is_skipped() {
        let text = format!("3 3\n{}", SAMPLE);
        let vectors = GloveVectors::from_reader(Cursor::new(text), None).unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.top_n(3).unwrap(), vec!["the", ",", "fox"]);
    }

    #[test]
    fn test_limit_reads_prefix() {
        let vectors = GloveVectors::from_reader(Cursor::new(SAMPLE), Some(2)).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.rank("fox"), None);
    }

    #[test]
    fn test_word_with_space() {
        let text = "the 1 2\n. . . 3 4\n";
        let vectors = GloveVectors::from_reader(Cursor::new(text), None).unwrap();
        assert_eq!(vectors.vector(". . ."), Some(&[3.0f32, 4.0][..]));
    }

    #[test]
    fn test_dimension_mismatch_reports_line() {
        let text = "the 1 2 3\nfox 1 2 x\n";
        let result = GloveVectors::from_reader(Cursor::new(text), None);
        assert!(matches!(result, Err(Error::MalformedVectors { line: 2, .. })));
    }

    #[test]
    fn test_duplicates_keep_first_rank() {
        let vectors =
            GloveVectors::from_entries(vec![("a", vec![1.0]), ("b", vec![2.0]), ("a", vec![3.0])])
                .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.vector("a"), Some(&[1.0f32][..]));
    }

    #[test]
    fn test_from_entries_rejects_ragged_vectors() {
        let result = GloveVectors::from_entries(vec![("a", vec![1.0, 2.0]), ("b", vec![2.0])]);
        assert!(matches!(result, Err(Error::MalformedVectors { line: 2, .. })));
    }

    #[test]
    fn test_top_n_overflow() {
        let vectors = GloveVectors::from_reader(Cursor::new(SAMPLE), None).unwrap();
        assert!(matches!(
            vectors.top_n(4),
            Err(Error::CapacityExceeded { requested: 4, available: 3 })
        ));
        assert!(vectors.top_n(0).unwrap().is_empty());
    }
}
