use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::types::Token;

use super::io::{Reader, Writer, read_matrix, write_matrix};
use super::{Codec, GloVeCodec, RESERVED_SLOTS, TokenCodec};

/// Manifest file written into a codec directory
pub const CODEC_FILE: &str = "codec.json";
/// Embedding matrix written next to a GloVe codec's manifest
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";

/// On-disk description of a codec's index mapping
///
/// Only the non-reserved vocabulary is listed; `reserved` and
/// `vocabulary_size` are stored redundantly so a damaged file is caught at
/// load time instead of producing a shifted mapping.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum CodecRecord {
    Token {
        vocabulary_size: usize,
        reserved: usize,
        tokens: Vec<Token>,
    },
    Glove {
        vocabulary_size: usize,
        reserved: usize,
        capacity: usize,
        embedding_dim: usize,
        meta: Vec<String>,
        words: Vec<String>,
    },
}

fn write_record(dir: &Path, record: &CodecRecord) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut writer = BufWriter::new(File::create(dir.join(CODEC_FILE))?);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.flush()?;
    Ok(())
}

fn read_record(dir: &Path) -> Result<CodecRecord> {
    let file = File::open(dir.join(CODEC_FILE))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            Error::Json(e)
        } else {
            Error::MalformedCodec(format!("{} is not a codec manifest: {}", CODEC_FILE, e))
        }
    })
}

fn check_size(kind: &str, stored: usize, expected: usize, what: &str) -> Result<()> {
    if stored != expected {
        return Err(Error::MalformedCodec(format!(
            "{} codec stores {} {} but its vocabulary implies {}",
            kind, what, stored, expected
        )));
    }
    Ok(())
}

impl TokenCodec {
    /// Write the codec into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        write_record(
            dir,
            &CodecRecord::Token {
                vocabulary_size: self.vocabulary_size(),
                reserved: RESERVED_SLOTS,
                tokens: self.entries().to_vec(),
            },
        )?;
        info!("Saved {} to {}", self, dir.display());
        Ok(())
    }

    /// # Errors
    /// Returns [`Error::MalformedCodec`] if `dir` holds a GloVe codec or an
    /// inconsistent vocabulary
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        match load_codec(dir)? {
            SavedCodec::Token(codec) => Ok(codec),
            SavedCodec::Glove(_) => Err(Error::MalformedCodec(
                "expected a token codec, found a GloVe codec".to_string(),
            )),
        }
    }
}

impl GloVeCodec {
    /// Write the manifest and the embedding matrix into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        write_record(
            dir,
            &CodecRecord::Glove {
                vocabulary_size: self.vocabulary_size(),
                reserved: RESERVED_SLOTS + self.meta_tokens().len(),
                capacity: self.capacity(),
                embedding_dim: self.embedding_dim(),
                meta: self
                    .meta_tokens()
                    .iter()
                    .map(|token| token.value().to_string())
                    .collect(),
                words: self.words().map(str::to_string).collect(),
            },
        )?;
        let file = File::create(dir.join(EMBEDDINGS_FILE))?;
        write_matrix(&mut Writer::new(BufWriter::new(file)), self.embedding_matrix())?;
        info!("Saved {} to {}", self, dir.display());
        Ok(())
    }

    /// # Errors
    /// Returns [`Error::MalformedCodec`] if `dir` holds a token codec, an
    /// inconsistent vocabulary, or a matrix of the wrong shape
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        match load_codec(dir)? {
            SavedCodec::Glove(codec) => Ok(codec),
            SavedCodec::Token(_) => Err(Error::MalformedCodec(
                "expected a GloVe codec, found a token codec".to_string(),
            )),
        }
    }
}

/// Either kind of codec, as found on disk
#[derive(Debug, Clone)]
pub enum SavedCodec {
    Token(TokenCodec),
    Glove(GloVeCodec),
}

/// Load whichever codec `dir` contains
pub fn load_codec<P: AsRef<Path>>(dir: P) -> Result<SavedCodec> {
    let dir = dir.as_ref();
    let codec = match read_record(dir)? {
        CodecRecord::Token {
            vocabulary_size,
            reserved,
            tokens,
        } => {
            check_size("token", reserved, RESERVED_SLOTS, "reserved slots")?;
            check_size("token", vocabulary_size, tokens.len() + reserved, "vocabulary size")?;
            SavedCodec::Token(TokenCodec::from_entries(tokens)?)
        }
        CodecRecord::Glove {
            vocabulary_size,
            reserved,
            capacity,
            embedding_dim,
            meta,
            words,
        } => {
            check_size("GloVe", reserved, RESERVED_SLOTS + meta.len(), "reserved slots")?;
            check_size("GloVe", capacity, words.len(), "capacity")?;
            check_size("GloVe", vocabulary_size, capacity + reserved, "vocabulary size")?;

            let file = File::open(dir.join(EMBEDDINGS_FILE))?;
            let mut reader = Reader::new(BufReader::new(file));
            let embedding = read_matrix(&mut reader, (vocabulary_size, embedding_dim))?;
            debug!("Read embedding matrix of shape {:?}", embedding.dim());

            SavedCodec::Glove(GloVeCodec::from_parts(meta, words, embedding)?)
        }
    };
    info!("Loaded {} from {}", codec, dir.display());
    Ok(codec)
}

impl Codec for SavedCodec {
    fn vocabulary_size(&self) -> usize {
        match self {
            SavedCodec::Token(codec) => codec.vocabulary_size(),
            SavedCodec::Glove(codec) => codec.vocabulary_size(),
        }
    }

    fn index(&self, token: &Token) -> usize {
        match self {
            SavedCodec::Token(codec) => codec.index(token),
            SavedCodec::Glove(codec) => codec.index(token),
        }
    }

    fn token(&self, index: usize) -> Result<&Token> {
        match self {
            SavedCodec::Token(codec) => codec.token(index),
            SavedCodec::Glove(codec) => codec.token(index),
        }
    }
}

impl fmt::Display for SavedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavedCodec::Token(codec) => fmt::Display::fmt(codec, f),
            SavedCodec::Glove(codec) => fmt::Display::fmt(codec, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EOS_NAME;
    use crate::vectors::GloveVectors;
    use tempfile::tempdir;

    fn glove() -> GloVeCodec {
        let vectors = GloveVectors::from_entries(vec![
            ("the", vec![0.1, -0.2, 1.0e-7]),
            ("fox", vec![3.4028235e38, 0.3, -0.0]),
            ("ran", vec![0.33333334, 2.5, 7.0]),
        ])
        .unwrap();
        GloVeCodec::create(&vectors, 3, [EOS_NAME]).unwrap()
    }

    #[test]
    fn test_token_codec_round_trip() {
        let dir = tempdir().unwrap();
        let mut tokens: Vec<Token> = "the red balloon".chars().map(Token::from).collect();
        tokens.push(Token::eos());
        let codec = TokenCodec::create_from_tokens(tokens.clone());
        codec.save(dir.path()).unwrap();

        let restored = TokenCodec::load(dir.path()).unwrap();
        assert_eq!(restored.vocabulary_size(), codec.vocabulary_size());
        assert_eq!(restored.entries(), codec.entries());
        let original: Vec<usize> = codec.encode(&tokens).collect();
        let reloaded: Vec<usize> = restored.encode(&tokens).collect();
        assert_eq!(original, reloaded);
    }

    #[test]
    fn test_glove_codec_round_trip_is_bit_exact() {
        let dir = tempdir().unwrap();
        let codec = glove();
        codec.save(dir.path()).unwrap();

        let restored = GloVeCodec::load(dir.path()).unwrap();
        assert_eq!(restored.vocabulary_size(), codec.vocabulary_size());
        assert_eq!(restored.meta_tokens(), codec.meta_tokens());
        assert_eq!(
            restored.words().collect::<Vec<_>>(),
            codec.words().collect::<Vec<_>>()
        );
        for (a, b) in codec
            .embedding_matrix()
            .iter()
            .zip(restored.embedding_matrix().iter())
        {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        for index in 0..codec.vocabulary_size() {
            assert_eq!(restored.token(index).unwrap(), codec.token(index).unwrap());
        }
    }

    #[test]
    fn test_load_codec_dispatches_on_kind() {
        let dir = tempdir().unwrap();
        glove().save(dir.path()).unwrap();
        let loaded = load_codec(dir.path()).unwrap();
        assert!(matches!(loaded, SavedCodec::Glove(_)));
        assert_eq!(loaded.to_string(), "GloVeCodec: vocabulary size 6");
        assert!(TokenCodec::load(dir.path()).is_err());
    }

    #[test]
    fn test_wrong_vocabulary_size_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CODEC_FILE),
            r#"{"kind":"token","vocabulary_size":5,"reserved":2,"tokens":[{"text":"a"}]}"#,
        )
        .unwrap();
        let result = load_codec(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_duplicate_tokens_are_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CODEC_FILE),
            r#"{"kind":"token","vocabulary_size":4,"reserved":2,"tokens":[{"text":"a"},{"text":"a"}]}"#,
        )
        .unwrap();
        let result = load_codec(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_glove_matrix_shape_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        glove().save(dir.path()).unwrap();
        let other = tempdir().unwrap();
        let vectors = GloveVectors::from_entries(vec![("a", vec![1.0, 2.0, 3.0])]).unwrap();
        GloVeCodec::create(&vectors, 1, [EOS_NAME])
            .unwrap()
            .save(other.path())
            .unwrap();
        fs::copy(
            other.path().join(EMBEDDINGS_FILE),
            dir.path().join(EMBEDDINGS_FILE),
        )
        .unwrap();

        let result = GloVeCodec::load(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_oversized_embedding_header_is_rejected() {
        let dir = tempdir().unwrap();
        glove().save(dir.path()).unwrap();
        let mut bytes = Vec::new();
        let mut writer = Writer::new(&mut bytes);
        writer.write_bytes(b"GWEM").unwrap();
        writer.write_u32(1).unwrap();
        writer.write_u64(1 << 40).unwrap();
        writer.write_u64(1 << 20).unwrap();
        fs::write(dir.path().join(EMBEDDINGS_FILE), bytes).unwrap();

        let result = GloVeCodec::load(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_truncated_embedding_file() {
        let dir = tempdir().unwrap();
        glove().save(dir.path()).unwrap();
        fs::write(dir.path().join(EMBEDDINGS_FILE), b"GWEM\x01\x00").unwrap();
        let result = GloVeCodec::load(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_truncated_manifest() {
        let dir = tempdir().unwrap();
        glove().save(dir.path()).unwrap();
        let manifest = fs::read_to_string(dir.path().join(CODEC_FILE)).unwrap();
        fs::write(dir.path().join(CODEC_FILE), &manifest[..manifest.len() / 2]).unwrap();
        let result = load_codec(dir.path());
        assert!(matches!(result, Err(Error::MalformedCodec(_))));

        fs::write(dir.path().join(CODEC_FILE), r#"{"kind":"bpe"}"#).unwrap();
        assert!(matches!(load_codec(dir.path()), Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_codec(dir.path().join("absent"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
