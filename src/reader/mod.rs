use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::slice;

/// Anything that can be opened, from the start, as many times as needed
pub trait TextSource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
}

impl TextSource for Path {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(self)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl TextSource for PathBuf {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        self.as_path().open()
    }
}

impl TextSource for str {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(self.as_bytes()))
    }
}

impl TextSource for String {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        self.as_str().open()
    }
}

impl<T: TextSource + ?Sized> TextSource for &T {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        (**self).open()
    }
}

/// Bytes decoded per step of the character stream
const CHUNK_SIZE: usize = 8 * 1024;

/// Every character of every source, in order
///
/// Sources are decoded a chunk at a time, so memory stays bounded however long
/// their lines are. The first read error (including invalid UTF-8) is yielded
/// once and ends the stream.
pub fn characters<S: TextSource>(sources: &[S]) -> Characters<'_, S> {
    Characters {
        sources: sources.iter(),
        reader: None,
        carry: Vec::new(),
        pending: Vec::new().into_iter(),
        failed: false,
    }
}

pub struct Characters<'a, S> {
    sources: slice::Iter<'a, S>,
    reader: Option<Box<dyn BufRead + 'a>>,
    /// Undecoded bytes, at most one partial UTF-8 sequence between chunks
    carry: Vec<u8>,
    pending: std::vec::IntoIter<char>,
    failed: bool,
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")
}

/// Decode the next chunk of `reader`, or `None` at the end of the source
fn read_chunk<R: BufRead + ?Sized>(
    reader: &mut R,
    carry: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            if carry.is_empty() {
                return Ok(None);
            }
            return Err(invalid_utf8());
        }
        let taken = available.len().min(CHUNK_SIZE);
        carry.extend_from_slice(&available[..taken]);
        reader.consume(taken);

        let valid = match std::str::from_utf8(carry) {
            Ok(_) => carry.len(),
            Err(e) if e.valid_up_to() > 0 => e.valid_up_to(),
            Err(e) if e.error_len().is_some() => return Err(invalid_utf8()),
            Err(_) => continue,
        };
        let rest = carry.split_off(valid);
        let decoded = std::mem::replace(carry, rest);
        return String::from_utf8(decoded).map(Some).map_err(|_| invalid_utf8());
    }
}

impl<'a, S: TextSource> Iterator for Characters<'a, S> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(c) = self.pending.next() {
                return Some(Ok(c));
            }
            let Some(reader) = self.reader.as_mut() else {
                let source = self.sources.next()?;
                match source.open() {
                    Ok(reader) => self.reader = Some(reader),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                continue;
            };
            match read_chunk(reader.as_mut(), &mut self.carry) {
                Ok(None) => self.reader = None,
                Ok(Some(text)) => self.pending = text.chars().collect::<Vec<_>>().into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Largest block handed out before a paragraph is cut at a line end
const MAX_BLOCK_BYTES: usize = 1024 * 1024;

/// Paragraph-sized blocks of text, for segmenters that need whole sentences
///
/// A block ends at a blank line or at the end of a source, so sentences never
/// straddle two sources. Line breaks inside a block are kept. A paragraph
/// longer than 1 MiB is cut at the first line end past that size; a single
/// line is always kept whole, so one line bounds the memory a block needs.
pub fn blocks<S: TextSource>(sources: &[S]) -> Blocks<'_, S> {
    Blocks {
        sources: sources.iter(),
        reader: None,
        failed: false,
    }
}

pub struct Blocks<'a, S> {
    sources: slice::Iter<'a, S>,
    reader: Option<Box<dyn BufRead + 'a>>,
    failed: bool,
}

impl<'a, S: TextSource> Iterator for Blocks<'a, S> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut block = String::new();
        loop {
            if self.failed {
                return None;
            }
            let Some(reader) = self.reader.as_mut() else {
                let source = self.sources.next()?;
                match source.open() {
                    Ok(reader) => self.reader = Some(reader),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                continue;
            };
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    self.reader = None;
                    if !block.is_empty() {
                        return Some(Ok(block));
                    }
                }
                Ok(_) if line.trim().is_empty() => {
                    if !block.is_empty() {
                        return Some(Ok(block));
                    }
                }
                Ok(_) => {
                    block.push_str(&line);
                    if block.len() >= MAX_BLOCK_BYTES {
                        return Some(Ok(block));
                    }
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
