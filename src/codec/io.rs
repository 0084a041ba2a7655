use std::io::{Read, Write};

use ndarray::Array2;

use crate::core::error::{Error, Result};

/// Magic bytes opening every embedding matrix file
pub const MATRIX_MAGIC: &[u8; 4] = b"GWEM";
pub const MATRIX_VERSION: u32 = 1;

/// Little-endian reader over any byte stream
pub struct Reader<R: Read> {
    buffer: R,
    pos: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(buffer: R) -> Self {
        Reader { buffer, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.buffer.read_exact(&mut bytes)?;
        self.pos += N as u64;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_bytes()?))
    }

    /// True once the underlying stream has nothing left to read
    pub fn at_end(&mut self) -> Result<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.buffer.read(&mut byte) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Little-endian writer, the mirror of [`Reader`]
pub struct Writer<W: Write> {
    buffer: W,
}

impl<W: Write> Writer<W> {
    pub fn new(buffer: W) -> Self {
        Writer { buffer }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.write_all(bytes)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.buffer.flush()?;
        Ok(())
    }
}

/// Write a matrix as: magic, version, rows, cols, then row-major f32 values
///
/// Values are stored as raw bits so they come back bit-for-bit identical.
pub fn write_matrix<W: Write>(writer: &mut Writer<W>, matrix: &Array2<f32>) -> Result<()> {
    let (rows, cols) = matrix.dim();
    writer.write_bytes(MATRIX_MAGIC)?;
    writer.write_u32(MATRIX_VERSION)?;
    writer.write_u64(rows as u64)?;
    writer.write_u64(cols as u64)?;
    for value in matrix.iter() {
        writer.write_f32(*value)?;
    }
    writer.flush()
}

/// Values reserved up front when reading a matrix; the rest grow as read
const MAX_PREALLOCATED_VALUES: usize = 1 << 20;

/// Map an unexpected end of file to a description of what was cut short
fn truncated(error: Error, what: impl FnOnce() -> String) -> Error {
    match error {
        Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::MalformedCodec(format!("embedding file truncated in {}", what()))
        }
        other => other,
    }
}

/// Read a matrix written by [`write_matrix`], checking it has the `expected`
/// `(rows, cols)` shape before reading its body
///
/// # Errors
/// Returns [`Error::MalformedCodec`] for a bad or truncated header, a shape
/// other than `expected`, a truncated body, or bytes after the body
pub fn read_matrix<R: Read>(
    reader: &mut Reader<R>,
    expected: (usize, usize),
) -> Result<Array2<f32>> {
    let header = |e| truncated(e, || "the header".to_string());
    let magic: [u8; 4] = reader.read_bytes().map_err(header)?;
    if &magic != MATRIX_MAGIC {
        return Err(Error::MalformedCodec(format!(
            "embedding file has magic {:?}, expected {:?}",
            magic, MATRIX_MAGIC
        )));
    }
    let version = reader.read_u32().map_err(header)?;
    if version != MATRIX_VERSION {
        return Err(Error::MalformedCodec(format!(
            "unsupported embedding file version {}",
            version
        )));
    }
    let rows = reader.read_u64().map_err(header)?;
    let cols = reader.read_u64().map_err(header)?;
    if (rows, cols) != (expected.0 as u64, expected.1 as u64) {
        return Err(Error::MalformedCodec(format!(
            "embedding file holds a {}x{} matrix, expected {}x{}",
            rows, cols, expected.0, expected.1
        )));
    }
    let (rows, cols) = expected;
    let num_elements = rows.checked_mul(cols).ok_or_else(|| {
        Error::MalformedCodec(format!("embedding shape {}x{} overflows", rows, cols))
    })?;

    let mut data = Vec::with_capacity(num_elements.min(MAX_PREALLOCATED_VALUES));
    for _ in 0..num_elements {
        let value = reader
            .read_f32()
            .map_err(|e| truncated(e, || format!("value {} of {}", data.len(), num_elements)))?;
        data.push(value);
    }
    if !reader.at_end()? {
        return Err(Error::MalformedCodec(format!(
            "embedding file has trailing bytes after {} values",
            num_elements
        )));
    }

    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::MalformedCodec(format!("embedding shape {}x{}: {}", rows, cols, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_little_endian() {
        let bytes = vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F];
        let mut reader = Reader::new(Cursor::new(bytes));
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert_eq!(reader.position(), 8);
        assert!(reader.read_u32().is_err());
    }

    #[test]
    fn test_matrix_bits_survive() {
        let matrix = Array2::from_shape_vec(
            (2, 3),
            vec![0.1, -0.0, f32::MIN_POSITIVE, 1.0e-38, 3.4028235e38, 0.30000001],
        )
        .unwrap();
        let mut bytes = Vec::new();
        write_matrix(&mut Writer::new(&mut bytes), &matrix).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 8 + 8 + 6 * 4);

        let restored = read_matrix(&mut Reader::new(Cursor::new(bytes)), (2, 3)).unwrap();
        assert_eq!(restored.dim(), (2, 3));
        for (a, b) in matrix.iter().zip(restored.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = b"NOPE".to_vec();
        bytes.extend_from_slice(&[0u8; 20]);
        let result = read_matrix(&mut Reader::new(Cursor::new(bytes)), (0, 0));
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    #[test]
    fn test_truncated_body() {
        let matrix = Array2::<f32>::ones((2, 2));
        let mut bytes = Vec::new();
        write_matrix(&mut Writer::new(&mut bytes), &matrix).unwrap();
        bytes.truncate(bytes.len() - 2);
        let result = read_matrix(&mut Reader::new(Cursor::new(bytes)), (2, 2));
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }

    fn header(rows: u64, cols: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = Writer::new(&mut bytes);
        writer.write_bytes(MATRIX_MAGIC).unwrap();
        writer.write_u32(MATRIX_VERSION).unwrap();
        writer.write_u64(rows).unwrap();
        writer.write_u64(cols).unwrap();
        bytes
    }

    #[test]
    fn test_oversized_header_is_rejected_before_reading() {
        let bytes = header(1 << 40, 1 << 20);
        let result = read_matrix(&mut Reader::new(Cursor::new(bytes)), (4, 3));
        match result {
            Err(Error::MalformedCodec(reason)) => assert!(reason.contains("expected 4x3")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_truncated_header() {
        let bytes = b"GWEM\x01\x00".to_vec();
        let result = read_matrix(&mut Reader::new(Cursor::new(bytes)), (2, 2));
        match result {
            Err(Error::MalformedCodec(reason)) => assert!(reason.contains("header")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let matrix = Array2::<f32>::ones((2, 2));
        let mut bytes = Vec::new();
        write_matrix(&mut Writer::new(&mut bytes), &matrix).unwrap();
        bytes.push(0);
        let result = read_matrix(&mut Reader::new(Cursor::new(bytes)), (2, 2));
        assert!(matches!(result, Err(Error::MalformedCodec(_))));
    }
}
