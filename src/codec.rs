//! Primitive field codec for received message bytes.

use crate::Error;

/// Read cursor over a received message.
///
/// All reads are bounds checked. Running past the end is a `decode_error`.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> Parser<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Parser { bytes, index: 0 }
    }

    /// Read an `n` byte big-endian unsigned integer, `n <= 4`.
    pub fn get(&mut self, n: usize) -> Result<u32, Error> {
        if n > 4 {
            return Err(Error::DecodeError(format!("integer width {} > 4", n)));
        }
        let bytes = self.take(n)?;
        Ok(bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
    }

    /// Read exactly `n` bytes.
    pub fn get_fixed_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.take(n)
    }

    /// Read a length-prefixed byte string with a `len_bytes` wide length.
    pub fn get_var_bytes(&mut self, len_bytes: usize) -> Result<&'a [u8], Error> {
        let len = self.get(len_bytes)? as usize;
        self.take(len)
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.index
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail.
    pub fn bytes(&self) -> &'a [u8] {
        &self.bytes[self.index..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if n > self.remaining() {
            return Err(Error::DecodeError(format!(
                "need {} bytes, {} remaining",
                n,
                self.remaining()
            )));
        }
        let out = &self.bytes[self.index..self.index + n];
        self.index += n;
        Ok(out)
    }
}

/// Append a 24 bit big-endian length.
pub fn put_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes()[1..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_integers() {
        let mut p = Parser::new(&[0x01, 0x00, 0x02, 0x00, 0x00, 0x03, 0xff]);
        assert_eq!(p.get(1).unwrap(), 1);
        assert_eq!(p.get(2).unwrap(), 2);
        assert_eq!(p.get(3).unwrap(), 3);
        assert_eq!(p.remaining(), 1);
        assert!(p.get(2).is_err());
        assert!(matches!(p.get(5), Err(Error::DecodeError(_))));
    }

    #[test]
    fn var_bytes_respect_bounds() {
        let mut p = Parser::new(&[0x00, 0x02, 0xaa, 0xbb, 0x05, 0x01]);
        assert_eq!(p.get_var_bytes(2).unwrap(), &[0xaa, 0xbb]);
        assert!(matches!(p.get_var_bytes(1), Err(Error::DecodeError(_))));
    }

    #[test]
    fn fixed_bytes_and_tail() {
        let mut p = Parser::new(b"abcdef");
        assert_eq!(p.get_fixed_bytes(2).unwrap(), b"ab");
        assert_eq!(p.bytes(), b"cdef");
        p.get_fixed_bytes(4).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn u24_encoding() {
        let mut out = Vec::new();
        put_u24(&mut out, 0x010203);
        assert_eq!(out, vec![1, 2, 3]);
    }
}
