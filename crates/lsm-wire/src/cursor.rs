//! Byte-offset reader over a frame or descriptor

use lsm_core::{LsmError, LsmResult};

/// Forward-only cursor over a borrowed byte slice
///
/// Every read is bounds-checked and fails with [`LsmError::BufferTooShort`]
/// without advancing when the slice cannot satisfy it.
#[derive(Clone, Debug)]
pub struct FrameCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        FrameCursor { buf, pos: 0 }
    }

    /// Current byte offset
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> LsmResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(LsmError::BufferTooShort {
                expected: self.pos + n,
                actual: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> LsmResult<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> LsmResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> LsmResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> LsmResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> LsmResult<&'a [u8]> {
        self.take(n)
    }

    /// Everything not yet consumed
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let buf = [0x07, 0x00, 0x00, 0x00, 0x28, 0x34, 0x12, 0xAA];
        let mut cursor = FrameCursor::new(&buf);

        assert_eq!(cursor.read_u8().unwrap(), 7);
        assert_eq!(cursor.read_u32_be().unwrap(), 40);
        assert_eq!(cursor.read_u16_le().unwrap(), 0x1234);
        assert_eq!(cursor.position(), 7);
        assert_eq!(cursor.rest(), &[0xAA]);
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let buf = [1, 2, 3];
        let mut cursor = FrameCursor::new(&buf);
        cursor.skip(2).unwrap();

        let err = cursor.read_u16_le().unwrap_err();
        assert!(matches!(
            err,
            LsmError::BufferTooShort {
                expected: 4,
                actual: 3
            }
        ));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_u8().unwrap(), 3);
        assert!(cursor.is_empty());
    }
}
