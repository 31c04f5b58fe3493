//! Positionable byte streams
//!
//! Anything that can read, write and seek is a [`Stream`]: a `File` opened on
//! `/proc/<pid>/mem`, a `Cursor<Vec<u8>>`, or a custom memory source. Streams are
//! never owned by codecs; they receive `&mut dyn Stream` for the duration of a call.

use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

use crate::{util, Error, Result};

/// The size of `size_t`, i.e. `sizeof(size_t)` on the target.
pub const SIZE_T: usize = 8;

/// A seekable byte stream
pub trait Stream: Read + Write + Seek {}

impl<T: Read + Write + Seek + ?Sized> Stream for T {}

/// Current position of the stream
pub fn position(stream: &mut dyn Stream) -> Result<u64> {
    Ok(stream.stream_position()?)
}

/// Move the stream to an absolute position
pub fn set_position(stream: &mut dyn Stream, pos: u64) -> Result<()> {
    tracing::trace!(pos = format_args!("{:#x}", pos), "seek");
    stream.seek(SeekFrom::Start(pos))?;
    Ok(())
}

/// Read up to `size` bytes. A short result means end-of-data, not an error.
pub fn read_bounded(stream: &mut dyn Stream, size: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(size.min(1 << 20));
    Read::take(&mut *stream, size as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Read exactly `size` bytes, failing with [`Error::Truncated`] at end-of-data
pub fn read_exact(stream: &mut dyn Stream, size: usize) -> Result<Vec<u8>> {
    let bytes = read_bounded(stream, size)?;
    if bytes.len() < size {
        return Err(Error::Truncated {
            expected: size,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Read [`SIZE_T`] bytes as a little-endian unsigned integer
pub fn read_size_t(stream: &mut dyn Stream) -> Result<u64> {
    let bytes = read_exact(stream, SIZE_T)?;
    Ok(util::unpack(&bytes))
}

/// Write `value` as [`SIZE_T`] little-endian bytes
pub fn write_size_t(stream: &mut dyn Stream, value: u64) -> Result<()> {
    stream.write_all(&util::pack(value, SIZE_T))?;
    Ok(())
}

/// Restores the stream position when dropped.
///
/// Pointer-chasing codecs jump to another address, read or write there, and must
/// come back to where they were even if the body fails.
pub struct PositionGuard<'a> {
    stream: &'a mut dyn Stream,
    origin: u64,
}

impl<'a> PositionGuard<'a> {
    /// Capture the current position, then move to `pos` if given
    pub fn new(stream: &'a mut dyn Stream, pos: Option<u64>) -> Result<Self> {
        let origin = position(stream)?;
        let guard = Self { stream, origin };
        if let Some(pos) = pos {
            set_position(&mut *guard.stream, pos)?;
        }
        Ok(guard)
    }

    /// Position that will be restored
    pub fn origin(&self) -> u64 {
        self.origin
    }
}

impl<'a> Deref for PositionGuard<'a> {
    type Target = dyn Stream + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.stream
    }
}

impl<'a> DerefMut for PositionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.stream
    }
}

impl Drop for PositionGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.stream.seek(SeekFrom::Start(self.origin)) {
            tracing::warn!(origin = self.origin, %err, "failed to restore stream position");
        }
    }
}

/// Run `body` with the stream moved to `pos`, then restore the original position.
///
/// ```
/// use std::io::{Cursor, Seek};
/// use memio::stream::{keep_pos, read_bounded};
///
/// let mut stream = Cursor::new(b"1234".to_vec());
/// let bytes = keep_pos(&mut stream, Some(2), |s| read_bounded(s, 2)).unwrap();
/// assert_eq!(bytes, b"34");
/// assert_eq!(stream.stream_position().unwrap(), 0);
/// ```
pub fn keep_pos<T>(
    stream: &mut dyn Stream,
    pos: Option<u64>,
    body: impl FnOnce(&mut dyn Stream) -> Result<T>,
) -> Result<T> {
    let mut guard = PositionGuard::new(stream, pos)?;
    body(&mut *guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_bounded_short_read() {
        let mut stream = Cursor::new(b"abcdefgh01234567".to_vec());
        assert_eq!(read_bounded(&mut stream, 8).unwrap(), b"abcdefgh");
        assert_eq!(read_bounded(&mut stream, 10).unwrap(), b"01234567");
        assert!(read_bounded(&mut stream, 10).unwrap().is_empty());
    }

    #[test]
    fn test_read_exact_truncated() {
        let mut stream = Cursor::new(vec![1, 2, 3]);
        match read_exact(&mut stream, 4) {
            Err(Error::Truncated { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_read_size_t() {
        let mut stream = Cursor::new(b"\xEF\xBE\xAD\xDExV4\x00".to_vec());
        assert_eq!(read_size_t(&mut stream).unwrap(), 0x345678deadbeef);
    }

    #[test]
    fn test_write_size_t() {
        let mut stream = Cursor::new(Vec::new());
        write_size_t(&mut stream, 0x123).unwrap();
        assert_eq!(stream.into_inner(), b"\x23\x01\x00\x00\x00\x00\x00\x00");
    }

    #[test]
    fn test_keep_pos() {
        let mut stream = Cursor::new(b"1234".to_vec());
        let bytes = keep_pos(&mut stream, Some(2), |s| read_bounded(s, 2)).unwrap();
        assert_eq!(bytes, b"34");
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_keep_pos_restores_on_error() {
        let mut stream = Cursor::new(b"1234".to_vec());
        stream.set_position(1);
        let result: Result<()> = keep_pos(&mut stream, Some(3), |s| {
            read_exact(s, 8)?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(stream.position(), 1);
    }

    #[test]
    fn test_position_guard_deref() {
        let mut stream = Cursor::new(b"abcdef".to_vec());
        {
            let mut guard = PositionGuard::new(&mut stream, Some(4)).unwrap();
            assert_eq!(guard.origin(), 0);
            assert_eq!(read_bounded(&mut *guard, 2).unwrap(), b"ef");
        }
        assert_eq!(stream.position(), 0);
    }
}
