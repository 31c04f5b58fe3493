//! Structures used in C.

use std::io::{ErrorKind, SeekFrom};

use super::{Codec, Registry};
use crate::stream::Stream;
use crate::{Error, Result, Value};

/// Bytes requested per read while scanning for the terminator
const SCAN_CHUNK: usize = 256;

/// A null-terminated string
#[derive(Debug, Clone, Copy, Default)]
pub struct CStr;

impl Codec for CStr {
    fn type_path(&self) -> Option<&'static str> {
        Some("Clang::CStr")
    }

    /// Bytes up to, not including, the null byte; end-of-data also ends the string
    fn read(&self, stream: &mut dyn Stream) -> Result<Value> {
        let mut bytes = Vec::new();
        let mut chunk = [0u8; SCAN_CHUNK];
        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            match chunk[..n].iter().position(|&c| c == 0) {
                Some(nul) => {
                    bytes.extend_from_slice(&chunk[..nul]);
                    // Leave the stream just past the null byte
                    let overshoot = (n - nul - 1) as i64;
                    if overshoot > 0 {
                        stream.seek(SeekFrom::Current(-overshoot))?;
                    }
                    break;
                }
                None => bytes.extend_from_slice(&chunk[..n]),
            }
        }
        Ok(Value::Bytes(bytes))
    }

    /// A null byte is appended unless the value already ends with one
    fn write(&self, stream: &mut dyn Stream, value: &Value) -> Result<()> {
        let bytes = value.as_bytes().ok_or_else(|| Error::InvalidValue {
            codec: "c_str".to_string(),
            value: value.to_string(),
        })?;
        stream.write_all(bytes)?;
        if bytes.last() != Some(&0) {
            stream.write_all(&[0])?;
        }
        Ok(())
    }

    fn from_text(&self, text: &str) -> Result<Value> {
        Ok(Value::from(text))
    }
}

pub(crate) fn register(registry: &mut Registry) -> Result<()> {
    // A null-terminated string.
    registry.register(CStr, &[], None)?;
    Ok(())
}
