//! Native numbers: (un)signed 8/16/32/64-bit integers and IEEE-754 floats.
//!
//! All numbers are little endian.

use byteorder::{ByteOrder, LE};

use super::{Codec, Registry};
use crate::stream::{read_exact, Stream};
use crate::{util, Error, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Unsigned,
    Signed,
    Float,
}

/// A fixed-width little-endian number
#[derive(Debug, Clone, Copy)]
pub struct Number {
    bytes: usize,
    kind: Kind,
}

impl Number {
    pub const fn unsigned(bytes: usize) -> Self {
        Self {
            bytes,
            kind: Kind::Unsigned,
        }
    }

    pub const fn signed(bytes: usize) -> Self {
        Self {
            bytes,
            kind: Kind::Signed,
        }
    }

    /// `bytes` must be 4 or 8; other widths fail on use
    pub const fn float(bytes: usize) -> Self {
        Self {
            bytes,
            kind: Kind::Float,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes
    }

    fn name(&self) -> String {
        match self.kind {
            Kind::Unsigned => format!("u{}", self.bytes * 8),
            Kind::Signed => format!("s{}", self.bytes * 8),
            Kind::Float if self.bytes == 4 => "float".to_string(),
            Kind::Float => "double".to_string(),
        }
    }

    /// Integers are 1 to 8 bytes wide, floats 4 or 8
    fn check_width(&self) -> Result<()> {
        let valid = match self.kind {
            Kind::Unsigned | Kind::Signed => (1..=8).contains(&self.bytes),
            Kind::Float => matches!(self.bytes, 4 | 8),
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "unsupported {:?} width: {} bytes",
                self.kind, self.bytes
            )))
        }
    }

    fn decode(&self, bytes: &[u8]) -> Value {
        match self.kind {
            Kind::Unsigned => Value::Unsigned(util::unpack(bytes)),
            Kind::Signed => Value::Signed(LE::read_int(bytes, self.bytes)),
            Kind::Float if self.bytes == 4 => Value::Float(LE::read_f32(bytes) as f64),
            Kind::Float => Value::Float(LE::read_f64(bytes)),
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        if self.kind == Kind::Float {
            let float = value.as_f64().ok_or_else(|| self.invalid(value))?;
            let mut buf = vec![0u8; self.bytes];
            if self.bytes == 4 {
                LE::write_f32(&mut buf, float as f32);
            } else {
                LE::write_f64(&mut buf, float);
            }
            return Ok(buf);
        }

        // Two's complement; only the low bytes are kept
        let bits = match value {
            Value::Unsigned(v) => *v,
            Value::Signed(v) => *v as u64,
            other => return Err(self.invalid(other)),
        };
        Ok(util::pack(bits, self.bytes))
    }

    fn invalid(&self, value: &Value) -> Error {
        Error::InvalidValue {
            codec: self.name(),
            value: value.to_string(),
        }
    }
}

impl Codec for Number {
    fn read(&self, stream: &mut dyn Stream) -> Result<Value> {
        self.check_width()?;
        let bytes = read_exact(stream, self.bytes)?;
        Ok(self.decode(&bytes))
    }

    fn write(&self, stream: &mut dyn Stream, value: &Value) -> Result<()> {
        self.check_width()?;
        stream.write_all(&self.encode(value)?)?;
        Ok(())
    }

    fn from_text(&self, text: &str) -> Result<Value> {
        let text = text.trim();
        let invalid = || Error::InvalidValue {
            codec: self.name(),
            value: text.to_string(),
        };
        match self.kind {
            Kind::Float => text.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
            Kind::Unsigned | Kind::Signed => {
                let (negative, digits) = match text.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, text),
                };
                let magnitude = match digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => digits.parse::<u64>(),
                }
                .map_err(|_| invalid())?;
                if negative {
                    let value = 0i64
                        .checked_sub_unsigned(magnitude)
                        .ok_or_else(invalid)?;
                    Ok(Value::Signed(value))
                } else if self.kind == Kind::Signed {
                    i64::try_from(magnitude)
                        .map(Value::Signed)
                        .or(Ok(Value::Unsigned(magnitude)))
                } else {
                    Ok(Value::Unsigned(magnitude))
                }
            }
        }
    }
}

pub(crate) fn register(registry: &mut Registry) -> Result<()> {
    for bits in [8usize, 16, 32, 64] {
        let signed_keys = [format!("basic/s{}", bits), format!("s{}", bits)];
        let signed_doc = format!("A signed {}-bit integer.", bits);
        registry.register(
            Number::signed(bits / 8),
            &[signed_keys[0].as_str(), signed_keys[1].as_str()],
            Some(signed_doc.as_str()),
        )?;

        let unsigned_keys = [format!("basic/u{}", bits), format!("u{}", bits)];
        let unsigned_doc = format!("An unsigned {}-bit integer.", bits);
        registry.register(
            Number::unsigned(bits / 8),
            &[unsigned_keys[0].as_str(), unsigned_keys[1].as_str()],
            Some(unsigned_doc.as_str()),
        )?;
    }

    registry.register(
        Number::float(4),
        &["basic/float", "float"],
        Some("IEEE-754 32-bit floating number."),
    )?;
    registry.register(
        Number::float(8),
        &["basic/double", "double"],
        Some("IEEE-754 64-bit floating number."),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn codec(key: &str) -> &'static dyn Codec {
        crate::types::find(key).unwrap().unwrap().codec()
    }

    #[test]
    fn test_read_unsigned() {
        let mut stream = Cursor::new(vec![0xff; 100]);
        assert_eq!(codec("u8").read(&mut stream).unwrap(), Value::Unsigned(0xff));
        assert_eq!(codec("u16").read(&mut stream).unwrap(), Value::Unsigned(0xffff));
        assert_eq!(codec("u32").read(&mut stream).unwrap(), Value::Unsigned(0xffff_ffff));
        assert_eq!(codec("u64").read(&mut stream).unwrap(), Value::Unsigned(u64::MAX));
    }

    #[test]
    fn test_read_signed() {
        let mut stream = Cursor::new(vec![0xff; 100]);
        for key in ["s8", "s16", "s32", "s64"] {
            assert_eq!(codec(key).read(&mut stream).unwrap(), Value::Signed(-1));
        }
    }

    #[test]
    fn test_little_endian_weights() {
        let bytes = [0x01, 0x02, 0x03, 0x84];
        let mut stream = Cursor::new(bytes.to_vec());
        let unsigned = 0x01 + 0x02 * 256 + 0x03 * 65536 + 0x84 * 16_777_216u64;
        assert_eq!(codec("u32").read(&mut stream).unwrap(), Value::Unsigned(unsigned));

        // Top bit set: the signed value is the unsigned value minus 2^32
        stream.set_position(0);
        let signed = unsigned as i64 - (1i64 << 32);
        assert_eq!(codec("s32").read(&mut stream).unwrap(), Value::Signed(signed));

        let mut stream = Cursor::new(vec![0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(codec("s32").read(&mut stream).unwrap(), Value::Signed(0xdeadbeef - (1 << 32)));
    }

    #[test]
    fn test_read_floating() {
        let mut stream = Cursor::new(b"\x00\x00\x80\xBF".to_vec());
        assert_eq!(codec("float").read(&mut stream).unwrap(), Value::Float(-1.0));
        let mut stream = Cursor::new(b"\x00\x00\x00\x00\x00\x00\xF0\xBF".to_vec());
        assert_eq!(codec("double").read(&mut stream).unwrap(), Value::Float(-1.0));
    }

    #[test]
    fn test_read_truncated() {
        let mut stream = Cursor::new(vec![1, 2, 3]);
        assert!(matches!(
            codec("u32").read(&mut stream),
            Err(Error::Truncated { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_write_integer() {
        let mut stream = Cursor::new(Vec::new());
        codec("u64")
            .write(&mut stream, &Value::Unsigned(0xdeadbeef12345678))
            .unwrap();
        assert_eq!(stream.get_ref(), b"\x78\x56\x34\x12\xef\xbe\xad\xde");

        let mut stream = Cursor::new(Vec::new());
        codec("s64")
            .write(&mut stream, &Value::Signed(-0x21524110edcba988))
            .unwrap();
        assert_eq!(stream.get_ref(), b"\x78\x56\x34\x12\xef\xbe\xad\xde");
    }

    #[test]
    fn test_write_floating() {
        let mut stream = Cursor::new(Vec::new());
        codec("float").write(&mut stream, &Value::Float(-0.123)).unwrap();
        assert_eq!(stream.get_ref(), b"m\xE7\xFB\xBD");

        let mut stream = Cursor::new(Vec::new());
        codec("double").write(&mut stream, &Value::Float(-0.123)).unwrap();
        assert_eq!(stream.get_ref(), b"\xB0rh\x91\xED|\xBF\xBF");
    }

    #[test]
    fn test_round_trip_boundaries() {
        let cases = [
            ("u8", Value::Unsigned(0)),
            ("u8", Value::Unsigned(u8::MAX as u64)),
            ("u16", Value::Unsigned(0)),
            ("u16", Value::Unsigned(u16::MAX as u64)),
            ("u32", Value::Unsigned(0)),
            ("u32", Value::Unsigned(u32::MAX as u64)),
            ("u64", Value::Unsigned(0)),
            ("u64", Value::Unsigned(u64::MAX)),
            ("s8", Value::Signed(i8::MIN as i64)),
            ("s8", Value::Signed(0)),
            ("s8", Value::Signed(i8::MAX as i64)),
            ("s16", Value::Signed(i16::MIN as i64)),
            ("s16", Value::Signed(0)),
            ("s16", Value::Signed(i16::MAX as i64)),
            ("s32", Value::Signed(i32::MIN as i64)),
            ("s32", Value::Signed(0)),
            ("s32", Value::Signed(i32::MAX as i64)),
            ("s64", Value::Signed(i64::MIN)),
            ("s64", Value::Signed(0)),
            ("s64", Value::Signed(i64::MAX)),
            ("float", Value::Float(0.0)),
            ("float", Value::Float(-1.5)),
            ("float", Value::Float(f32::MAX as f64)),
            ("float", Value::Float(f32::MIN_POSITIVE as f64)),
            ("double", Value::Float(0.0)),
            ("double", Value::Float(-0.123)),
            ("double", Value::Float(f64::MAX)),
            ("double", Value::Float(f64::MIN)),
        ];
        for (key, value) in cases {
            let mut stream = Cursor::new(vec![0xaa; 16]);
            stream.set_position(3);
            codec(key).write(&mut stream, &value).unwrap();
            stream.set_position(3);
            assert_eq!(codec(key).read(&mut stream).unwrap(), value, "{}", key);
        }
    }

    #[test]
    fn test_unsupported_widths() {
        let numbers = [
            Number::float(2),
            Number::signed(0),
            Number::signed(9),
            Number::unsigned(16),
        ];
        for number in numbers {
            let mut stream = Cursor::new(vec![0xff; 32]);
            assert!(matches!(number.read(&mut stream), Err(Error::InvalidArgument(_))));
            assert!(matches!(
                number.write(&mut stream, &Value::Unsigned(1)),
                Err(Error::InvalidArgument(_))
            ));
            assert_eq!(stream.get_ref(), &vec![0xff; 32]);
        }
    }

    #[test]
    fn test_write_rejects_non_numbers() {
        let mut stream = Cursor::new(Vec::new());
        assert!(matches!(
            codec("u32").write(&mut stream, &Value::from("abc")),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            codec("u32").write(&mut stream, &Value::Float(1.5)),
            Err(Error::InvalidValue { .. })
        ));
        assert!(stream.get_ref().is_empty());
    }

    #[test]
    fn test_from_text() {
        assert_eq!(codec("u32").from_text("0x10").unwrap(), Value::Unsigned(16));
        assert_eq!(codec("u8").from_text("255").unwrap(), Value::Unsigned(255));
        assert_eq!(codec("s32").from_text("-0x10").unwrap(), Value::Signed(-16));
        assert_eq!(codec("s64").from_text("42").unwrap(), Value::Signed(42));
        assert_eq!(codec("double").from_text("-0.5").unwrap(), Value::Float(-0.5));
        assert!(codec("u16").from_text("zz").is_err());
    }

    #[test]
    fn test_docs() {
        let registry = crate::types::global().unwrap();
        assert_eq!(registry.find("s16").unwrap().doc(), "A signed 16-bit integer.");
        assert_eq!(registry.find("basic/u8").unwrap().doc(), "An unsigned 8-bit integer.");
        assert_eq!(registry.find("float").unwrap().doc(), "IEEE-754 32-bit floating number.");
    }
}
