//! Typed reads and writes over a positionable stream

use std::fmt;
use std::io::Write;

use crate::stream::{read_bounded, set_position, Stream};
use crate::types::{self, Codec, Entry};
use crate::{Error, Result, Value};

/// Ad hoc decoder accepted by [`TypeSpec::Reader`]
pub type ReadFn<'a> = dyn Fn(&mut dyn Stream) -> Result<Value> + 'a;

/// Ad hoc encoder accepted by [`TypeSpec::Writer`]
pub type WriteFn<'a> = dyn Fn(&mut dyn Stream, &Value) -> Result<()> + 'a;

/// How elements are decoded or encoded
#[derive(Clone, Copy)]
pub enum TypeSpec<'a> {
    /// A registered type, by key or free-form name (`"u64"`, `"CPP::String"`)
    Name(&'a str),
    /// A codec that need not be registered
    Codec(&'a dyn Codec),
    Reader(&'a ReadFn<'a>),
    Writer(&'a WriteFn<'a>),
}

impl<'a> TypeSpec<'a> {
    fn codec(self) -> Result<Option<&'a dyn Codec>> {
        match self {
            TypeSpec::Name(name) => types::find(name)?
                .map(|entry: &'static Entry| Some(entry.codec()))
                .ok_or_else(|| Error::InvalidType(format!("{:?}", self))),
            TypeSpec::Codec(codec) => Ok(Some(codec)),
            TypeSpec::Reader(_) | TypeSpec::Writer(_) => Ok(None),
        }
    }

    fn invalid(self) -> Error {
        Error::InvalidType(format!("{:?}", self))
    }
}

impl fmt::Debug for TypeSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Name(name) => write!(f, "{:?}", name),
            TypeSpec::Codec(codec) => {
                write!(f, "Codec({})", codec.type_path().unwrap_or("<anonymous>"))
            }
            TypeSpec::Reader(_) => f.write_str("Reader(<fn>)"),
            TypeSpec::Writer(_) => f.write_str("Writer(<fn>)"),
        }
    }
}

impl<'a> From<&'a str> for TypeSpec<'a> {
    fn from(name: &'a str) -> Self {
        TypeSpec::Name(name)
    }
}

impl<'a> From<&'a String> for TypeSpec<'a> {
    fn from(name: &'a String) -> Self {
        TypeSpec::Name(name)
    }
}

impl<'a> From<&'a dyn Codec> for TypeSpec<'a> {
    fn from(codec: &'a dyn Codec) -> Self {
        TypeSpec::Codec(codec)
    }
}

/// Options for [`MemoryIo::read`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions<'a> {
    pub from: Option<u64>,
    pub as_type: Option<TypeSpec<'a>>,
    pub force_array: bool,
}

impl<'a> ReadOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reposition the stream before reading
    pub fn from(mut self, pos: u64) -> Self {
        self.from = Some(pos);
        self
    }

    pub fn as_type(mut self, spec: impl Into<TypeSpec<'a>>) -> Self {
        self.as_type = Some(spec.into());
        self
    }

    /// Return an array even for a single element
    pub fn force_array(mut self) -> Self {
        self.force_array = true;
        self
    }
}

/// Options for [`MemoryIo::write`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions<'a> {
    pub from: Option<u64>,
    pub as_type: Option<TypeSpec<'a>>,
}

impl<'a> WriteOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reposition the stream before writing
    pub fn from(mut self, pos: u64) -> Self {
        self.from = Some(pos);
        self
    }

    pub fn as_type(mut self, spec: impl Into<TypeSpec<'a>>) -> Self {
        self.as_type = Some(spec.into());
        self
    }
}

/// Typed reader/writer over a [`Stream`].
///
/// ```
/// use std::io::Cursor;
/// use memio::{MemoryIo, ReadOptions, Value};
///
/// let mut io = MemoryIo::new(Cursor::new(b"AAAABBBB\xef\xbe\xad\xde".to_vec()));
/// let value = io.read(1, ReadOptions::new().from(8).as_type("u32")).unwrap();
/// assert_eq!(value, Value::Unsigned(0xdeadbeef));
/// ```
#[derive(Debug)]
pub struct MemoryIo<S: Stream> {
    stream: S,
}

impl<S: Stream> MemoryIo<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn stream(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Move the stream back to position 0
    pub fn rewind(&mut self) -> Result<()> {
        set_position(&mut self.stream, 0)
    }

    /// Read `count` elements.
    ///
    /// Without a type, up to `count` raw bytes are returned as [`Value::Bytes`];
    /// fewer bytes means end-of-data. With a type, the decoder runs `count` times
    /// on the same stream. The result is a single value when `count == 1` and the
    /// array is not forced, otherwise a [`Value::Array`] of `count` elements.
    pub fn read(&mut self, count: usize, options: ReadOptions<'_>) -> Result<Value> {
        if count == 0 {
            return Err(Error::InvalidArgument(
                "number of elements must be positive".to_string(),
            ));
        }
        if let Some(from) = options.from {
            set_position(&mut self.stream, from)?;
        }
        let Some(spec) = options.as_type else {
            return Ok(Value::Bytes(read_bounded(&mut self.stream, count)?));
        };

        let mut values = Vec::with_capacity(count.min(4096));
        match (spec.codec()?, spec) {
            (Some(codec), _) => {
                for _ in 0..count {
                    values.push(codec.read(&mut self.stream)?);
                }
            }
            (None, TypeSpec::Reader(read)) => {
                let stream: &mut dyn Stream = &mut self.stream;
                for _ in 0..count {
                    values.push(read(stream)?);
                }
            }
            (None, _) => return Err(spec.invalid()),
        }

        if count == 1 && !options.force_array {
            Ok(values.remove(0))
        } else {
            Ok(Value::Array(values))
        }
    }

    /// Write `value`.
    ///
    /// A structured value such as [`crate::CppString`] brings its own type. With no
    /// type at all only bytes can be written, as-is. Otherwise the encoder runs
    /// once per element; a scalar is a one-element sequence.
    pub fn write(&mut self, value: impl Into<Value>, options: WriteOptions<'_>) -> Result<()> {
        let value = value.into();
        if let Some(from) = options.from {
            set_position(&mut self.stream, from)?;
        }

        let spec = options
            .as_type
            .or_else(|| value.type_key().map(TypeSpec::Name));
        let Some(spec) = spec else {
            let bytes = value.as_bytes().ok_or_else(|| {
                Error::InvalidArgument(format!("{} cannot be written without a type", value))
            })?;
            self.stream.write_all(bytes)?;
            return Ok(());
        };

        match (spec.codec()?, spec) {
            (Some(codec), _) => {
                for element in value.elements() {
                    codec.write(&mut self.stream, element)?;
                }
            }
            (None, TypeSpec::Writer(write)) => {
                let stream: &mut dyn Stream = &mut self.stream;
                for element in value.elements() {
                    write(stream, element)?;
                }
            }
            (None, _) => return Err(spec.invalid()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::read_exact;
    use crate::types::clang::CStr;
    use crate::CppString;
    use std::io::Cursor;

    fn io(bytes: &[u8]) -> MemoryIo<Cursor<Vec<u8>>> {
        MemoryIo::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_read_raw() {
        let mut io = io(b"abcdefgh01234567");
        assert_eq!(io.read(8, ReadOptions::new()).unwrap(), Value::from("abcdefgh"));
        assert_eq!(io.read(10, ReadOptions::new()).unwrap(), Value::from("01234567"));
        assert_eq!(
            io.read(10, ReadOptions::new().from(2)).unwrap(),
            Value::from("cdefgh0123")
        );
        io.rewind().unwrap();
        assert_eq!(io.read(10, ReadOptions::new()).unwrap(), Value::from("abcdefgh01"));
    }

    #[test]
    fn test_read_zero_count() {
        let mut io = io(b"abc");
        assert!(matches!(
            io.read(0, ReadOptions::new().as_type("u8")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_read_with_reader() {
        let mut io = io(b"\x03123\x044567");
        let reader = |stream: &mut dyn Stream| -> Result<Value> {
            let len = read_exact(stream, 1)?[0] as usize;
            Ok(Value::Bytes(read_exact(stream, len)?))
        };
        let values = io.read(2, ReadOptions::new().as_type(TypeSpec::Reader(&reader))).unwrap();
        assert_eq!(values, Value::from(vec![Value::from("123"), Value::from("4567")]));
    }

    #[test]
    fn test_read_named_types() {
        let mut io = io(b"AAAABBBB\xef\xbe\xad\xde\x00\x00\x00\x00");
        assert_eq!(
            io.read(2, ReadOptions::new().as_type("u64")).unwrap(),
            Value::from(vec![Value::Unsigned(0x4242424241414141), Value::Unsigned(0xdeadbeef)])
        );
        assert_eq!(
            io.read(1, ReadOptions::new().from(0).as_type("u64").force_array()).unwrap(),
            Value::from(vec![Value::Unsigned(0x4242424241414141)])
        );
        assert_eq!(
            io.read(1, ReadOptions::new().from(8).as_type("u32")).unwrap(),
            Value::Unsigned(0xdeadbeef)
        );
        assert_eq!(
            io.read(1, ReadOptions::new().from(8).as_type("s32")).unwrap(),
            Value::Signed(0xdeadbeef - (1i64 << 32))
        );

        let mut strings = self::io(b"123\x0045678\x00");
        assert_eq!(
            strings.read(2, ReadOptions::new().as_type("c_str")).unwrap(),
            Value::from(vec![Value::from("123"), Value::from("45678")])
        );
    }

    #[test]
    fn test_read_with_codec() {
        let mut io = io(b"kk\0");
        let value = io.read(1, ReadOptions::new().as_type(&CStr as &dyn Codec)).unwrap();
        assert_eq!(value, Value::from("kk"));
    }

    #[test]
    fn test_shape() {
        let bytes = [7u8; 24];
        for count in 1..4 {
            let mut io = io(&bytes);
            let scalar = io.read(count, ReadOptions::new().from(0).as_type("u16")).unwrap();
            let forced = io
                .read(count, ReadOptions::new().from(0).as_type("u16").force_array())
                .unwrap();
            assert_eq!(forced.as_array().map(<[Value]>::len), Some(count));
            if count == 1 {
                assert_eq!(scalar, Value::Unsigned(0x0707));
                assert_eq!(forced.as_array().unwrap()[0], scalar);
            } else {
                assert_eq!(scalar, forced);
            }
        }
    }

    #[test]
    fn test_read_invalid_type() {
        let mut io = io(b"abcd");
        let err = io.read(1, ReadOptions::new().as_type("meow")).unwrap_err();
        assert!(matches!(&err, Error::InvalidType(name) if name.contains("meow")));

        let writer = |_: &mut dyn Stream, _: &Value| -> Result<()> { Ok(()) };
        let err = io
            .read(1, ReadOptions::new().as_type(TypeSpec::Writer(&writer)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));
    }

    #[test]
    fn test_write() {
        let mut io = MemoryIo::new(Cursor::new(Vec::new()));
        io.write("abcd", WriteOptions::new()).unwrap();
        assert_eq!(io.stream().get_ref(), b"abcd");

        let numbers: Value = [1u16, 2, 3, 4].into_iter().collect();
        io.write(numbers, WriteOptions::new().from(2).as_type("u16")).unwrap();
        assert_eq!(io.stream().get_ref(), b"ab\x01\x00\x02\x00\x03\x00\x04\x00");

        let strings: Value = ["A", "BB", "CCC"].into_iter().collect();
        io.write(strings, WriteOptions::new().from(0).as_type("c_str")).unwrap();
        assert_eq!(io.stream().get_ref(), b"A\x00BB\x00CCC\x00\x00");
    }

    #[test]
    fn test_write_with_writer() {
        let mut io = MemoryIo::new(Cursor::new(Vec::new()));
        let writer = |stream: &mut dyn Stream, value: &Value| -> Result<()> {
            let bytes = value.as_bytes().unwrap_or_default();
            stream.write_all(&[bytes.len() as u8])?;
            stream.write_all(bytes)?;
            Ok(())
        };
        let strings: Value = ["123", "4567"].into_iter().collect();
        io.write(strings, WriteOptions::new().as_type(TypeSpec::Writer(&writer)))
            .unwrap();
        assert_eq!(io.into_inner().into_inner(), b"\x03123\x044567");
    }

    #[test]
    fn test_write_infers_structured_type() {
        let mut io = MemoryIo::new(Cursor::new(Vec::new()));
        io.write(CppString::new("AAAA", 15, 16), WriteOptions::new()).unwrap();
        assert_eq!(
            &io.stream().get_ref()[..21],
            b"\x10\x00\x00\x00\x00\x00\x00\x00\x04\x00\x00\x00\x00\x00\x00\x00AAAA\x00"
        );
    }

    #[test]
    fn test_write_untyped_number_rejected() {
        let mut io = MemoryIo::new(Cursor::new(Vec::new()));
        assert!(matches!(
            io.write(5u32, WriteOptions::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(io.stream().get_ref().is_empty());
    }
}
