//! Structures in C++.

use std::fmt;

use serde::Serialize;

use super::{Codec, Registry};
use crate::stream::{
    keep_pos, position, read_bounded, read_size_t, set_position, write_size_t, Stream, SIZE_T,
};
use crate::{util, Error, Result, Value};

/// The `std::string` class in C++11 (libstdc++ layout).
///
/// ```text
/// class string {
///   void* _M_dataplus;
///   size_t string_length;
///   union {
///     char local_buf[15 + 1];
///     size_t allocated_capacity;
///   }
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CppString {
    #[serde(serialize_with = "serialize_lossy")]
    data: Vec<u8>,
    capacity: u64,
    dataplus: u64,
}

impl CppString {
    /// Strings no longer than this are stored in the inline buffer
    pub const LOCAL_CAPACITY: u64 = 15;

    /// Bytes one string occupies in memory
    pub const SIZE: u64 = 2 * SIZE_T as u64 + Self::LOCAL_CAPACITY + 1;

    pub const TYPE_KEY: &'static str = "cpp/string";

    pub fn new(data: impl Into<Vec<u8>>, capacity: u64, dataplus: u64) -> Self {
        Self {
            data: data.into(),
            capacity,
            dataplus,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Pointer to the payload
    pub fn dataplus(&self) -> u64 {
        self.dataplus
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the payload.
    ///
    /// Exceeding the recorded capacity only warns: the caller may know the target
    /// memory can hold it.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
        if self.data.len() as u64 > self.capacity {
            tracing::warn!(
                "Length of str ({}) is larger than capacity ({})",
                self.data.len(),
                self.capacity
            );
        }
    }

    fn is_local(&self) -> bool {
        self.data.len() as u64 <= Self::LOCAL_CAPACITY
    }
}

impl fmt::Display for CppString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<CPP::String @data={:?}, @capacity={}, @dataplus={:#018x}>",
            String::from_utf8_lossy(&self.data),
            self.capacity,
            self.dataplus
        )
    }
}

fn serialize_lossy<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(data))
}

/// Codec for [`CppString`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CppStringCodec;

impl Codec for CppStringCodec {
    fn type_path(&self) -> Option<&'static str> {
        Some("CPP::String")
    }

    fn read(&self, stream: &mut dyn Stream) -> Result<Value> {
        let dataplus = read_size_t(stream)?;
        let length = read_size_t(stream)?;
        let union = read_bounded(stream, CppString::LOCAL_CAPACITY as usize + 1)?;

        let (data, capacity) = if length > CppString::LOCAL_CAPACITY {
            let capacity = util::unpack(&union[..union.len().min(SIZE_T)]);
            let data = keep_pos(stream, Some(dataplus), |s| read_bounded(s, length as usize))?;
            (data, capacity)
        } else {
            let end = (length as usize).min(union.len());
            (union[..end].to_vec(), CppString::LOCAL_CAPACITY)
        };
        Ok(Value::CppString(CppString::new(data, capacity, dataplus)))
    }

    /// Leaves the stream exactly [`CppString::SIZE`] bytes after the start
    fn write(&self, stream: &mut dyn Stream, value: &Value) -> Result<()> {
        let string = value.as_cpp_string().ok_or_else(|| Error::InvalidValue {
            codec: CppString::TYPE_KEY.to_string(),
            value: value.to_string(),
        })?;

        write_size_t(stream, string.dataplus)?;
        write_size_t(stream, string.len() as u64)?;
        let union_start = position(stream)?;

        let mut payload = string.data.clone();
        payload.push(0);
        if string.is_local() {
            stream.write_all(&payload)?;
        } else {
            keep_pos(stream, Some(string.dataplus), |s| {
                s.write_all(&payload)?;
                Ok(())
            })?;
            write_size_t(stream, string.capacity)?;
        }
        set_position(stream, union_start + CppString::LOCAL_CAPACITY + 1)
    }
}

pub(crate) fn register(registry: &mut Registry) -> Result<()> {
    // The `std::string` class in C++11.
    //
    // The std::string class can be seen as:
    //   class string {
    //     void* _M_dataplus;
    //     size_t string_length;
    //     union {
    //       char local_buf[15 + 1];
    //       size_t allocated_capacity;
    //     }
    //   };
    registry.register(CppStringCodec, &[], None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(dataplus: u64, length: u64) -> Vec<u8> {
        let mut bytes = util::pack(dataplus, 8);
        bytes.extend(util::pack(length, 8));
        bytes
    }

    #[test]
    fn test_read_local() {
        let mut bytes = header(0x7fff_0000_0010, 4);
        // Garbage after the payload must not leak into the capacity
        bytes.extend(b"meow\0\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff");
        let mut stream = Cursor::new(bytes);

        let value = CppStringCodec.read(&mut stream).unwrap();
        let string = value.as_cpp_string().unwrap();
        assert_eq!(string.data(), b"meow");
        assert_eq!(string.capacity(), CppString::LOCAL_CAPACITY);
        assert_eq!(string.dataplus(), 0x7fff_0000_0010);
        assert_eq!(stream.position(), CppString::SIZE);
    }

    #[test]
    fn test_read_out_of_line() {
        let payload = b"abcdefghijklmnopqrstuvwxyz";
        let mut bytes = header(64, payload.len() as u64);
        bytes.extend(util::pack(30, 8));
        bytes.extend([0u8; 8]);
        bytes.resize(64, 0xcc);
        bytes.extend(payload);
        bytes.push(0);
        let mut stream = Cursor::new(bytes);

        let value = CppStringCodec.read(&mut stream).unwrap();
        let string = value.as_cpp_string().unwrap();
        assert_eq!(string.data(), payload);
        assert_eq!(string.capacity(), 30);
        assert_eq!(string.len(), 26);
        // Position is restored after chasing the pointer
        assert_eq!(stream.position(), CppString::SIZE);
    }

    #[test]
    fn test_read_boundary_length() {
        let mut bytes = header(0, 15);
        bytes.extend(b"AAAABBBBCCCCDDD\0");
        let mut stream = Cursor::new(bytes);
        let value = CppStringCodec.read(&mut stream).unwrap();
        assert_eq!(value.as_cpp_string().unwrap().data(), b"AAAABBBBCCCCDDD");
    }

    #[test]
    fn test_write_local() {
        let mut stream = Cursor::new(Vec::new());
        let value = Value::from(CppString::new("meow", 15, 16));
        CppStringCodec.write(&mut stream, &value).unwrap();

        let mut expected = header(16, 4);
        expected.extend(b"meow\0");
        assert_eq!(stream.get_ref(), &expected);
        assert_eq!(stream.position(), 32);
    }

    #[test]
    fn test_write_out_of_line() {
        let mut stream = Cursor::new(vec![0u8; 96]);
        let string = CppString::new("A".repeat(26), 30, 64);
        CppStringCodec.write(&mut stream, &Value::from(string)).unwrap();
        assert_eq!(stream.position(), CppString::SIZE);

        let bytes = stream.get_ref();
        assert_eq!(util::unpack(&bytes[0..8]), 64);
        assert_eq!(util::unpack(&bytes[8..16]), 26);
        assert_eq!(util::unpack(&bytes[16..24]), 30);
        assert_eq!(&bytes[64..90], "A".repeat(26).as_bytes());
        assert_eq!(bytes[90], 0);

        stream.set_position(0);
        let value = CppStringCodec.read(&mut stream).unwrap();
        assert_eq!(value.as_cpp_string().unwrap().data(), "A".repeat(26).as_bytes());
    }

    #[test]
    fn test_write_fixed_stride() {
        let mut stream = Cursor::new(Vec::new());
        for name in ["a", "bb", "ccc"] {
            CppStringCodec
                .write(&mut stream, &Value::from(CppString::new(name, 15, 0)))
                .unwrap();
        }
        assert_eq!(stream.position(), 3 * CppString::SIZE);
    }

    #[test]
    fn test_set_data_over_capacity() {
        let mut string = CppString::new("abc", 15, 0);
        string.set_data("A".repeat(20));
        assert_eq!(string.len(), 20);
        assert_eq!(string.capacity(), 15);
    }

    #[test]
    fn test_display() {
        let string = CppString::new("meow", 15, 0x00007fffdeadbeef);
        assert_eq!(
            string.to_string(),
            r#"#<CPP::String @data="meow", @capacity=15, @dataplus=0x00007fffdeadbeef>"#
        );
    }

    #[test]
    fn test_registered_doc() {
        let registry = crate::types::global().unwrap();
        let entry = registry.find("string").unwrap();
        assert_eq!(entry.name(), "cpp/string");
        assert_eq!(
            entry.doc(),
            "The `std::string` class in C++11.\n\
             \n\
             The std::string class can be seen as:\n\
             \x20 class string {\n\
             \x20   void* _M_dataplus;\n\
             \x20   size_t string_length;\n\
             \x20   union {\n\
             \x20     char local_buf[15 + 1];\n\
             \x20     size_t allocated_capacity;\n\
             \x20   }\n\
             \x20 };\n"
        );
    }
}
