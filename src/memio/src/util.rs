//! Naming and packing helpers shared by the registry and the codecs.

use byteorder::{ByteOrder, LE};
use once_cell::sync::Lazy;
use regex::Regex;

static CAPITAL_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex"));
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));
static SO_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-[\d.]+)?\.so$|\.so\.[.\d]+$").expect("static regex"));

/// Convert a type path into snake case, turning `::` into `/`.
///
/// ```
/// assert_eq!(memio::util::underscore("MemoryIO"), "memory_io");
/// assert_eq!(memio::util::underscore("MyModule::MyClass"), "my_module/my_class");
/// ```
pub fn underscore(name: &str) -> String {
    let name = name.replace("::", "/");
    let name = CAPITAL_RUN.replace_all(&name, "${1}_${2}");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    name.to_lowercase()
}

/// Unpack up to eight little-endian bytes into an integer
pub fn unpack(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        return 0;
    }
    LE::read_uint(bytes, bytes.len().min(8))
}

/// Pack the low `size` bytes of `value` in little-endian order
pub fn pack(value: u64, size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| if i < 8 { (value >> (i * 8)) as u8 } else { 0 })
        .collect()
}

/// Remove the shared-object extension and version from a library file name.
///
/// ```
/// use memio::util::trim_libname;
///
/// assert_eq!(trim_libname("libc-2.24.so"), "libc");
/// assert_eq!(trim_libname("libcrypto.so.1.0.0"), "libcrypto");
/// assert_eq!(trim_libname("ld-linux-x86-64.so.2"), "ld");
/// assert_eq!(trim_libname("not_a_so"), "not_a_so");
/// ```
pub fn trim_libname(name: &str) -> String {
    if name.starts_with("ld-") {
        return "ld".to_string();
    }
    SO_SUFFIX.replace(name, "").into_owned()
}
