//! Memory access command handlers
//!
//! Handlers for reading, writing, and inspecting a target's address space.

use anyhow::{bail, Context, Result};
use memio::{Address, CppString, MemorySource, ReadOptions, Value, WriteOptions};

/// Parse hex bytes such as "de ad be ef" or "deadbeef"
fn parse_hex_bytes(bytes: &str) -> Result<Vec<u8>> {
    let digits: String = bytes
        .split_whitespace()
        .map(|part| part.trim_start_matches("0x"))
        .collect();
    hex::decode(&digits).with_context(|| format!("Invalid hex bytes: {}", bytes))
}

/// Format bytes as a hex dump, 16 per line, labelled with their address
fn hex_dump(addr: u64, data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        out.push_str(&format!("{:08x}  ", addr + i as u64 * 16));
        for j in 0..16 {
            match chunk.get(j) {
                Some(byte) => out.push_str(&format!("{:02x} ", byte)),
                None => out.push_str("   "),
            }
            if j == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        for &byte in chunk {
            let c = byte as char;
            out.push(if c.is_ascii_graphic() || c == ' ' { c } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}

/// How typed values are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Plain,
    Hex,
    Json,
}

fn render(value: &Value, hex: bool) -> String {
    match value {
        Value::Unsigned(v) if hex => format!("{:#x}", v),
        Value::Signed(v) if hex && *v < 0 => format!("-{:#x}", v.unsigned_abs()),
        Value::Signed(v) if hex => format!("{:#x}", v),
        other => other.to_string(),
    }
}

/// Handle the Read command
pub fn handle_read(
    source: &impl MemorySource,
    address: &str,
    count: usize,
    type_name: Option<&str>,
    array: bool,
    output: Output,
) -> Result<()> {
    let addr = source.resolve(&Address::from(address))?;

    let mut options = ReadOptions::new();
    if let Some(type_name) = type_name {
        options = options.as_type(type_name);
    }
    if array {
        options = options.force_array();
    }
    let value = source
        .read(addr, count, options)
        .with_context(|| format!("Failed to read at {:#x}", addr))?;

    if output == Output::Json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let hex = output == Output::Hex;
    match (&value, type_name) {
        (Value::Bytes(data), None) => {
            println!("Reading {} bytes at {:#x}:", data.len(), addr);
            print!("{}", hex_dump(addr, data));
        }
        (Value::Array(values), _) => {
            for value in values {
                println!("{}", render(value, hex));
            }
        }
        (value, _) => println!("{}", render(value, hex)),
    }

    Ok(())
}

/// Handle the Write command
///
/// Typed values are parsed by their codec; untyped values are raw hex bytes.
pub fn handle_write(
    source: &impl MemorySource,
    address: &str,
    type_name: Option<&str>,
    values: &[String],
) -> Result<()> {
    let addr = source.resolve(&Address::from(address))?;

    let Some(type_name) = type_name else {
        let data = parse_hex_bytes(&values.join(" "))?;
        let original = source.read(addr, data.len(), ReadOptions::new())?;
        println!("Writing {} bytes to {:#x}:", data.len(), addr);
        println!("Original: {}", original.as_bytes().map(hex::encode).unwrap_or_default());
        println!("New:      {}", hex::encode(&data));
        source.write(addr, data, WriteOptions::new())?;
        println!("Write successful!");
        return Ok(());
    };

    let entry = memio::types::find(type_name)?
        .with_context(|| format!("Unknown type {:?}; see `memio types`", type_name))?;
    let parsed = values
        .iter()
        .map(|text| entry.codec().from_text(text))
        .collect::<memio::Result<Vec<Value>>>()
        .with_context(|| format!("Invalid value for {}", entry.name()))?;

    println!("Writing {} {} value(s) to {:#x}", parsed.len(), entry.name(), addr);
    source.write(addr, parsed, WriteOptions::new().as_type(entry.name()))?;
    println!("Write successful!");

    Ok(())
}

/// Handle the SetString command
///
/// Reads the std::string at `address`, replaces its payload and writes it back,
/// keeping its pointer and capacity.
pub fn handle_set_string(source: &impl MemorySource, address: &str, text: &str) -> Result<()> {
    let addr = source.resolve(&Address::from(address))?;
    let value = source.read(addr, 1, ReadOptions::new().as_type(CppString::TYPE_KEY))?;
    let Value::CppString(mut string) = value else {
        bail!("Expected a std::string at {:#x}", addr);
    };

    println!("Original: {}", string);
    string.set_data(text);
    source.write(addr, string.clone(), WriteOptions::new())?;
    println!("New:      {}", string);

    Ok(())
}

/// Handle the Regions command
pub fn handle_regions(process: &memio::Process, maps: bool) -> Result<()> {
    if maps {
        for region in process.regions()? {
            println!(
                "{:016x}-{:016x} {} {:8x} {}",
                region.start,
                region.end,
                region.perms,
                region.offset,
                region.path.as_deref().unwrap_or("")
            );
        }
        return Ok(());
    }

    for (name, base) in process.bases()? {
        println!("{}: {:#018x}", name, base);
    }
    Ok(())
}

/// Handle the Eval command
pub fn handle_eval(source: &impl MemorySource, expression: &str) -> Result<()> {
    let addr = source.resolve(&Address::from(expression))?;
    println!("{:#x}", addr);
    Ok(())
}
