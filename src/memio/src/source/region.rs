//! Memory Region Types
//!
//! Data structures for representing memory regions from /proc/pid/maps.

use std::path::Path;

use crate::{util, Bases};

/// A memory region from /proc/pid/maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub perms: String,
    pub offset: u64,
    pub path: Option<String>,
}

impl MemoryRegion {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_readable(&self) -> bool {
        self.perms.starts_with('r')
    }

    pub fn is_writable(&self) -> bool {
        self.perms.chars().nth(1) == Some('w')
    }

    pub fn is_executable(&self) -> bool {
        self.perms.chars().nth(2) == Some('x')
    }

    pub fn contains(&self, address: u64) -> bool {
        (self.start..self.end).contains(&address)
    }

    /// Short name usable in address expressions.
    ///
    /// `[heap]` gives `heap`, `/usr/lib/libc-2.24.so` gives `libc`. Anonymous
    /// regions have no name.
    pub fn name(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        if let Some(inner) = path.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
            return Some(inner.to_string());
        }
        let file = Path::new(path).file_name()?.to_string_lossy();
        Some(util::trim_libname(&file))
    }
}

/// Parse the contents of /proc/pid/maps.
///
/// Lines that do not start with an address range are skipped.
pub fn parse_maps(content: &str) -> Vec<MemoryRegion> {
    let mut regions = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((start, end)) = parts.first().and_then(|range| range.split_once('-')) else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            u64::from_str_radix(start, 16),
            u64::from_str_radix(end, 16),
        ) else {
            continue;
        };

        let perms = parts.get(1).unwrap_or(&"").to_string();
        let offset = parts
            .get(2)
            .and_then(|s| u64::from_str_radix(s, 16).ok())
            .unwrap_or(0);
        let path = (parts.len() > 5).then(|| parts[5..].join(" "));

        regions.push(MemoryRegion {
            start,
            end,
            perms,
            offset,
            path,
        });
    }

    regions
}

/// Name → base address; a name mapped more than once keeps its lowest address
pub fn bases_of(regions: &[MemoryRegion]) -> Bases {
    let mut bases = Bases::new();
    for region in regions {
        let Some(name) = region.name() else {
            continue;
        };
        bases
            .entry(name)
            .and_modify(|base| *base = (*base).min(region.start))
            .or_insert(region.start);
    }
    bases
}
