//! Type registry keyed by string aliases

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::{basic, clang, cpp, Codec};
use crate::{util, Error, Result};

/// Where a codec was registered, used to recover its documentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: PathBuf::from(location.file()),
            line: location.line(),
        }
    }
}

/// A registered codec together with every key that finds it
pub struct Entry {
    codec: Box<dyn Codec>,
    keys: Vec<String>,
    doc: Option<String>,
    location: Option<SourceLocation>,
    parsed_doc: OnceCell<String>,
}

impl Entry {
    pub fn new(
        codec: Box<dyn Codec>,
        keys: Vec<String>,
        doc: Option<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            codec,
            keys,
            doc,
            location,
            parsed_doc: OnceCell::new(),
        }
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The first (most qualified) key
    pub fn name(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or_default()
    }

    /// Documentation of the registered type.
    ///
    /// An explicit doc string wins. Otherwise the comment block right above the
    /// registration call is read from source the first time this is called; when
    /// the source is unavailable the doc is empty.
    pub fn doc(&self) -> &str {
        if let Some(doc) = &self.doc {
            return doc;
        }
        self.parsed_doc.get_or_init(|| match &self.location {
            Some(location) => parse_file_doc(location),
            None => String::new(),
        })
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("keys", &self.keys)
            .field("type_path", &self.codec.type_path())
            .field("location", &self.location)
            .finish()
    }
}

/// Map from string keys to codecs
#[derive(Default)]
pub struct Registry {
    map: HashMap<String, Arc<Entry>>,
    order: Vec<Arc<Entry>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the numeric, C and C++ codecs
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        basic::register(&mut registry)?;
        clang::register(&mut registry)?;
        cpp::register(&mut registry)?;
        Ok(registry)
    }

    /// Register a codec.
    ///
    /// Candidate keys are the snake-cased type path (`CPP::String` gives
    /// `cpp/string`), its last segment (`string`), then `aliases`. Keys already
    /// taken by another codec are skipped. Registration only fails when every
    /// candidate is taken.
    ///
    /// Returns the keys that now find this codec.
    #[track_caller]
    pub fn register<C: Codec + 'static>(
        &mut self,
        codec: C,
        aliases: &[&str],
        doc: Option<&str>,
    ) -> Result<Vec<String>> {
        let location = SourceLocation::from(Location::caller());

        let mut candidates = default_keys(codec.type_path());
        for alias in aliases {
            if !candidates.iter().any(|k| k == alias) {
                candidates.push(alias.to_string());
            }
        }
        if candidates.is_empty() {
            return Err(Error::InvalidArgument(
                "an anonymous codec needs at least one alias".to_string(),
            ));
        }

        let keys: Vec<String> = candidates
            .iter()
            .filter(|key| !self.map.contains_key(key.as_str()))
            .cloned()
            .collect();
        if keys.is_empty() {
            let name = codec
                .type_path()
                .map(str::to_string)
                .unwrap_or_else(|| candidates[0].clone());
            return Err(Error::NameCollision {
                name,
                keys: candidates,
            });
        }

        tracing::debug!(?keys, file = %location.file.display(), line = location.line, "register codec");
        let entry = Arc::new(Entry::new(
            Box::new(codec),
            keys.clone(),
            doc.map(str::to_string),
            Some(location),
        ));
        for key in &keys {
            self.map.insert(key.clone(), Arc::clone(&entry));
        }
        self.order.push(entry);
        Ok(keys)
    }

    /// Exact lookup, no normalization
    pub fn find(&self, key: &str) -> Option<&Entry> {
        self.map.get(key).map(Arc::as_ref)
    }

    /// Every entry once, in registration order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}

fn default_keys(type_path: Option<&str>) -> Vec<String> {
    let Some(path) = type_path else {
        return Vec::new();
    };
    let snake = util::underscore(path);
    let leaf = snake.rsplit('/').next().unwrap_or_default().to_string();
    let mut keys = vec![snake];
    if !keys.contains(&leaf) && !leaf.is_empty() {
        keys.push(leaf);
    }
    keys
}

/// Resolve a compile-time file path, which cargo records relative to the workspace
fn locate(file: &Path) -> Option<PathBuf> {
    if file.is_file() {
        return Some(file.to_path_buf());
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .map(|dir| dir.join(file))
        .find(|path| path.is_file())
}

fn parse_file_doc(location: &SourceLocation) -> String {
    let Some(source) = locate(&location.file).and_then(|path| fs::read_to_string(path).ok())
    else {
        return String::new();
    };
    let lines: Vec<&str> = source.lines().collect();

    let mut strings = Vec::new();
    let mut lineno = location.line as usize;
    while lineno > 1 {
        lineno -= 1;
        let Some(line) = lines.get(lineno - 1) else {
            break;
        };
        let line = line.trim_start();
        let Some(comment) = line.strip_prefix("///").or_else(|| line.strip_prefix("//")) else {
            break;
        };
        let comment = comment.strip_prefix(' ').unwrap_or(comment);
        strings.push(comment.trim_end());
    }
    strings.reverse();
    trim_docstring(&strings)
}

fn trim_docstring(strings: &[&str]) -> String {
    let body: Vec<&str> = strings
        .iter()
        .copied()
        .take_while(|s| !s.starts_with('#'))
        .collect();
    let start = body.iter().position(|s| !s.is_empty());
    let end = body.iter().rposition(|s| !s.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => body[start..=end].join("\n") + "\n",
        _ => String::new(),
    }
}
