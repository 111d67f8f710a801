//! Built-in filters (spec §4.1), all parameterized at construction.

use super::{Filter, PathInfo, ReadSeek};
use regex::Regex;
use std::collections::HashSet;

pub struct Extension {
    suffix: String,
}

impl Extension {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }
}

impl Filter for Extension {
    fn name(&self) -> &'static str {
        "Extension"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        Ok(info.path.to_string_lossy().ends_with(&self.suffix))
    }
}

pub struct MaxSize {
    bytes: u64,
}

impl MaxSize {
    pub fn new(bytes: u64) -> Self {
        Self { bytes }
    }
}

impl Filter for MaxSize {
    fn name(&self) -> &'static str {
        "MaxSize"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        Ok(info.size <= self.bytes)
    }
}

pub struct ExcludeFilename {
    names: HashSet<String>,
}

impl ExcludeFilename {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self { names: names.into_iter().collect() }
    }
}

impl Filter for ExcludeFilename {
    fn name(&self) -> &'static str {
        "ExcludeFilename"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        let basename = info.path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        Ok(!self.names.contains(basename))
    }
}

pub struct IncludeFilename {
    names: HashSet<String>,
}

impl IncludeFilename {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self { names: names.into_iter().collect() }
    }
}

impl Filter for IncludeFilename {
    fn name(&self) -> &'static str {
        "IncludeFilename"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        let basename = info.path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        Ok(self.names.contains(basename))
    }
}

pub struct ExcludeParent {
    dir: String,
}

impl ExcludeParent {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Filter for ExcludeParent {
    fn name(&self) -> &'static str {
        "ExcludeParent"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        let excluded = info
            .path
            .components()
            .any(|c| c.as_os_str().to_str() == Some(self.dir.as_str()));
        Ok(!excluded)
    }
}

pub struct IncludeRegex {
    pattern: Regex,
}

impl IncludeRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(pattern)? })
    }
}

impl Filter for IncludeRegex {
    fn name(&self) -> &'static str {
        "IncludeRegex"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        Ok(self.pattern.is_match(&info.path.to_string_lossy()))
    }
}

pub struct ExcludeRegex {
    pattern: Regex,
}

impl ExcludeRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(pattern)? })
    }
}

impl Filter for ExcludeRegex {
    fn name(&self) -> &'static str {
        "ExcludeRegex"
    }

    fn accept(&self, info: &PathInfo, _reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        Ok(!self.pattern.is_match(&info.path.to_string_lossy()))
    }
}

/// The body starts with `---\n` and a later `\n---\n` line appears
/// before EOF (spec §4.1). The terminator offset found by the scan is
/// discarded here — `Filter::accept` only reports acceptance; `parse`
/// re-runs the same scan to locate the header for real.
pub struct YamlHeader;

impl Filter for YamlHeader {
    fn name(&self) -> &'static str {
        "YamlHeader"
    }

    fn accept(&self, _info: &PathInfo, reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
        Ok(super::yaml_header::scan(reader)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn info(path: &str, size: u64) -> PathInfo {
        PathInfo::new(path, size)
    }

    #[test]
    fn extension_matches_suffix() {
        let f = Extension::new(".md");
        let mut r = Cursor::new(b"" as &[u8]);
        assert!(f.accept(&info("notes/a.md", 0), &mut r).unwrap());
        assert!(!f.accept(&info("notes/a.txt", 0), &mut r).unwrap());
    }

    #[test]
    fn max_size_rejects_large_files() {
        let f = MaxSize::new(10);
        let mut r = Cursor::new(b"" as &[u8]);
        assert!(f.accept(&info("a.md", 10), &mut r).unwrap());
        assert!(!f.accept(&info("a.md", 11), &mut r).unwrap());
    }

    #[test]
    fn exclude_parent_matches_any_component() {
        let f = ExcludeParent::new("templates");
        let mut r = Cursor::new(b"" as &[u8]);
        assert!(!f.accept(&info("notes/templates/a.md", 0), &mut r).unwrap());
        assert!(f.accept(&info("notes/archive/a.md", 0), &mut r).unwrap());
    }
}
