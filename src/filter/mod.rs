//! Filter chain (spec §4.1): accept/reject candidate files by path,
//! size and content. Each filter rewinds the reader to offset 0 after
//! it runs, so the next filter (and the parser that follows the
//! chain) sees the whole file again.

pub mod filters;
pub mod spec;
pub mod yaml_header;

use std::io::{Read, Seek};
use std::path::Path;

pub use filters::{
    Extension, IncludeFilename, IncludeRegex, ExcludeFilename, ExcludeParent, ExcludeRegex,
    MaxSize, YamlHeader,
};

/// Everything a [`Filter`] needs to know about a candidate path
/// besides its content.
#[derive(Debug, Clone)]
pub struct PathInfo {
    pub path: std::path::PathBuf,
    pub size: u64,
}

impl PathInfo {
    pub fn new(path: impl Into<std::path::PathBuf>, size: u64) -> Self {
        Self { path: path.into(), size }
    }
}

/// A named predicate over a candidate file (spec §4.1).
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    fn accept(&self, info: &PathInfo, reader: &mut (dyn ReadSeek)) -> std::io::Result<bool>;
}

/// Object-safe `Read + Seek`, so `Filter::accept` can take a trait
/// object (files, or in-memory buffers in tests).
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// An ordered chain of filters; a file is accepted iff every filter
/// accepts (spec §4.1).
pub struct Chain {
    filters: Vec<Box<dyn Filter>>,
}

impl Chain {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// The default chain used by `index::build`/`index::update`
    /// (spec §4.1): `Extension(".md")`, `MaxSize(200 KiB)`,
    /// `ExcludeParent("templates")`, `YamlHeader`.
    pub fn default_chain() -> Self {
        Self::new(vec![
            Box::new(Extension::new(".md")),
            Box::new(MaxSize::new(200 * 1024)),
            Box::new(ExcludeParent::new("templates")),
            Box::new(YamlHeader),
        ])
    }

    pub fn accepts(&self, info: &PathInfo, reader: &mut (dyn ReadSeek)) -> std::io::Result<bool> {
        for filter in &self.filters {
            let ok = filter.accept(info, reader)?;
            reader.seek(std::io::SeekFrom::Start(0))?;
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Convenience for callers holding only a `Path`: opens the file
    /// and runs the chain against it.
    pub fn accepts_path(&self, path: &Path) -> std::io::Result<bool> {
        let metadata = std::fs::metadata(path)?;
        let info = PathInfo::new(path, metadata.len());
        let mut file = std::fs::File::open(path)?;
        self.accepts(&info, &mut file)
    }
}
