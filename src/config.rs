//! Configuration structs for the core operations. Unlike the
//! teacher's `ChasquiConfig`, these are not read implicitly by the
//! library — `spec.md`'s operations take options explicitly as
//! arguments; `from_env` is a convenience for the (out-of-scope) CLI
//! shell to build that argument with, following the shape of the
//! teacher's `ChasquiConfig::from_env`.

use std::num::NonZeroUsize;

/// Options controlling a single header+body parse (§4.2).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub parse_meta: bool,
    pub parse_links: bool,
    pub parse_headings: bool,
    pub ignore_date_error: bool,
    pub ignore_meta_error: bool,
    pub ignore_hidden: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parse_meta: true,
            parse_links: true,
            parse_headings: true,
            ignore_date_error: false,
            ignore_meta_error: false,
            ignore_hidden: true,
        }
    }
}

/// Options controlling a traversal + index build/update (§4.3, §4.6).
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub workers: NonZeroUsize,
    pub parse: ParseOptions,
    pub filter_specs: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            workers: NonZeroUsize::new(default_worker_count()).unwrap(),
            parse: ParseOptions::default(),
            filter_specs: Vec::new(),
        }
    }
}

impl BuildOptions {
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(val) = std::env::var("ATLAS_WORKERS") {
            if let Ok(n) = val.parse::<usize>() {
                if let Some(nz) = NonZeroUsize::new(n) {
                    opts.workers = nz;
                }
            }
        }
        opts
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Sort key accepted by the public query-execution surface (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Path,
    Title,
    Date,
    FileTime,
    Meta,
    Headings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Options controlling query compilation and execution (§4.4, §5).
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub optimize_level: usize,
    pub workers: NonZeroUsize,
    pub sort: Option<(SortKey, SortDirection)>,
    pub timeout: std::time::Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            optimize_level: 16,
            workers: NonZeroUsize::new(default_worker_count()).unwrap(),
            sort: None,
            timeout: std::time::Duration::from_millis(400),
        }
    }
}
