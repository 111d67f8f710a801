//! Atlas indexes a tree of plain-text notes carrying a structured
//! header (title, authors, date, tags, free-form metadata) and a body
//! that may contain inline links and section headings, and executes a
//! domain-specific boolean query language against that index
//! (`spec.md` §1).
//!
//! This crate is the CORE described there: a query pipeline (lexer →
//! parser → optimizer → backend compiler, `query`) and an index
//! builder (traversal → filter chain → parser → store, `index` +
//! `traversal` + `filter` + `parser` + `store`), joined by the shared
//! document model (`domain`). [`Atlas`] is the façade exposing the
//! six core operations named in `spec.md` §1: `Build`, `Update`,
//! `Tidy`, `Get`, `Execute`, `Compile`. The CLI, REPL, HTTP/datagram
//! servers and output formatting are deliberately out of scope
//! (`spec.md` §1 Non-goals); the `atlas` binary in `main.rs` is a
//! thin, unpolished shell over this library, kept only so the core is
//! exercisable from a terminal.

pub mod cancel;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod filter;
mod index;
pub mod parser;
pub mod query;
pub mod store;
pub mod traversal;

use cancel::CancellationToken;
use config::{BuildOptions, QueryOptions};
use domain::Document;
use error::{Error, Result};
use query::Artifact;
use std::path::Path;
use std::sync::Arc;
use store::{SqliteStore, Store};

/// Façade over the six core operations (`spec.md` §1). Holds a
/// `dyn Store` so callers can substitute a fake store in tests
/// without pulling SQLite into the dependency, the same shape the
/// teacher's handlers take a `dyn PageRepository`.
pub struct Atlas {
    store: Arc<dyn Store>,
}

impl Atlas {
    /// Opens (creating if missing) the SQLite-backed store at
    /// `database_url` and runs pending migrations.
    pub async fn open(database_url: &str) -> Result<Self> {
        let store = SqliteStore::connect(database_url).await?;
        Ok(Self { store: Arc::new(store) })
    }

    /// Wraps an already-constructed [`Store`] (e.g. for tests against
    /// an in-memory pool, or a non-SQLite backend).
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// `Build(root, opts)`: one-shot index load (`spec.md` §4.6).
    pub async fn build(
        &self,
        root: &Path,
        opts: &BuildOptions,
        cancel: CancellationToken,
    ) -> Result<traversal::Report> {
        index::build(self.store.as_ref(), root, opts, cancel).await
    }

    /// `Update(root, opts)`: re-traverses `root` and diffs against the
    /// index, deleting paths no longer present (`spec.md` §4.6).
    pub async fn update(
        &self,
        root: &Path,
        opts: &BuildOptions,
        cancel: CancellationToken,
    ) -> Result<traversal::Report> {
        index::update(self.store.as_ref(), root, opts, cancel).await
    }

    /// `Tidy()`: garbage-collects unreferenced authors/tags and
    /// compacts storage (`spec.md` §4.6).
    pub async fn tidy(&self, cancel: CancellationToken) -> Result<()> {
        self.store.tidy(cancel).await
    }

    /// `Get(path)`: materializes the single document at `path`.
    pub async fn get(&self, path: &str, cancel: CancellationToken) -> Result<Document> {
        self.store.get(path, cancel).await
    }

    /// `Compile(queryText, optLevel, workers) -> Artifact`: runs the
    /// full text-to-artifact pipeline (lexer → parser → optimizer →
    /// backend compiler, `spec.md` §4.4–§4.5).
    pub fn compile(query_text: &str, opts: &QueryOptions) -> Result<Artifact> {
        query::compile(query_text, opts.optimize_level, opts.workers.get())
    }

    /// `Execute(artifact) -> [Document]`: runs a compiled artifact
    /// against the index, applying the default 400 ms timeout
    /// (`spec.md` §5) unless overridden in `opts`.
    pub async fn execute(
        &self,
        artifact: &Artifact,
        opts: &QueryOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<Document>> {
        match tokio::time::timeout(opts.timeout, self.store.execute(artifact, opts.sort, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Convenience composing [`Atlas::compile`] and [`Atlas::execute`]
    /// for the common case of running query text straight through.
    pub async fn query(
        &self,
        query_text: &str,
        opts: &QueryOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<Document>> {
        let artifact = Self::compile(query_text, opts)?;
        self.execute(&artifact, opts, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use std::io::Write;

    async fn open_memory() -> Atlas {
        let store = store::SqliteStore::connect("sqlite::memory:").await.unwrap();
        Atlas::with_store(Arc::new(store))
    }

    fn write_note(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    fn build_opts() -> BuildOptions {
        BuildOptions {
            workers: std::num::NonZeroUsize::new(2).unwrap(),
            parse: ParseOptions::default(),
            filter_specs: Vec::new(),
        }
    }

    /// Spec §8 scenario 1: a single file builds and round-trips
    /// through `Get`.
    #[tokio::test]
    async fn single_file_builds_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a_file.md", "---\ntitle: A title\n---\nbody");

        let atlas = open_memory().await;
        let report = atlas.build(dir.path(), &build_opts(), CancellationToken::new()).await.unwrap();
        assert_eq!(report.documents.len(), 1);

        let got = atlas.get(report.documents[0].path.as_str(), CancellationToken::new()).await.unwrap();
        assert_eq!(got.title, "A title");
    }

    /// Spec §8 scenario 3: set-category tag queries.
    #[tokio::test]
    async fn tags_query_matches_set_membership() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "d1.md", "---\ntitle: D1\ntags: [a, b]\n---\nbody");
        write_note(dir.path(), "d2.md", "---\ntitle: D2\ntags: [b, c]\n---\nbody");

        let atlas = open_memory().await;
        atlas.build(dir.path(), &build_opts(), CancellationToken::new()).await.unwrap();

        let opts = QueryOptions::default();
        assert_eq!(atlas.query("t=a or t=c", &opts, CancellationToken::new()).await.unwrap().len(), 2);
        assert_eq!(atlas.query("t=a and t=c", &opts, CancellationToken::new()).await.unwrap().len(), 0);
        assert_eq!(atlas.query("t=b", &opts, CancellationToken::new()).await.unwrap().len(), 2);
    }

    /// Spec §8 scenario 6: update-by-absence deletes documents no
    /// longer present in the traversed tree.
    #[tokio::test]
    async fn update_deletes_documents_absent_from_new_traversal() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a.md", "---\ntitle: A\n---\nbody");
        write_note(dir.path(), "b.md", "---\ntitle: B\n---\nbody");

        let atlas = open_memory().await;
        atlas.build(dir.path(), &build_opts(), CancellationToken::new()).await.unwrap();

        std::fs::remove_file(dir.path().join("b.md")).unwrap();
        atlas.update(dir.path(), &build_opts(), CancellationToken::new()).await.unwrap();

        let b_path = dir.path().join("b.md").to_string_lossy().to_string();
        assert!(atlas.get(&b_path, CancellationToken::new()).await.is_err());
        atlas.tidy(CancellationToken::new()).await.unwrap();
    }
}
