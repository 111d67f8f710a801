//! The persistence layer (spec §4.6, §6): a [`Store`] trait generic
//! over backend, following the teacher's `PageRepository` split
//! between the trait (here) and a concrete implementation
//! (`store::sqlite`). Unlike `PageRepository`, which keys everything
//! off `filename`/`identifier`, Atlas's store carries the richer
//! Build/Update/Tidy/Get/Execute surface spec.md's core operations
//! need. Every operation takes a [`CancellationToken`] (spec §5:
//! "every Store operation accepts a cancellation handle"), not just
//! the two bulk writers.

pub mod sqlite;

use crate::cancel::CancellationToken;
use crate::config::{SortDirection, SortKey};
use crate::domain::Document;
use crate::error::Result;
use crate::query::Artifact;
use async_trait::async_trait;

pub use sqlite::SqliteStore;

/// Backend-agnostic persistence surface for the four store-facing
/// core operations (spec §1: Build, Update, Tidy, Get) plus query
/// execution (Execute, §4.5–§4.6).
#[async_trait]
pub trait Store: Send + Sync {
    /// One-shot transactional load of a freshly traversed+parsed
    /// document set (spec §4.6 "Build"). Assumes an empty or
    /// soon-to-be-replaced index; does not diff against what is
    /// already there.
    async fn build(&self, docs: &[Document], cancel: CancellationToken) -> Result<()>;

    /// Diffs `docs` against what is already indexed: deletes paths no
    /// longer present, inserts new ones, and re-parses relations only
    /// for rows whose `fileTime` strictly advanced (spec §4.6
    /// "Update").
    async fn update(&self, docs: &[Document], cancel: CancellationToken) -> Result<()>;

    /// Deletes Authors/Tags with no surviving reference and reclaims
    /// space (spec §4.6 "Tidy").
    async fn tidy(&self, cancel: CancellationToken) -> Result<()>;

    /// Materializes the single document at `path`, erroring
    /// [`crate::error::Error::NotFound`] if none is indexed there
    /// (spec §4.6 "Get").
    async fn get(&self, path: &str, cancel: CancellationToken) -> Result<Document>;

    /// Runs a compiled [`Artifact`] against the index and hydrates
    /// every matching row into a [`Document`], de-duplicated by
    /// document id and ordered per `sort` if given (spec §4.5, §4.6
    /// "Execute").
    async fn execute(
        &self,
        artifact: &Artifact,
        sort: Option<(SortKey, SortDirection)>,
        cancel: CancellationToken,
    ) -> Result<Vec<Document>>;
}
