//! Index builder (spec §2, §4.3, §4.6): ties the traversal pipeline
//! (C), filter chain (A) and header+body parser (B) together with a
//! [`Store`], behind the `Build`/`Update` operations named in
//! `spec.md` §1. `Tidy`, `Get` and `Execute` need no traversal step,
//! so they call straight through to the store (see [`crate::Atlas`]).

use crate::cancel::CancellationToken;
use crate::config::BuildOptions;
use crate::error::Result;
use crate::filter::{spec as filter_spec, Chain};
use crate::store::Store;
use crate::traversal::{self, Report};
use std::path::Path;
use std::sync::Arc;

fn build_chain(opts: &BuildOptions) -> Result<Arc<Chain>> {
    if opts.filter_specs.is_empty() {
        return Ok(Arc::new(Chain::default_chain()));
    }
    let mut filters = Vec::with_capacity(opts.filter_specs.len());
    for spec in &opts.filter_specs {
        filters.push(filter_spec::parse(spec)?);
    }
    Ok(Arc::new(Chain::new(filters)))
}

async fn traverse(root: &Path, opts: &BuildOptions, cancel: CancellationToken) -> Result<Report> {
    let chain = build_chain(opts)?;
    traversal::run(
        root,
        chain,
        opts.parse.clone(),
        opts.workers,
        opts.parse.ignore_hidden,
        cancel,
    )
    .await
}

/// One-shot transactional load (spec §4.6 "Build"): traverse `root`,
/// filter and parse every accepted file, then hand the successfully
/// parsed documents to [`Store::build`].
pub async fn build(
    store: &dyn Store,
    root: &Path,
    opts: &BuildOptions,
    cancel: CancellationToken,
) -> Result<Report> {
    let report = traverse(root, opts, cancel.clone()).await?;
    store.build(&report.documents, cancel).await?;
    Ok(report)
}

/// Diffing reload (spec §4.6 "Update"): same traversal as `build`,
/// but hands the resulting document set to [`Store::update`], which
/// deletes paths no longer present and upserts by `fileTime`.
pub async fn update(
    store: &dyn Store,
    root: &Path,
    opts: &BuildOptions,
    cancel: CancellationToken,
) -> Result<Report> {
    let report = traverse(root, opts, cancel.clone()).await?;
    store.update(&report.documents, cancel).await?;
    Ok(report)
}
