//! Traversal pipeline (spec §4.3): walks the root with a fixed
//! worker pool draining a bounded queue with backpressure, feeds
//! accepted files through the filter chain and then the header+body
//! parser. Parser errors are tallied, not fatal.
//!
//! The queue is one bounded `tokio::mpsc` channel carrying a tagged
//! [`Work`] item rather than two separate channels with a fixed
//! visit/filter split — the dispatcher for a directory entry and the
//! dispatcher for a file entry share the same backpressure and the
//! same shared outstanding-work counter either way, and a single
//! queue keeps the worker loop (and the "are we done yet" check)
//! in one place.

use crate::cancel::CancellationToken;
use crate::config::ParseOptions;
use crate::domain::Document;
use crate::error::{Error, Result};
use crate::filter::{Chain, PathInfo};
use crate::parser;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};

enum Work {
    Visit(PathBuf),
    Process(PathBuf, u64),
}

#[derive(Debug, Default)]
pub struct Report {
    pub documents: Vec<Document>,
    pub parse_errors: usize,
    pub skipped: usize,
}

struct Shared {
    outstanding: AtomicUsize,
    done: Notify,
    results: Mutex<Report>,
}

impl Shared {
    /// Accounts for `follow_ups` new queue items produced while
    /// handling one item, then retires that item. Notifies once the
    /// outstanding count reaches zero — the whole tree (directories
    /// and their files) has then been visited, filtered and parsed.
    fn retire(&self, follow_ups: usize) {
        if follow_ups > 0 {
            self.outstanding.fetch_add(follow_ups, Ordering::SeqCst);
        }
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.done.notify_waiters();
        }
    }
}

/// Walks `root`, applies `chain`, and parses every accepted file with
/// `parse_opts`, using a fixed pool of `workers` tasks reading from a
/// channel buffered to roughly `workers` entries. Rejects `workers <
/// 2` (spec §8: "Traversal tolerates workers ≥ 2").
pub async fn run(
    root: &Path,
    chain: Arc<Chain>,
    parse_opts: ParseOptions,
    workers: std::num::NonZeroUsize,
    ignore_hidden: bool,
    cancel: CancellationToken,
) -> Result<Report> {
    if workers.get() < 2 {
        return Err(Error::Config {
            reason: format!("traversal requires at least 2 workers, got {}", workers.get()),
        });
    }

    let (tx, rx) = mpsc::channel::<Work>(workers.get() * 4);
    let rx = Arc::new(Mutex::new(rx));
    let shared = Arc::new(Shared {
        outstanding: AtomicUsize::new(1),
        done: Notify::new(),
        results: Mutex::new(Report::default()),
    });

    let mut handles = Vec::with_capacity(workers.get());
    for _ in 0..workers.get() {
        let rx = rx.clone();
        let tx = tx.clone();
        let shared = shared.clone();
        let chain = chain.clone();
        let parse_opts = parse_opts.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let item = {
                    let mut guard = rx.lock().await;
                    guard.recv().await
                };
                let Some(work) = item else { break };

                if cancel.is_cancelled() {
                    shared.retire(0);
                    continue;
                }

                match work {
                    Work::Visit(path) => handle_visit(&path, ignore_hidden, &tx, &shared).await,
                    Work::Process(path, size) => {
                        handle_process(&path, size, &chain, &parse_opts, &shared).await
                    }
                }
            }
        }));
    }

    // Registered before the first item is sent: `notify_waiters` wakes
    // only waiters already polling, and a worker can retire the root
    // item (dropping `outstanding` to zero) as soon as it's sent.
    let notified = shared.done.notified();
    tx.send(Work::Visit(root.to_path_buf())).await.ok();
    notified.await;

    for handle in handles {
        handle.abort();
    }

    Ok(Arc::try_unwrap(shared)
        .unwrap_or_else(|_| unreachable!("all workers retired before notify fired"))
        .results
        .into_inner())
}

async fn handle_visit(
    path: &Path,
    ignore_hidden: bool,
    tx: &mpsc::Sender<Work>,
    shared: &Shared,
) {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(_) => return shared.retire(0),
    };

    // Symlinks are followed transparently (spec §4.3) — re-stat
    // through the link to learn what it points at.
    let metadata = if metadata.is_symlink() {
        match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(_) => return shared.retire(0),
        }
    } else {
        metadata
    };

    if metadata.is_dir() {
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(e) => e,
            Err(_) => return shared.retire(0),
        };

        let mut children = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if ignore_hidden && name.to_string_lossy().starts_with('.') {
                continue;
            }
            children.push(entry.path());
        }

        for child in &children {
            tx.send(Work::Visit(child.clone())).await.ok();
        }
        shared.retire(children.len());
    } else if metadata.is_file() {
        tx.send(Work::Process(path.to_path_buf(), metadata.len())).await.ok();
        shared.retire(1);
    } else {
        // Devices, sockets and other irregular entries are dropped.
        shared.retire(0);
    }
}

async fn handle_process(
    path: &Path,
    size: u64,
    chain: &Chain,
    parse_opts: &ParseOptions,
    shared: &Shared,
) {
    let info = PathInfo::new(path, size);

    let accepted = match std::fs::File::open(path) {
        Ok(mut file) => chain.accepts(&info, &mut file).unwrap_or(false),
        Err(_) => false,
    };

    if !accepted {
        let mut results = shared.results.lock().await;
        results.skipped += 1;
        drop(results);
        return shared.retire(0);
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(_) => {
            let mut results = shared.results.lock().await;
            results.parse_errors += 1;
            drop(results);
            return shared.retire(0);
        }
    };

    let file_time = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(t) => DateTime::<Utc>::from(t).naive_utc(),
        Err(_) => Utc::now().naive_utc(),
    };

    let path_str = path.to_string_lossy().to_string();
    match parser::parse(&path_str, &content, file_time, parse_opts) {
        Ok(doc) => {
            let mut results = shared.results.lock().await;
            results.documents.push(doc);
        }
        Err(err) => {
            tracing::warn!(path = %path_str, error = %err, "skipping unparseable file");
            let mut results = shared.results.lock().await;
            results.parse_errors += 1;
        }
    }

    shared.retire(0);
}
