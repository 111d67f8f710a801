//! SQLite-backed [`Store`] (spec §4.6, §6), grounded on the teacher's
//! `SqliteRepository`: a pool wrapped in a struct, `sqlx::query_as`
//! for typed reads, `sqlx::query!`/`sqlx::query` writes wrapped in a
//! transaction. Execute's WHERE body is assembled at runtime by the
//! compiler (its argument count varies per query), so it binds through
//! plain `sqlx::query` rather than the `query!` macro the teacher uses
//! for its fixed-shape writes.

use crate::cancel::CancellationToken;
use crate::config::{SortDirection, SortKey};
use crate::domain::Document;
use crate::error::{Error, Result};
use crate::query::Artifact;
use crate::store::Store;
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};
use std::str::FromStr;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `database_url`,
    /// registers the `REGEXP` function the compiler's `RE` operator
    /// compiles to, and runs pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(|conn, _meta| Box::pin(register_regexp(conn)))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// The `sqlite3_create_function_v2` callback backing SQL `REGEXP`.
/// SQLite recognizes `a REGEXP b` as sugar for `regexp(b, a)`; it has
/// no built-in implementation and raises "no such function: regexp"
/// unless one is registered, which sqlx's safe API has no hook for —
/// hence the direct `libsqlite3-sys` call in [`register_regexp`].
unsafe extern "C" fn regexp_call(
    ctx: *mut libsqlite3_sys::sqlite3_context,
    argc: c_int,
    argv: *mut *mut libsqlite3_sys::sqlite3_value,
) {
    if argc != 2 {
        libsqlite3_sys::sqlite3_result_int(ctx, 0);
        return;
    }
    let pattern_ptr = libsqlite3_sys::sqlite3_value_text(*argv);
    let text_ptr = libsqlite3_sys::sqlite3_value_text(*argv.add(1));
    if pattern_ptr.is_null() || text_ptr.is_null() {
        libsqlite3_sys::sqlite3_result_int(ctx, 0);
        return;
    }
    let pattern = CStr::from_ptr(pattern_ptr as *const i8).to_string_lossy();
    let text = CStr::from_ptr(text_ptr as *const i8).to_string_lossy();
    let matched = regex::Regex::new(&pattern).map(|re| re.is_match(&text)).unwrap_or(false);
    libsqlite3_sys::sqlite3_result_int(ctx, matched as c_int);
}

/// Registers `regexp(pattern, text)` on a freshly opened connection
/// via the raw handle `sqlx::sqlite::SqliteConnection` exposes for
/// exactly this gap (see [`regexp_call`]).
async fn register_regexp(conn: &mut sqlx::sqlite::SqliteConnection) -> std::result::Result<(), sqlx::Error> {
    let mut handle = conn.lock_handle().await?;
    let raw = handle.as_raw_handle().as_ptr();
    let name = CString::new("regexp").expect("no interior NUL");
    let rc = unsafe {
        libsqlite3_sys::sqlite3_create_function_v2(
            raw,
            name.as_ptr(),
            2,
            libsqlite3_sys::SQLITE_UTF8 | libsqlite3_sys::SQLITE_DETERMINISTIC,
            std::ptr::null_mut::<c_void>(),
            Some(regexp_call),
            None,
            None,
            None,
        )
    };
    if rc != libsqlite3_sys::SQLITE_OK {
        return Err(sqlx::Error::Configuration(format!("sqlite3_create_function_v2(regexp) failed: rc {rc}").into()));
    }
    Ok(())
}

fn to_unix(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

fn from_unix(ts: i64) -> NaiveDateTime {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default().naive_utc()
}

fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Path => "path",
        SortKey::Title => "title",
        SortKey::Date => "date",
        SortKey::FileTime => "fileTime",
        SortKey::Meta => "meta",
        SortKey::Headings => "headings",
    }
}

fn sort_direction_sql(dir: SortDirection) -> &'static str {
    match dir {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    }
}

/// Resolves `name` to an existing Author or Alias row, inserting a new
/// Author if neither matches (spec §6 invariant `Authors.name ∩
/// Aliases.alias = ∅`: a name already present as either is never
/// re-inserted).
async fn resolve_or_insert_author(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64> {
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT id FROM Authors WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?
    {
        return Ok(id);
    }
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT authorId FROM Aliases WHERE alias = ?")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?
    {
        return Ok(id);
    }
    let inserted = sqlx::query("INSERT INTO Authors (name) VALUES (?)")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    Ok(inserted.last_insert_rowid())
}

/// Inserts the tag/link/author relations for a document already
/// present in `Documents` as `doc_id`. Shared by `build` and the
/// modified-row path of `update`.
async fn insert_relations(tx: &mut Transaction<'_, Sqlite>, doc_id: i64, doc: &Document) -> Result<()> {
    for tag in &doc.tags {
        sqlx::query("INSERT OR IGNORE INTO Tags (name) VALUES (?)")
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        let tag_id: i64 = sqlx::query_scalar("SELECT id FROM Tags WHERE name = ?")
            .bind(tag)
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO DocumentTags (docId, tagId) VALUES (?, ?)")
            .bind(doc_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }

    for link in &doc.links {
        sqlx::query("INSERT OR IGNORE INTO Links (docId, link) VALUES (?, ?)")
            .bind(doc_id)
            .bind(link)
            .execute(&mut *tx)
            .await?;
    }

    for author in &doc.authors {
        let author_id = resolve_or_insert_author(tx, author).await?;
        sqlx::query("INSERT INTO DocumentAuthors (docId, authorId) VALUES (?, ?)")
            .bind(doc_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?;
    }

    Ok(())
}

async fn insert_document(tx: &mut Transaction<'_, Sqlite>, doc: &Document) -> Result<i64> {
    let inserted = sqlx::query(
        "INSERT INTO Documents (path, title, date, fileTime, headings, meta) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&doc.path)
    .bind(&doc.title)
    .bind(doc.date.map(to_unix))
    .bind(to_unix(doc.file_time))
    .bind(&doc.headings)
    .bind(&doc.other_meta)
    .execute(&mut *tx)
    .await?;
    Ok(inserted.last_insert_rowid())
}

/// Records the most recent bulk write in `Info`, upserting the single
/// `lastUpdate` row (spec §6: `Info` carries the last operation kind
/// and its timestamp).
async fn record_update(tx: &mut Transaction<'_, Sqlite>, kind: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO Info (key, value, updated) VALUES ('lastUpdate', ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated = excluded.updated",
    )
    .bind(kind)
    .bind(Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;
    Ok(())
}

/// Fetches the tag/author/link relations for `doc_id` and assembles a
/// [`Document`] from them plus the scalar columns already read off
/// `row` (shared by `get` and `execute`, whose base queries differ but
/// whose relation fetches are identical).
async fn hydrate(pool: &SqlitePool, doc_id: i64, path: &str, row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    let title: String = row.try_get("title")?;
    let date: Option<i64> = row.try_get("date")?;
    let file_time: i64 = row.try_get("fileTime")?;
    let headings: String = row.try_get("headings")?;
    let meta: String = row.try_get("meta")?;

    let tags: Vec<String> = sqlx::query_scalar(
        "SELECT t.name FROM DocumentTags dt JOIN Tags t ON t.id = dt.tagId WHERE dt.docId = ?",
    )
    .bind(doc_id)
    .fetch_all(pool)
    .await?;

    let authors: Vec<String> = sqlx::query_scalar(
        "SELECT an.authorName FROM DocumentAuthors da \
         JOIN AuthorNames an ON an.authorId = da.authorId WHERE da.docId = ?",
    )
    .bind(doc_id)
    .fetch_all(pool)
    .await?;

    let links: Vec<String> = sqlx::query_scalar("SELECT link FROM Links WHERE docId = ?")
        .bind(doc_id)
        .fetch_all(pool)
        .await?;

    Ok(Document {
        path: path.to_string(),
        title,
        date: date.map(from_unix),
        file_time: from_unix(file_time),
        authors,
        tags,
        links,
        headings,
        other_meta: meta,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn build(&self, docs: &[Document], cancel: CancellationToken) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for doc in docs {
            if cancel.is_cancelled() {
                tx.rollback().await.ok();
                return Err(Error::Cancelled);
            }
            let doc_id = insert_document(&mut tx, doc).await?;
            insert_relations(&mut tx, doc_id, doc).await?;
        }

        record_update(&mut tx, "multiPut").await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, docs: &[Document], cancel: CancellationToken) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "CREATE TEMP TABLE ScratchDocuments ( \
                path TEXT PRIMARY KEY, title TEXT NOT NULL, date INTEGER, \
                fileTime INTEGER NOT NULL, headings TEXT NOT NULL, meta TEXT NOT NULL \
            )",
        )
        .execute(&mut *tx)
        .await?;

        for doc in docs {
            if cancel.is_cancelled() {
                tx.rollback().await.ok();
                return Err(Error::Cancelled);
            }
            sqlx::query(
                "INSERT INTO ScratchDocuments (path, title, date, fileTime, headings, meta) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&doc.path)
            .bind(&doc.title)
            .bind(doc.date.map(to_unix))
            .bind(to_unix(doc.file_time))
            .bind(&doc.headings)
            .bind(&doc.other_meta)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM Documents WHERE path NOT IN (SELECT path FROM ScratchDocuments)")
            .execute(&mut *tx)
            .await?;

        let by_path: HashMap<&str, &Document> = docs.iter().map(|d| (d.path.as_str(), d)).collect();

        let scratch_rows = sqlx::query("SELECT path, title, date, fileTime, headings, meta FROM ScratchDocuments")
            .fetch_all(&mut *tx)
            .await?;

        let mut modified: HashSet<i64> = HashSet::new();
        for row in scratch_rows {
            if cancel.is_cancelled() {
                tx.rollback().await.ok();
                return Err(Error::Cancelled);
            }

            let path: String = row.try_get("path")?;
            let title: String = row.try_get("title")?;
            let date: Option<i64> = row.try_get("date")?;
            let new_file_time: i64 = row.try_get("fileTime")?;
            let headings: String = row.try_get("headings")?;
            let meta: String = row.try_get("meta")?;

            let existing: Option<(i64, i64)> =
                sqlx::query_as("SELECT id, fileTime FROM Documents WHERE path = ?")
                    .bind(&path)
                    .fetch_optional(&mut *tx)
                    .await?;

            let doc_id = match existing {
                None => {
                    let inserted = sqlx::query(
                        "INSERT INTO Documents (path, title, date, fileTime, headings, meta) \
                         VALUES (?, ?, ?, ?, ?, ?)",
                    )
                    .bind(&path)
                    .bind(&title)
                    .bind(date)
                    .bind(new_file_time)
                    .bind(&headings)
                    .bind(&meta)
                    .execute(&mut *tx)
                    .await?;
                    let id = inserted.last_insert_rowid();
                    modified.insert(id);
                    id
                }
                Some((id, old_file_time)) if new_file_time > old_file_time => {
                    sqlx::query(
                        "UPDATE Documents SET title = ?, date = ?, fileTime = ?, headings = ?, meta = ? \
                         WHERE id = ?",
                    )
                    .bind(&title)
                    .bind(date)
                    .bind(new_file_time)
                    .bind(&headings)
                    .bind(&meta)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                    modified.insert(id);
                    id
                }
                Some((id, _)) => id,
            };

            if modified.contains(&doc_id) {
                sqlx::query("DELETE FROM DocumentTags WHERE docId = ?")
                    .bind(doc_id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM Links WHERE docId = ?")
                    .bind(doc_id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM DocumentAuthors WHERE docId = ?")
                    .bind(doc_id)
                    .execute(&mut *tx)
                    .await?;

                if let Some(doc) = by_path.get(path.as_str()) {
                    insert_relations(&mut tx, doc_id, doc).await?;
                }
            }
        }

        sqlx::query("DROP TABLE ScratchDocuments").execute(&mut *tx).await?;
        record_update(&mut tx, "multiUpdate").await?;
        tx.commit().await?;
        Ok(())
    }

    async fn tidy(&self, cancel: CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM Authors WHERE id NOT IN (SELECT DISTINCT authorId FROM DocumentAuthors)")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM Tags WHERE id NOT IN (SELECT DISTINCT tagId FROM DocumentTags)")
            .execute(&mut *tx)
            .await?;

        if cancel.is_cancelled() {
            tx.rollback().await.ok();
            return Err(Error::Cancelled);
        }
        tx.commit().await?;

        // VACUUM cannot run inside a transaction.
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, path: &str, cancel: CancellationToken) -> Result<Document> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let row = sqlx::query("SELECT id, title, date, fileTime, headings, meta FROM Documents WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound { path: path.to_string() })?;

        let doc_id: i64 = row.try_get("id")?;
        hydrate(&self.pool, doc_id, path, &row).await
    }

    async fn execute(
        &self,
        artifact: &Artifact,
        sort: Option<(SortKey, SortDirection)>,
        cancel: CancellationToken,
    ) -> Result<Vec<Document>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut sql = format!(
            "SELECT DISTINCT docId, path, title, date, fileTime, headings, meta FROM Search WHERE {}",
            artifact.where_body
        );
        if let Some((key, dir)) = sort {
            sql.push_str(&format!(" ORDER BY {} {}", sort_column(key), sort_direction_sql(dir)));
        }

        let mut query = sqlx::query(&sql);
        for arg in &artifact.args {
            query = query.bind(arg);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut seen = HashSet::new();
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let doc_id: i64 = row.try_get("docId")?;
            if !seen.insert(doc_id) {
                continue;
            }
            let path: String = row.try_get("path")?;
            documents.push(hydrate(&self.pool, doc_id, &path, &row).await?);
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;

    async fn open() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        register_regexp(&mut *pool.acquire().await.unwrap()).await.unwrap();
        SqliteStore::new(pool)
    }

    fn doc(path: &str, title: &str, tags: &[&str]) -> Document {
        Document {
            path: path.to_string(),
            title: title.to_string(),
            date: None,
            file_time: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            authors: vec!["Alan Turing".to_string()],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            links: Vec::new(),
            headings: String::new(),
            other_meta: String::new(),
        }
    }

    #[tokio::test]
    async fn build_then_get_round_trips() {
        let store = open().await;
        let d = doc("a.md", "Hello", &["rust"]);
        store.build(&[d.clone()], CancellationToken::new()).await.unwrap();

        let got = store.get("a.md", CancellationToken::new()).await.unwrap();
        assert!(got.equivalent(&d));
    }

    #[tokio::test]
    async fn get_missing_path_is_not_found() {
        let store = open().await;
        assert!(matches!(store.get("missing.md", CancellationToken::new()).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn shared_alias_name_does_not_duplicate_author_row() {
        let store = open().await;
        let a = doc("a.md", "A", &[]);
        let b = doc("b.md", "B", &[]);
        store.build(&[a, b], CancellationToken::new()).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Authors WHERE name = 'Alan Turing'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    /// Spec §6 invariant `Authors.name ∩ Aliases.alias = ∅`: a document
    /// whose author is only known as an *alias* of an existing author
    /// must resolve to that author's row, not insert a second one.
    #[tokio::test]
    async fn alias_resolves_to_existing_author_without_duplicate_row() {
        let store = open().await;
        let a = doc("a.md", "A", &[]);
        store.build(&[a], CancellationToken::new()).await.unwrap();

        let author_id: i64 = sqlx::query_scalar("SELECT id FROM Authors WHERE name = 'Alan Turing'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO Aliases (alias, authorId) VALUES (?, ?)")
            .bind("A. M. Turing")
            .bind(author_id)
            .execute(&store.pool)
            .await
            .unwrap();

        let mut b = doc("b.md", "B", &[]);
        b.authors = vec!["A. M. Turing".to_string()];
        store.build(&[b], CancellationToken::new()).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Authors WHERE name = 'Alan Turing'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let linked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM DocumentAuthors WHERE authorId = ?")
            .bind(author_id)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(linked, 2);
    }

    #[tokio::test]
    async fn update_drops_removed_paths_and_keeps_unmodified_rows() {
        let store = open().await;
        let a = doc("a.md", "A", &["x"]);
        let b = doc("b.md", "B", &["y"]);
        store.build(&[a.clone(), b], CancellationToken::new()).await.unwrap();

        store.update(&[a.clone()], CancellationToken::new()).await.unwrap();

        assert!(store.get("a.md", CancellationToken::new()).await.is_ok());
        assert!(matches!(store.get("b.md", CancellationToken::new()).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_skips_rows_whose_file_time_did_not_advance() {
        let store = open().await;
        let mut a = doc("a.md", "Original", &[]);
        store.build(&[a.clone()], CancellationToken::new()).await.unwrap();

        a.title = "Stale rewrite".to_string();
        store.update(&[a], CancellationToken::new()).await.unwrap();

        assert_eq!(store.get("a.md", CancellationToken::new()).await.unwrap().title, "Original");
    }

    /// Spec §8: re-running `Update` with an unchanged document set is a
    /// no-op — no row churn in `Documents` or its relations.
    #[tokio::test]
    async fn update_twice_with_unchanged_documents_is_idempotent() {
        let store = open().await;
        let a = doc("a.md", "A", &["x", "y"]);
        let b = doc("b.md", "B", &["y"]);
        store.build(&[a.clone(), b.clone()], CancellationToken::new()).await.unwrap();
        store.update(&[a.clone(), b.clone()], CancellationToken::new()).await.unwrap();

        let before_doc_id: i64 = sqlx::query_scalar("SELECT id FROM Documents WHERE path = 'a.md'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let counts_before = relation_counts(&store.pool).await;

        store.update(&[a, b], CancellationToken::new()).await.unwrap();

        let after_doc_id: i64 = sqlx::query_scalar("SELECT id FROM Documents WHERE path = 'a.md'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let counts_after = relation_counts(&store.pool).await;

        assert_eq!(before_doc_id, after_doc_id);
        assert_eq!(counts_before, counts_after);
    }

    /// `(documents, tags, links, documentTags, documentAuthors)` row
    /// counts, used to assert no churn across a repeated `Update`.
    async fn relation_counts(pool: &SqlitePool) -> (i64, i64, i64, i64, i64) {
        let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Documents").fetch_one(pool).await.unwrap();
        let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Tags").fetch_one(pool).await.unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Links").fetch_one(pool).await.unwrap();
        let doc_tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM DocumentTags").fetch_one(pool).await.unwrap();
        let doc_authors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM DocumentAuthors").fetch_one(pool).await.unwrap();
        (documents, tags, links, doc_tags, doc_authors)
    }

    #[tokio::test]
    async fn tidy_removes_orphaned_tags_and_authors() {
        let store = open().await;
        let a = doc("a.md", "A", &["solo-tag"]);
        store.build(&[a], CancellationToken::new()).await.unwrap();
        store.update(&[], CancellationToken::new()).await.unwrap();
        store.tidy(CancellationToken::new()).await.unwrap();

        let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Tags").fetch_one(&store.pool).await.unwrap();
        let authors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Authors").fetch_one(&store.pool).await.unwrap();
        assert_eq!(tags, 0);
        assert_eq!(authors, 0);
    }

    #[tokio::test]
    async fn execute_runs_a_compiled_artifact() {
        let store = open().await;
        store
            .build(
                &[doc("a.md", "A", &["rust"]), doc("b.md", "B", &["go"])],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let artifact = query::compile("t=rust", 16, 1).unwrap();
        let results = store.execute(&artifact, None, CancellationToken::new()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "a.md");
    }

    #[tokio::test]
    async fn execute_sorts_by_requested_key() {
        let store = open().await;
        store
            .build(
                &[doc("b.md", "B", &[]), doc("a.md", "A", &[])],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let artifact = query::compile("p~.", 16, 1).unwrap();
        let results = store
            .execute(&artifact, Some((SortKey::Path, SortDirection::Ascending)), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.iter().map(|d| d.path.as_str()).collect::<Vec<_>>(), vec!["a.md", "b.md"]);
    }
}
