use chrono::NaiveDateTime;

/// The primary entity (spec §3). `path` is the globally unique key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: String,
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub file_time: NaiveDateTime,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub headings: String,
    pub other_meta: String,
}

impl Document {
    /// Equality up to tag/link set and author list, per the §8
    /// round-trip invariant (`Build(docs); Get(doc.path) ≡ doc`).
    pub fn equivalent(&self, other: &Document) -> bool {
        use std::collections::HashSet;

        self.path == other.path
            && self.title == other.title
            && self.date == other.date
            && self.file_time == other.file_time
            && self.headings == other.headings
            && self.other_meta == other.other_meta
            && self.authors == other.authors
            && self.tags.iter().collect::<HashSet<_>>() == other.tags.iter().collect::<HashSet<_>>()
            && self.links.iter().collect::<HashSet<_>>() == other.links.iter().collect::<HashSet<_>>()
    }
}

/// An author name, possibly resolved through one or more aliases
/// (spec §3). `AuthorNames` in the store enforces
/// `AuthorNames ∩ AliasNames = ∅`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub aliases: Vec<String>,
}
