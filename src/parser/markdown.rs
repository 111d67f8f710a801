//! Header + body parser (spec §4.2): locates the yaml header via the
//! streaming [`crate::filter::yaml_header`] scanner, decodes it, then
//! (optionally) extracts headings and links from the body.

use crate::config::ParseOptions;
use crate::dates;
use crate::domain::Document;
use crate::error::{Error, Result};
use crate::filter::yaml_header;
use crate::parser::model::RawHeader;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;

static HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[^\n]*$").unwrap());
static LINK_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)[^)]*\)").unwrap());

/// Parses `content` (the full file content) into a [`Document`].
/// `path` is the document's key; `file_time` is the filesystem
/// modification time captured by the caller before the read.
pub fn parse(
    path: &str,
    content: &str,
    file_time: NaiveDateTime,
    opts: &ParseOptions,
) -> Result<Document> {
    let header_len = yaml_header::scan(&mut Cursor::new(content.as_bytes()))
        .map_err(|e| Error::Io { path: path.into(), source: e })?
        .ok_or_else(|| Error::HeaderNotFound { path: path.into() })?;

    let header_block = &content[..header_len];
    let body = &content[header_len..];

    let header: RawHeader = serde_yaml::from_str(header_block)
        .map_err(|e| Error::HeaderParse { path: path.into(), source: e.into() })?;

    let title = header.title.unwrap_or_default();
    let tags = header.tags.unwrap_or_default();
    let authors = header.authors.map(|f| f.into_vec()).unwrap_or_default();

    let date = match header.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match dates::parse_any(raw) {
            Some(dt) => Some(dt),
            None if opts.ignore_date_error => None,
            None => {
                return Err(Error::DateParse { path: path.into(), value: raw.to_string() });
            }
        },
    };

    let other_meta = if opts.parse_meta {
        render_other_meta(path, &header.other, opts.ignore_meta_error)?
    } else {
        String::new()
    };

    let mut headings = String::new();
    let mut links = Vec::new();

    if opts.parse_headings {
        for m in HEADING_LINE.find_iter(body) {
            headings.push_str(m.as_str());
            headings.push('\n');
        }
    }

    if opts.parse_links {
        for caps in LINK_TARGET.captures_iter(body) {
            links.push(caps[1].to_string());
        }
    }

    Ok(Document {
        path: path.to_string(),
        title,
        date,
        file_time,
        authors,
        tags,
        links,
        headings,
        other_meta,
    })
}

fn render_other_meta(
    path: &str,
    other: &serde_yaml::Mapping,
    ignore_meta_error: bool,
) -> Result<String> {
    let mut lines = Vec::new();
    for (key, value) in other.iter() {
        let key_str = match key.as_str() {
            Some(s) => s.to_string(),
            None => match serde_yaml::to_string(key) {
                Ok(s) => s.trim().to_string(),
                Err(_) if ignore_meta_error => continue,
                Err(e) => {
                    return Err(Error::HeaderParse { path: path.into(), source: e.into() });
                }
            },
        };

        let value_str = match value.as_str() {
            Some(s) => s.to_string(),
            None => match serde_yaml::to_string(value) {
                Ok(s) => s.trim().to_string(),
                Err(_) if ignore_meta_error => continue,
                Err(e) => {
                    return Err(Error::HeaderParse { path: path.into(), source: e.into() });
                }
            },
        };

        lines.push(format!("{key_str}: {value_str}"));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_title_tags_and_body() {
        let content = "---\ntitle: A title\ntags:\n  - rust\n  - notes\n---\n# Heading\nbody";
        let doc = parse("a.md", content, now(), &opts()).unwrap();
        assert_eq!(doc.title, "A title");
        assert_eq!(doc.tags, vec!["rust", "notes"]);
        assert_eq!(doc.headings, "# Heading\n");
    }

    #[test]
    fn missing_header_is_an_error() {
        let content = "# just content, no header";
        assert!(matches!(
            parse("a.md", content, now(), &opts()),
            Err(Error::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn single_author_becomes_one_element_vec() {
        let content = "---\nauthors: Rob Pike\n---\nbody";
        let doc = parse("a.md", content, now(), &opts()).unwrap();
        assert_eq!(doc.authors, vec!["Rob Pike".to_string()]);
    }

    #[test]
    fn empty_date_is_absent() {
        let content = "---\ndate: \"\"\n---\nbody";
        let doc = parse("a.md", content, now(), &opts()).unwrap();
        assert!(doc.date.is_none());
    }

    #[test]
    fn unparseable_date_errors_unless_ignored() {
        let content = "---\ndate: not-a-date\n---\nbody";
        assert!(parse("a.md", content, now(), &opts()).is_err());

        let mut lenient = opts();
        lenient.ignore_date_error = true;
        let doc = parse("a.md", content, now(), &lenient).unwrap();
        assert!(doc.date.is_none());
    }

    #[test]
    fn other_meta_preserves_insertion_order() {
        let content = "---\nseries: rust-book\nedition: 2\n---\nbody";
        let doc = parse("a.md", content, now(), &opts()).unwrap();
        assert_eq!(doc.other_meta, "series: rust-book\nedition: 2");
    }

    #[test]
    fn extracts_link_targets() {
        let content = "---\ntitle: x\n---\nSee [other](./b.md) and [site](https://example.com).";
        let doc = parse("a.md", content, now(), &opts()).unwrap();
        assert_eq!(doc.links, vec!["./b.md".to_string(), "https://example.com".to_string()]);
    }
}
