use serde::Deserialize;

/// Typed projection of the recognized header keys; everything else
/// falls into `other` via `#[serde(flatten)]`, preserving source
/// order (`serde_yaml::Mapping` is insertion-ordered) for `otherMeta`
/// (spec §9 design note).
#[derive(Deserialize, Debug, Default)]
pub struct RawHeader {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub authors: Option<AuthorsField>,
    #[serde(flatten)]
    pub other: serde_yaml::Mapping,
}

/// `authors` may be a single scalar or a list (spec §4.2).
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum AuthorsField {
    Single(String),
    Many(Vec<String>),
}

impl AuthorsField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            AuthorsField::Single(s) => vec![s],
            AuthorsField::Many(v) => v,
        }
    }
}
