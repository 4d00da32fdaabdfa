use std::collections::HashSet;

/// Field names treated as annotation/config branches when no list is configured.
pub const DEFAULT_METADATA_FIELDS: &[&str] = &[
    "meta",
    "metadata",
    "_meta",
    "seo",
    "structuredData",
    "jsonLd",
    "@context",
];

/// Decides whether a field's subtree is metadata rather than primary content.
pub trait MetadataPredicate {
    fn is_metadata(&self, field_name: &str) -> bool;
}

impl<F> MetadataPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn is_metadata(&self, field_name: &str) -> bool {
        self(field_name)
    }
}

/// Exact, case-sensitive match against a set of field names.
#[derive(Debug, Clone, Default)]
pub struct FieldSetPredicate {
    fields: HashSet<String>,
}

impl FieldSetPredicate {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_METADATA_FIELDS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl MetadataPredicate for FieldSetPredicate {
    fn is_metadata(&self, field_name: &str) -> bool {
        self.fields.contains(field_name)
    }
}
