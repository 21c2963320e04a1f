use std::fmt;

/// An ordered list of unique dotted field paths
///
/// Built either from one comma-separated string or from a list of paths.
/// Entries are trimmed, empty entries are dropped and later duplicates are
/// ignored, so both forms normalize to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldList(Vec<String>);

impl FieldList {
    /// The wildcard selecting every scalar field
    pub fn wildcard() -> Self {
        Self(vec!["*".to_string()])
    }

    /// Builds a list from any sequence of entries, normalizing each
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths: Vec<String> = Vec::new();
        for entry in entries {
            let trimmed = entry.as_ref().trim();
            if trimmed.is_empty() || paths.iter().any(|p| p == trimmed) {
                continue;
            }
            paths.push(trimmed.to_string());
        }
        Self(paths)
    }

    /// Parses a comma-separated list such as `"name, slug,platforms.name"`
    pub fn parse(list: &str) -> Self {
        Self::from_entries(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl From<&str> for FieldList {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<String> for FieldList {
    fn from(list: String) -> Self {
        Self::parse(&list)
    }
}

impl From<Vec<String>> for FieldList {
    fn from(entries: Vec<String>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<Vec<&str>> for FieldList {
    fn from(entries: Vec<&str>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<&[&str]> for FieldList {
    fn from(entries: &[&str]) -> Self {
        Self::from_entries(entries)
    }
}

impl<const N: usize> From<[&str; N]> for FieldList {
    fn from(entries: [&str; N]) -> Self {
        Self::from_entries(entries)
    }
}
