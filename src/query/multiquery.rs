use crate::query::query::quote;
use crate::query::Query;
use crate::ScrapeError;
use std::fmt;

/// One labeled sub-query inside a multiquery request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiqueryEntry {
    /// Unique label; the API echoes it back as the sub-result `name`
    pub label: String,

    /// Endpoint the sub-query targets (e.g. `games`)
    pub endpoint: String,

    pub query: Query,
}

/// A group of labeled sub-queries bundled into one physical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiqueryBatch {
    entries: Vec<MultiqueryEntry>,
    capacity: usize,
}

impl MultiqueryBatch {
    /// Creates an empty batch holding at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Result<Self, ScrapeError> {
        if capacity == 0 {
            return Err(ScrapeError::InvalidBatchSize(capacity));
        }

        Ok(Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends a sub-query
    ///
    /// Fails with `InvalidQuery` if the label is already used in this batch
    /// or the batch is full.
    pub fn push(
        &mut self,
        label: impl Into<String>,
        endpoint: impl Into<String>,
        query: Query,
    ) -> Result<(), ScrapeError> {
        let label = label.into();

        if self.entries.len() >= self.capacity {
            return Err(ScrapeError::InvalidQuery(format!(
                "multiquery batch is full ({} entries)",
                self.capacity
            )));
        }

        if self.entries.iter().any(|e| e.label == label) {
            return Err(ScrapeError::InvalidQuery(format!(
                "duplicate multiquery label '{}'",
                label
            )));
        }

        self.entries.push(MultiqueryEntry {
            label,
            endpoint: endpoint.into(),
            query,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[MultiqueryEntry] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for MultiqueryBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(
                f,
                "query {} {} {{ {} }};",
                entry.endpoint,
                quote(&entry.label),
                entry.query
            )?;
        }
        Ok(())
    }
}
