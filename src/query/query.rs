use crate::query::FieldList;
use crate::ScrapeError;
use std::fmt;
use std::str::FromStr;

/// Sort direction for a `sort` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A `sort <field> <direction>` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = ScrapeError;

    /// Parses `"<field> asc"` or `"<field> desc"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(field), Some(direction), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ScrapeError::InvalidQuery(format!(
                "sort must be '<field> asc|desc', got '{}'",
                s
            )));
        };

        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(ScrapeError::InvalidQuery(format!(
                    "unknown sort direction '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// One immutable request against a single catalog endpoint
///
/// Built through [`Query::builder`]. Paging never mutates a query; it derives
/// a new one with [`Query::with_window`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    fields: Option<FieldList>,
    exclude: Option<FieldList>,
    where_clause: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    sort: Option<Sort>,
    search: Option<String>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn fields(&self) -> Option<&FieldList> {
        self.fields.as_ref()
    }

    pub fn exclude(&self) -> Option<&FieldList> {
        self.exclude.as_ref()
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Returns a copy covering one paging window
    pub fn with_window(&self, offset: usize, limit: usize) -> Query {
        Query {
            offset: Some(offset),
            limit: Some(limit),
            ..self.clone()
        }
    }

    /// Returns the query sent to a `/count` endpoint: the filter only
    pub fn count_query(&self) -> Query {
        Query {
            where_clause: self.where_clause.clone(),
            ..Query::default()
        }
    }
}

impl fmt::Display for Query {
    /// Renders the Apicalypse wire form
    ///
    /// Clause order is fixed: fields, exclude, where, limit, offset, sort,
    /// search. Every clause ends with `;`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses: Vec<String> = Vec::with_capacity(7);

        if let Some(fields) = &self.fields {
            clauses.push(format!("fields {}", fields));
        }
        if let Some(exclude) = &self.exclude {
            clauses.push(format!("exclude {}", exclude));
        }
        if let Some(filter) = &self.where_clause {
            clauses.push(format!("where {}", filter));
        }
        if let Some(limit) = self.limit {
            clauses.push(format!("limit {}", limit));
        }
        if let Some(offset) = self.offset {
            clauses.push(format!("offset {}", offset));
        }
        if let Some(sort) = &self.sort {
            clauses.push(format!("sort {}", sort));
        }
        if let Some(search) = &self.search {
            clauses.push(format!("search {}", quote(search)));
        }

        let mut first = true;
        for clause in clauses {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{};", clause)?;
            first = false;
        }
        Ok(())
    }
}

/// Wraps a string in double quotes, escaping `\` and `"`
pub(crate) fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Builder for [`Query`]; `build` enforces the construction invariants
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: Option<FieldList>,
    exclude: Option<FieldList>,
    where_clause: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    sort: Option<Sort>,
    search: Option<String>,
}

impl QueryBuilder {
    pub fn fields(mut self, fields: impl Into<FieldList>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn exclude(mut self, exclude: impl Into<FieldList>) -> Self {
        self.exclude = Some(exclude.into());
        self
    }

    pub fn where_clause(mut self, filter: impl Into<String>) -> Self {
        self.where_clause = Some(filter.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Validates and freezes the query
    ///
    /// Fails with `InvalidQuery` when both `sort` and `search` are set, when a
    /// field list normalizes to nothing, when the filter is blank, or when the
    /// limit is zero.
    pub fn build(self) -> Result<Query, ScrapeError> {
        if self.sort.is_some() && self.search.is_some() {
            return Err(ScrapeError::InvalidQuery(
                "sort and search cannot be combined".to_string(),
            ));
        }

        if self.fields.as_ref().is_some_and(FieldList::is_empty) {
            return Err(ScrapeError::InvalidQuery(
                "fields must name at least one field".to_string(),
            ));
        }

        if self.exclude.as_ref().is_some_and(FieldList::is_empty) {
            return Err(ScrapeError::InvalidQuery(
                "exclude must name at least one field".to_string(),
            ));
        }

        let where_clause = match self.where_clause {
            Some(filter) if filter.trim().is_empty() => {
                return Err(ScrapeError::InvalidQuery(
                    "where clause cannot be blank".to_string(),
                ))
            }
            Some(filter) => Some(filter.trim().to_string()),
            None => None,
        };

        if self.limit == Some(0) {
            return Err(ScrapeError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }

        Ok(Query {
            fields: self.fields,
            exclude: self.exclude,
            where_clause,
            limit: self.limit,
            offset: self.offset,
            sort: self.sort,
            search: self.search,
        })
    }
}
