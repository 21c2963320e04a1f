//! Playlist catalog
//!
//! The catalog maps a human playlist title (also the output file stem) to the
//! base query selecting its games. The table itself is declarative data in
//! `playlists.toml`, embedded at compile time and parsed on start-up.

use crate::query::{FieldList, Query, Sort};
use serde::Deserialize;
use thiserror::Error;

const EMBEDDED_CATALOG: &str = include_str!("playlists.toml");

/// Endpoint every playlist query targets
pub const GAMES_ENDPOINT: &str = "games";

/// Fields fetched for every game unless a playlist overrides them
pub const DEFAULT_GAME_FIELDS: &[&str] = &[
    "name",
    "age_ratings.organization.name",
    "age_ratings.rating_category.rating",
    "age_ratings.rating_content_descriptions.description",
    "aggregated_rating",
    "aggregated_rating_count",
    "alternative_names.name",
    "alternative_names.comment",
    "first_release_date",
    "forks.name",
    "franchise.name",
    "franchises.name",
    "game_localizations.name",
    "game_localizations.region.name",
    "game_localizations.region.identifier",
    "game_localizations.region.category",
    "game_modes.name",
    "game_status.status",
    "game_type.type",
    "genres.name",
    "involved_companies.company.name",
    "involved_companies.company.country",
    "involved_companies.company.description",
    "involved_companies.company.status.name",
    "involved_companies.developer",
    "involved_companies.porting",
    "involved_companies.publisher",
    "involved_companies.supporting",
    "keywords.name",
    "language_supports.language.locale",
    "language_supports.language.name",
    "language_supports.language_support_type.name",
    "multiplayer_modes.campaigncoop",
    "multiplayer_modes.dropin",
    "multiplayer_modes.lancoop",
    "multiplayer_modes.offlinecoop",
    "multiplayer_modes.offlinecoopmax",
    "multiplayer_modes.offlinemax",
    "multiplayer_modes.onlinecoop",
    "multiplayer_modes.onlinecoopmax",
    "multiplayer_modes.onlinemax",
    "multiplayer_modes.splitscreen",
    "multiplayer_modes.splitscreenonline",
    "platforms.name",
    "platforms.abbreviation",
    "platforms.alternative_name",
    "platforms.generation",
    "platforms.platform_family.name",
    "platforms.platform_type.name",
    "platforms.slug",
    "platforms.summary",
    "platforms.versions.name",
    "platforms.versions.connectivity",
    "platforms.versions.cpu",
    "player_perspectives.name",
    "ports",
    "release_dates.date",
    "release_dates.human",
    "release_dates.m",
    "release_dates.y",
    "release_dates.date_format.format",
    "release_dates.release_region.region",
    "release_dates.status.description",
    "release_dates.status.name",
    "remakes",
    "remasters",
    "similar_games",
    "slug",
    "standalone_expansions",
    "dlcs",
    "expanded_games",
    "expansions",
    "external_games",
    "storyline",
    "summary",
    "tags",
    "themes.name",
    "version_title",
    "websites.url",
    "websites.type.type",
];

/// Default sort; a total order on `id` keeps offset paging stable
pub const DEFAULT_SORT_FIELD: &str = "id";

/// Errors raised while loading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate playlist title '{0}'")]
    DuplicateTitle(String),

    #[error("Playlist '{0}' selects nothing (needs platforms, engines, platform-versions or where)")]
    EmptySelection(String),

    #[error("Playlist '{title}' has an invalid query: {reason}")]
    InvalidQuery { title: String, reason: String },
}

/// A named request template: one playlist, one output file
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub title: String,
    pub query: Query,
}

impl Playlist {
    pub fn new(title: impl Into<String>, query: Query) -> Self {
        Self {
            title: title.into(),
            query,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "playlist")]
    playlists: Vec<PlaylistEntry>,
}

/// One `[[playlist]]` table as written in the catalog file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PlaylistEntry {
    title: String,
    #[serde(default)]
    platforms: Vec<u64>,
    #[serde(default)]
    engines: Vec<u64>,
    #[serde(default)]
    platform_versions: Vec<u64>,
    #[serde(rename = "where")]
    filter: Option<String>,
    fields: Option<Vec<String>>,
    sort: Option<String>,
}

impl PlaylistEntry {
    /// Renders the selectors into one `where` expression
    fn filter(&self) -> Option<String> {
        let mut parts = Vec::new();

        if !self.platforms.is_empty() {
            parts.push(format!("platforms = ({})", join_ids(&self.platforms)));
        }
        if !self.engines.is_empty() {
            parts.push(format!("game_engines = ({})", join_ids(&self.engines)));
        }
        if !self.platform_versions.is_empty() {
            parts.push(format!(
                "platforms.versions = ({})",
                join_ids(&self.platform_versions)
            ));
        }
        if let Some(filter) = self.filter.as_deref().map(str::trim) {
            if !filter.is_empty() {
                parts.push(filter.to_string());
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" & "))
        }
    }

    fn into_playlist(self) -> Result<Playlist, CatalogError> {
        let filter = self
            .filter()
            .ok_or_else(|| CatalogError::EmptySelection(self.title.clone()))?;

        let invalid = |reason: String| CatalogError::InvalidQuery {
            title: self.title.clone(),
            reason,
        };

        let fields = match &self.fields {
            Some(fields) => FieldList::from_entries(fields),
            None => FieldList::from(DEFAULT_GAME_FIELDS),
        };

        let sort = match &self.sort {
            Some(sort) => sort.parse::<Sort>().map_err(|e| invalid(e.to_string()))?,
            None => Sort::asc(DEFAULT_SORT_FIELD),
        };

        let query = Query::builder()
            .fields(fields)
            .where_clause(filter)
            .sort(sort)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Playlist::new(self.title, query))
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// The loaded, read-only set of playlists
#[derive(Debug, Clone)]
pub struct Catalog {
    playlists: Vec<Playlist>,
}

impl Catalog {
    /// Parses a catalog from TOML text
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut playlists: Vec<Playlist> = Vec::with_capacity(file.playlists.len());

        for entry in file.playlists {
            if playlists.iter().any(|p| p.title == entry.title) {
                return Err(CatalogError::DuplicateTitle(entry.title));
            }
            playlists.push(entry.into_playlist()?);
        }

        Ok(Self { playlists })
    }

    pub fn get(&self, title: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.title == title)
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// Resolves requested titles against the catalog
    ///
    /// Returns the known playlists in request order (first occurrence wins)
    /// and the names that matched nothing. An empty request selects the
    /// whole catalog.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> (Vec<Playlist>, Vec<String>) {
        if names.is_empty() {
            return (self.playlists.clone(), Vec::new());
        }

        let mut found: Vec<Playlist> = Vec::new();
        let mut unknown = Vec::new();

        for name in names {
            let name = name.as_ref();
            match self.get(name) {
                Some(playlist) if !found.iter().any(|p| p.title == playlist.title) => {
                    found.push(playlist.clone())
                }
                Some(_) => {}
                None => unknown.push(name.to_string()),
            }
        }

        (found, unknown)
    }
}

/// Loads the catalog embedded in the binary
pub fn load_catalog() -> Result<Catalog, CatalogError> {
    Catalog::parse(EMBEDDED_CATALOG)
}
