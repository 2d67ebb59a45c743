//! Character records returned by the remote API
//!
//! These are transient view data. Shapes follow the public character API and
//! are not validated beyond what serde requires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a character (also the favorites key)
pub type CharacterId = i64;

/// Named reference to a location (origin or last known location)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A single character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// `Alive`, `Dead` or `unknown` as sent by the API
    pub status: String,
    pub species: String,
    /// Sub-species or type; often empty
    #[serde(rename = "type", default)]
    pub kind: String,
    pub gender: String,
    #[serde(default)]
    pub origin: LocationRef,
    #[serde(default)]
    pub location: LocationRef,
    #[serde(default)]
    pub image: String,
    /// Episode URLs the character appears in
    #[serde(default)]
    pub episode: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

impl Character {
    /// Short description, e.g. `"Alive Human"`
    pub fn summary(&self) -> String {
        format!("{} {}", self.status, self.species)
    }

    pub fn episode_count(&self) -> usize {
        self.episode.len()
    }
}

/// Paging metadata of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total number of matching characters
    pub count: u32,
    /// Total number of pages
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// One page of the character listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharactersPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

impl CharactersPage {
    /// Page returned when nothing matches the filters
    ///
    /// The API answers such queries with a 404; the listing treats that as a
    /// single empty page.
    pub fn empty() -> Self {
        Self {
            info: PageInfo {
                count: 0,
                pages: 1,
                next: None,
                prev: None,
            },
            results: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
