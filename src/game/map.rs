//! Territory graph: static map definitions.
//!
//! A map is immutable once built. Territories reference their continent and
//! neighbours by id; [`MapDefinition::new`] validates those references and
//! builds an id index so lookups stay O(1).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// A single map region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Continent this territory belongs to.
    pub continent: String,
    /// Bordering territory ids, in declaration order.
    pub neighbors: Vec<String>,
}

/// A named group of territories granting a bonus to whoever holds all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Armies granted per draft for full ownership.
    pub bonus: u32,
    /// Display colour.
    pub color: String,
}

/// On-disk form of a map.
#[derive(Debug, Clone, Deserialize)]
struct MapFile {
    id: String,
    name: String,
    continents: Vec<Continent>,
    territories: Vec<Territory>,
}

/// A validated, immutable map.
#[derive(Debug, Clone)]
pub struct MapDefinition {
    id: String,
    name: String,
    territories: Vec<Territory>,
    continents: Vec<Continent>,
    /// Territory id -> index into `territories`.
    index: HashMap<String, usize>,
}

impl MapDefinition {
    /// Build and validate a map.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] if the map is empty, has duplicate ids, refers
    /// to unknown territories or continents, declares a one-way or
    /// self border, or has a continent with no territories.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        continents: Vec<Continent>,
        territories: Vec<Territory>,
    ) -> Result<Self, MapError> {
        let id = id.into();
        if territories.is_empty() {
            return Err(MapError::Empty(id));
        }

        let mut continent_ids = HashSet::new();
        for continent in &continents {
            if !continent_ids.insert(continent.id.as_str()) {
                return Err(MapError::DuplicateContinent(continent.id.clone()));
            }
        }

        let mut index = HashMap::with_capacity(territories.len());
        for (idx, territory) in territories.iter().enumerate() {
            if index.insert(territory.id.clone(), idx).is_some() {
                return Err(MapError::DuplicateTerritory(territory.id.clone()));
            }
        }

        let map = Self {
            id,
            name: name.into(),
            territories,
            continents,
            index,
        };
        map.validate()?;
        Ok(map)
    }

    /// Parse and validate a map from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Parse`] for malformed JSON, or any validation error.
    pub fn from_json_str(data: &str) -> Result<Self, MapError> {
        let file: MapFile = serde_json::from_str(data)?;
        Self::new(file.id, file.name, file.continents, file.territories)
    }

    /// Read, parse and validate a map file.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Read`] if the file cannot be read, otherwise as
    /// [`MapDefinition::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path).map_err(|source| MapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), MapError> {
        for territory in &self.territories {
            if !self.continents.iter().any(|c| c.id == territory.continent) {
                return Err(MapError::UnknownContinent {
                    territory: territory.id.clone(),
                    continent: territory.continent.clone(),
                });
            }

            for neighbor in &territory.neighbors {
                if *neighbor == territory.id {
                    return Err(MapError::SelfAdjacent(territory.id.clone()));
                }
                let Some(other) = self.territory(neighbor) else {
                    return Err(MapError::UnknownNeighbor {
                        territory: territory.id.clone(),
                        neighbor: neighbor.clone(),
                    });
                };
                if !other.neighbors.contains(&territory.id) {
                    return Err(MapError::AsymmetricAdjacency {
                        from: territory.id.clone(),
                        to: neighbor.clone(),
                    });
                }
            }
        }

        for continent in &self.continents {
            if self.continent_territories(&continent.id).next().is_none() {
                return Err(MapError::EmptyContinent(continent.id.clone()));
            }
        }

        Ok(())
    }

    /// Map identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All territories in declaration order.
    #[must_use]
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    /// All continents in declaration order.
    #[must_use]
    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    /// Look up a territory by id.
    #[must_use]
    pub fn territory(&self, id: &str) -> Option<&Territory> {
        self.index.get(id).map(|&idx| &self.territories[idx])
    }

    /// Whether a territory with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Neighbours of a territory (empty for unknown ids).
    #[must_use]
    pub fn neighbors(&self, id: &str) -> &[String] {
        self.territory(id).map_or(&[], |t| t.neighbors.as_slice())
    }

    /// Whether two territories share a border.
    #[must_use]
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.neighbors(a).iter().any(|n| n == b)
    }

    /// Territories belonging to a continent.
    pub fn continent_territories<'a>(
        &'a self,
        continent: &'a str,
    ) -> impl Iterator<Item = &'a Territory> + 'a {
        self.territories
            .iter()
            .filter(move |t| t.continent == continent)
    }
}
