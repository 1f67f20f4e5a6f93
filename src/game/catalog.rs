//! Built-in maps and lookup by id.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::game::map::{Continent, MapDefinition, Territory};

/// `(id, name, bonus, colour)`
type ContinentRow = (&'static str, &'static str, u32, &'static str);

/// `(id, name, continent, neighbours)`
type TerritoryRow = (&'static str, &'static str, &'static str, &'static [&'static str]);

const CLASSIC_CONTINENTS: &[ContinentRow] = &[
    ("north_america", "North America", 5, "#d9a441"),
    ("south_america", "South America", 2, "#c0392b"),
    ("europe", "Europe", 5, "#2e86c1"),
    ("africa", "Africa", 3, "#a0522d"),
    ("asia", "Asia", 7, "#27ae60"),
    ("australia", "Australia", 2, "#8e44ad"),
];

const CLASSIC_TERRITORIES: &[TerritoryRow] = &[
    ("alaska", "Alaska", "north_america", &["northwest_territory", "alberta", "kamchatka"]),
    ("northwest_territory", "Northwest Territory", "north_america", &["alaska", "alberta", "ontario", "greenland"]),
    ("greenland", "Greenland", "north_america", &["northwest_territory", "ontario", "quebec", "iceland"]),
    ("alberta", "Alberta", "north_america", &["alaska", "northwest_territory", "ontario", "western_united_states"]),
    ("ontario", "Ontario", "north_america", &["northwest_territory", "alberta", "greenland", "quebec", "western_united_states", "eastern_united_states"]),
    ("quebec", "Quebec", "north_america", &["ontario", "greenland", "eastern_united_states"]),
    ("western_united_states", "Western United States", "north_america", &["alberta", "ontario", "eastern_united_states", "central_america"]),
    ("eastern_united_states", "Eastern United States", "north_america", &["ontario", "quebec", "western_united_states", "central_america"]),
    ("central_america", "Central America", "north_america", &["western_united_states", "eastern_united_states", "venezuela"]),
    ("venezuela", "Venezuela", "south_america", &["central_america", "peru", "brazil"]),
    ("peru", "Peru", "south_america", &["venezuela", "brazil", "argentina"]),
    ("brazil", "Brazil", "south_america", &["venezuela", "peru", "argentina", "north_africa"]),
    ("argentina", "Argentina", "south_america", &["peru", "brazil"]),
    ("iceland", "Iceland", "europe", &["greenland", "great_britain", "scandinavia"]),
    ("great_britain", "Great Britain", "europe", &["iceland", "scandinavia", "northern_europe", "western_europe"]),
    ("scandinavia", "Scandinavia", "europe", &["iceland", "great_britain", "northern_europe", "ukraine"]),
    ("northern_europe", "Northern Europe", "europe", &["great_britain", "scandinavia", "ukraine", "southern_europe", "western_europe"]),
    ("western_europe", "Western Europe", "europe", &["great_britain", "northern_europe", "southern_europe", "north_africa"]),
    ("southern_europe", "Southern Europe", "europe", &["western_europe", "northern_europe", "ukraine", "middle_east", "egypt", "north_africa"]),
    ("ukraine", "Ukraine", "europe", &["scandinavia", "northern_europe", "southern_europe", "middle_east", "afghanistan", "ural"]),
    ("north_africa", "North Africa", "africa", &["brazil", "western_europe", "southern_europe", "egypt", "east_africa", "congo"]),
    ("egypt", "Egypt", "africa", &["north_africa", "southern_europe", "middle_east", "east_africa"]),
    ("east_africa", "East Africa", "africa", &["egypt", "north_africa", "congo", "south_africa", "madagascar", "middle_east"]),
    ("congo", "Congo", "africa", &["north_africa", "east_africa", "south_africa"]),
    ("south_africa", "South Africa", "africa", &["congo", "east_africa", "madagascar"]),
    ("madagascar", "Madagascar", "africa", &["east_africa", "south_africa"]),
    ("ural", "Ural", "asia", &["ukraine", "siberia", "china", "afghanistan"]),
    ("siberia", "Siberia", "asia", &["ural", "yakutsk", "irkutsk", "mongolia", "china"]),
    ("yakutsk", "Yakutsk", "asia", &["siberia", "kamchatka", "irkutsk"]),
    ("kamchatka", "Kamchatka", "asia", &["yakutsk", "irkutsk", "mongolia", "japan", "alaska"]),
    ("irkutsk", "Irkutsk", "asia", &["siberia", "yakutsk", "kamchatka", "mongolia"]),
    ("mongolia", "Mongolia", "asia", &["siberia", "irkutsk", "kamchatka", "japan", "china"]),
    ("japan", "Japan", "asia", &["kamchatka", "mongolia"]),
    ("afghanistan", "Afghanistan", "asia", &["ukraine", "ural", "china", "india", "middle_east"]),
    ("china", "China", "asia", &["afghanistan", "ural", "siberia", "mongolia", "siam", "india"]),
    ("middle_east", "Middle East", "asia", &["ukraine", "southern_europe", "egypt", "east_africa", "afghanistan", "india"]),
    ("india", "India", "asia", &["middle_east", "afghanistan", "china", "siam"]),
    ("siam", "Siam", "asia", &["india", "china", "indonesia"]),
    ("indonesia", "Indonesia", "australia", &["siam", "new_guinea", "western_australia"]),
    ("new_guinea", "New Guinea", "australia", &["indonesia", "western_australia", "eastern_australia"]),
    ("western_australia", "Western Australia", "australia", &["indonesia", "new_guinea", "eastern_australia"]),
    ("eastern_australia", "Eastern Australia", "australia", &["new_guinea", "western_australia"]),
];

const DUEL_CONTINENTS: &[ContinentRow] = &[
    ("westmarch", "Westmarch", 2, "#3b7dd8"),
    ("eastmarch", "Eastmarch", 2, "#d8563b"),
];

const DUEL_TERRITORIES: &[TerritoryRow] = &[
    ("harbor", "Harbor", "westmarch", &["mill", "ridge"]),
    ("mill", "Mill", "westmarch", &["harbor", "ford"]),
    ("ridge", "Ridge", "westmarch", &["harbor", "ford", "marsh"]),
    ("ford", "Ford", "westmarch", &["mill", "ridge", "keep"]),
    ("keep", "Keep", "eastmarch", &["ford", "orchard", "marsh"]),
    ("marsh", "Marsh", "eastmarch", &["ridge", "keep", "quarry"]),
    ("orchard", "Orchard", "eastmarch", &["keep", "quarry"]),
    ("quarry", "Quarry", "eastmarch", &["marsh", "orchard"]),
];

fn build(
    id: &str,
    name: &str,
    continents: &[ContinentRow],
    territories: &[TerritoryRow],
) -> Result<MapDefinition, crate::error::MapError> {
    let continents = continents
        .iter()
        .map(|&(id, name, bonus, color)| Continent {
            id: id.to_string(),
            name: name.to_string(),
            bonus,
            color: color.to_string(),
        })
        .collect();
    let territories = territories
        .iter()
        .map(|&(id, name, continent, neighbors)| Territory {
            id: id.to_string(),
            name: name.to_string(),
            continent: continent.to_string(),
            neighbors: neighbors.iter().map(ToString::to_string).collect(),
        })
        .collect();
    MapDefinition::new(id, name, continents, territories)
}

/// The 42-territory world map.
///
/// # Errors
///
/// Only fails if the built-in table is inconsistent.
pub fn classic_map() -> Result<MapDefinition, crate::error::MapError> {
    build("classic", "Classic World", CLASSIC_CONTINENTS, CLASSIC_TERRITORIES)
}

/// A small two-continent map for quick games.
///
/// # Errors
///
/// Only fails if the built-in table is inconsistent.
pub fn duel_map() -> Result<MapDefinition, crate::error::MapError> {
    build("duel", "Duel", DUEL_CONTINENTS, DUEL_TERRITORIES)
}

/// Registry of playable maps, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    maps: BTreeMap<String, Arc<MapDefinition>>,
}

impl MapCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog holding every built-in map.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for map in [classic_map(), duel_map()] {
            match map {
                Ok(map) => catalog.insert(map),
                Err(err) => tracing::error!(
                    target: "conquest::maps",
                    error = %err,
                    "maps.builtin_invalid"
                ),
            }
        }
        catalog
    }

    /// Register a map, replacing any map with the same id.
    pub fn insert(&mut self, map: MapDefinition) {
        self.maps.insert(map.id().to_string(), Arc::new(map));
    }

    /// Look up a map by id.
    #[must_use]
    pub fn get_map_by_id(&self, id: &str) -> Option<Arc<MapDefinition>> {
        self.maps.get(id).cloned()
    }

    /// Registered map ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Registered maps, sorted by id.
    pub fn maps(&self) -> impl Iterator<Item = &Arc<MapDefinition>> {
        self.maps.values()
    }
}
