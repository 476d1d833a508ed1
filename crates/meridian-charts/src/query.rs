// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! What the user's query says about chart scope.

/// Phrases that ask for every country rather than named ones.
const GLOBAL_PHRASES: &[&str] = &[
    "world",
    "worldwide",
    "global",
    "globally",
    "all countries",
    "every country",
    "by country",
    "across countries",
    "across africa",
    "across asia",
    "across europe",
    "across latin america",
    "continent",
    "continental",
    "regional comparison",
];

/// Vocabulary that asks for a map specifically.
const MAP_TERMS: &[&str] = &["map", "maps", "choropleth", "heatmap", "heat map"];

/// Words too common in country names to identify one on their own.
const NAME_STOPWORDS: &[&str] = &[
    "republic",
    "united",
    "states",
    "kingdom",
    "democratic",
    "islands",
    "federal",
    "people",
    "peoples",
    "south",
    "north",
    "west",
    "east",
    "central",
    "income",
    "countries",
    "region",
    "total",
    "world",
];

/// Normalized view of the query used for chart selection.
#[derive(Debug, Clone)]
pub struct QueryScope {
    normalized: String,
    tokens: Vec<String>,
    global: bool,
    map_terms: bool,
}

impl QueryScope {
    pub fn new(query: &str) -> Self {
        let lowered = query.to_lowercase();
        // Source names are not geography.
        let lowered = lowered.replace("world bank", " ");
        let tokens: Vec<String> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let normalized = format!(" {} ", tokens.join(" "));

        let global = GLOBAL_PHRASES
            .iter()
            .any(|p| normalized.contains(&format!(" {p} ")));
        let map_terms = MAP_TERMS
            .iter()
            .any(|p| normalized.contains(&format!(" {p} ")));

        Self {
            normalized,
            tokens,
            global,
            map_terms,
        }
    }

    /// The query asks for worldwide or cross-country coverage.
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// The query uses map, global or continental vocabulary.
    pub fn wants_map(&self) -> bool {
        self.map_terms || self.global
    }

    /// Whether the query names `entity`.
    ///
    /// Case-insensitive containment in both directions, at word boundaries:
    /// the query contains the entity name, or a significant word of the
    /// entity name matches a query word up to a demonym or plural ending
    /// ("Nigeria" matches "nigerian"; "Egypt, Arab Rep." matches "egypt").
    pub fn names_entity(&self, entity: &str) -> bool {
        let entity_tokens: Vec<String> = entity
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if entity_tokens.is_empty() {
            return false;
        }

        let phrase = entity_tokens.join(" ");
        if phrase.chars().count() < 4 {
            // Short names and codes (USA, UK) only match as whole words.
            return self.tokens.iter().any(|t| *t == phrase);
        }
        if self.normalized.contains(&format!(" {phrase} ")) {
            return true;
        }

        let significant = |w: &&String| w.len() >= 4 && !NAME_STOPWORDS.contains(&w.as_str());
        entity_tokens.iter().filter(significant).any(|word| {
            self.tokens
                .iter()
                .filter(significant)
                .any(|t| same_stem(t, word))
        })
    }
}

/// Endings that turn a place name into a demonym or plural.
const STEM_ENDINGS: &[&str] = &["s", "n", "an", "ian", "ns", "ans", "ians", "ese"];

fn same_stem(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.strip_prefix(short)
        .is_some_and(|rest| rest.is_empty() || STEM_ENDINGS.contains(&rest))
}
