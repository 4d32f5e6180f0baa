//! Ticker to archive identifier resolution.

use std::collections::HashMap;

use filings_core::{Entity, Symbol};

/// Retired tickers and the CIK their historical filings live under.
pub const RETIRED_TICKERS: [(&str, &str); 3] = [
    // Discover Financial, acquired by Capital One (May 2025)
    ("DFS", "0001393612"),
    // Comerica, acquired by Fifth Third Bancorp (Feb 2026)
    ("CMA", "0000028412"),
    // Synovus, acquired by Pinnacle Financial (Jan 2026)
    ("SNV", "0000018349"),
];

/// Maps ticker symbols to the identifier the archive expects.
///
/// Lookup is against a static substitution table with an identity fallback,
/// so every symbol resolves to exactly one identifier.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    overrides: HashMap<Symbol, String>,
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::with_overrides(RETIRED_TICKERS)
    }
}

impl EntityResolver {
    /// Create a resolver over the built-in retired ticker table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver over a custom substitution table.
    pub fn with_overrides<S, I>(overrides: impl IntoIterator<Item = (S, I)>) -> Self
    where
        S: Into<Symbol>,
        I: Into<String>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(s, id)| (s.into(), id.into()))
                .collect(),
        }
    }

    /// Resolve a symbol to an entity.
    #[must_use]
    pub fn resolve(&self, symbol: &Symbol) -> Entity {
        let entity = Entity::new(symbol.clone());
        match self.overrides.get(symbol) {
            Some(archive_id) => entity.with_archive_id(archive_id),
            None => entity,
        }
    }

    /// Reverse lookup: the symbol a substituted identifier stands in for.
    #[must_use]
    pub fn symbol_for(&self, archive_id: &str) -> Option<&Symbol> {
        self.overrides
            .iter()
            .find(|(_, id)| id.as_str() == archive_id)
            .map(|(symbol, _)| symbol)
    }
}
