//! Symbol definitions and the hurricane symbol catalog

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Logical symbol identifier. Cells, lattices and wins carry this, never a texture.
pub type SymbolId = u32;

/// Lowest hurricane category
pub const MIN_CATEGORY: u8 = 1;
/// Highest hurricane category
pub const MAX_CATEGORY: u8 = 5;

/// Well-known IDs of the hurricane catalog
pub mod ids {
    use super::SymbolId;

    pub const WINDSOCK: SymbolId = 1;
    pub const WATER: SymbolId = 2;
    pub const RADIO: SymbolId = 3;
    pub const QUEEN: SymbolId = 4;
    pub const KING: SymbolId = 5;
    pub const JACK: SymbolId = 6;
    pub const FLASHLIGHT: SymbolId = 7;
    pub const EVAC_SIGN: SymbolId = 8;
    pub const ACE: SymbolId = 9;
    pub const TEN: SymbolId = 10;

    pub const WILD: SymbolId = 11;
    pub const SCATTER: SymbolId = 12;
    pub const WALKING_SCATTER: SymbolId = 13;

    /// Category wilds occupy `CATEGORY_WILD_BASE + category`
    pub const CATEGORY_WILD_BASE: SymbolId = 20;
    /// Category markers occupy `CATEGORY_MARKER_BASE + category`
    pub const CATEGORY_MARKER_BASE: SymbolId = 30;
}

/// Role a symbol plays in evaluation and in the hurricane feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolRole {
    /// Regular paying symbol
    Normal,
    /// Substitutes for everything. Hurricane variants carry their category.
    Wild { category: Option<u8> },
    /// Free spins scatter
    Scatter,
    /// Walking-wild scatter shown behind the category decoy
    WalkingScatter,
    /// Hurricane category marker (1..=5)
    HurricaneCategory(u8),
}

/// A symbol definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Display name (e.g. "KING", "WILD_3X")
    pub name: String,
    /// Asset key handed to the renderer
    pub texture: String,
    /// Evaluation role
    pub role: SymbolRole,
    /// Row-run payout weight (paid per matched cell)
    pub payout_weight: f64,
    /// Line multipliers for 3, 4, 5 of a kind (index 0 = 3oak)
    pub pay_values: Vec<f64>,
}

impl Symbol {
    /// Create a regular symbol
    pub fn normal(
        id: SymbolId,
        name: impl Into<String>,
        texture: impl Into<String>,
        weight: f64,
        pays: &[f64],
    ) -> Self {
        Self {
            id,
            name: name.into(),
            texture: texture.into(),
            role: SymbolRole::Normal,
            payout_weight: weight,
            pay_values: pays.to_vec(),
        }
    }

    /// Create the generic wild
    pub fn wild(id: SymbolId, name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            texture: texture.into(),
            role: SymbolRole::Wild { category: None },
            payout_weight: 50.0,
            pay_values: vec![1.0, 2.5, 5.0],
        }
    }

    /// Create a wild tagged with a hurricane category.
    /// Weight and line pays scale with the category.
    pub fn category_wild(category: u8, texture: impl Into<String>) -> Self {
        let scale = category as f64;
        Self {
            id: ids::CATEGORY_WILD_BASE + category as SymbolId,
            name: format!("WILD_{}X", category),
            texture: texture.into(),
            role: SymbolRole::Wild {
                category: Some(category),
            },
            payout_weight: 50.0 * scale,
            pay_values: vec![1.0 * scale, 2.5 * scale, 5.0 * scale],
        }
    }

    /// Create the free spins scatter
    pub fn scatter(id: SymbolId, name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            texture: texture.into(),
            role: SymbolRole::Scatter,
            payout_weight: 1.0,
            pay_values: vec![1.0, 3.0, 10.0],
        }
    }

    /// Create the walking-wild scatter (never drawn onto reels)
    pub fn walking_scatter(id: SymbolId, name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            texture: texture.into(),
            role: SymbolRole::WalkingScatter,
            payout_weight: 1.0,
            pay_values: Vec::new(),
        }
    }

    /// Create a hurricane category marker
    pub fn category_marker(category: u8, texture: impl Into<String>) -> Self {
        Self {
            id: ids::CATEGORY_MARKER_BASE + category as SymbolId,
            name: format!("CAT{}", category),
            texture: texture.into(),
            role: SymbolRole::HurricaneCategory(category),
            payout_weight: 1.0,
            pay_values: vec![0.75, 2.0, 4.0],
        }
    }

    /// Get line multiplier for a match count
    pub fn get_pay(&self, match_count: u8) -> f64 {
        if match_count < 3 {
            return 0.0;
        }
        let idx = (match_count - 3) as usize;
        self.pay_values.get(idx).copied().unwrap_or(0.0)
    }

    /// Any wild variant
    pub fn is_wild(&self) -> bool {
        matches!(self.role, SymbolRole::Wild { .. })
    }

    /// Category carried by a hurricane wild
    pub fn wild_category(&self) -> Option<u8> {
        match self.role {
            SymbolRole::Wild { category } => category,
            _ => None,
        }
    }
}

/// Outcome of resolving the wild for a hurricane category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WildSubstitution {
    /// Category wild with its texture available
    Themed(SymbolId),
    /// Category asset missing, generic wild used instead
    Fallback(SymbolId),
}

impl WildSubstitution {
    pub fn symbol(&self) -> SymbolId {
        match *self {
            Self::Themed(id) | Self::Fallback(id) => id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Static symbol table for one game
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
    normal_ids: Vec<SymbolId>,
    wild: SymbolId,
}

impl SymbolCatalog {
    /// Build a catalog. Reels need at least one normal symbol to draw from and a
    /// generic wild to fall back on.
    pub fn from_symbols(symbols: Vec<Symbol>) -> Result<Self, ConfigError> {
        let normal_ids: Vec<SymbolId> = symbols
            .iter()
            .filter(|s| s.role == SymbolRole::Normal)
            .map(|s| s.id)
            .collect();
        if normal_ids.is_empty() {
            return Err(ConfigError::Validation(
                "symbol catalog has no normal symbols".into(),
            ));
        }
        let wild = symbols
            .iter()
            .find(|s| s.role == SymbolRole::Wild { category: None })
            .map(|s| s.id)
            .ok_or_else(|| ConfigError::Validation("symbol catalog has no generic wild".into()))?;
        Ok(Self {
            symbols,
            normal_ids,
            wild,
        })
    }

    /// The hurricane game catalog
    pub fn hurricane() -> Self {
        let mut symbols = vec![
            Symbol::normal(ids::WINDSOCK, "WINDSOCK", "windsockhc.png", 3.0, &[0.1, 0.25, 0.5]),
            Symbol::normal(ids::WATER, "WATER", "waterhc.png", 4.0, &[0.1, 0.3, 0.6]),
            Symbol::normal(ids::RADIO, "RADIO", "radiohc.png", 5.0, &[0.15, 0.4, 0.8]),
            Symbol::normal(ids::QUEEN, "QUEEN", "queenhc.png", 20.0, &[0.4, 1.0, 2.0]),
            Symbol::normal(ids::KING, "KING", "kinghc.png", 25.0, &[0.45, 1.1, 2.25]),
            Symbol::normal(ids::JACK, "JACK", "jackhc.png", 15.0, &[0.35, 0.9, 1.75]),
            Symbol::normal(ids::FLASHLIGHT, "FLASHLIGHT", "flashlighthc.png", 6.0, &[0.2, 0.5, 1.0]),
            Symbol::normal(ids::EVAC_SIGN, "EVAC_SIGN", "evacsignhc.png", 8.0, &[0.25, 0.6, 1.2]),
            Symbol::normal(ids::ACE, "ACE", "acehc.png", 30.0, &[0.5, 1.25, 2.5]),
            Symbol::normal(ids::TEN, "TEN", "10hc.png", 10.0, &[0.3, 0.75, 1.5]),
            Symbol::wild(ids::WILD, "WILD", "wildhc.png"),
            Symbol::scatter(ids::SCATTER, "SCATTER", "scatterhc.png"),
            Symbol::walking_scatter(
                ids::WALKING_SCATTER,
                "WALKING_SCATTER",
                "scatterhc-removebg-preview.png",
            ),
        ];

        for category in MIN_CATEGORY..=MAX_CATEGORY {
            let texture = if category == 1 {
                "wild.png".to_string()
            } else {
                format!("wild{}x.png", category)
            };
            symbols.push(Symbol::category_wild(category, texture));
            symbols.push(Symbol::category_marker(category, format!("cat{}.png", category)));
        }

        let normal_ids = symbols
            .iter()
            .filter(|s| s.role == SymbolRole::Normal)
            .map(|s| s.id)
            .collect();
        Self {
            symbols,
            normal_ids,
            wild: ids::WILD,
        }
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Get symbol by display name
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// All symbols
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Regular symbol IDs (never empty)
    pub fn normal_ids(&self) -> &[SymbolId] {
        &self.normal_ids
    }

    /// Generic (untagged) wild
    pub fn wild_id(&self) -> SymbolId {
        self.wild
    }

    /// Free spins scatter
    pub fn scatter_id(&self) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| s.role == SymbolRole::Scatter)
            .map(|s| s.id)
    }

    /// Walking-wild scatter
    pub fn walking_scatter_id(&self) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| s.role == SymbolRole::WalkingScatter)
            .map(|s| s.id)
    }

    /// Wild tagged with `category`
    pub fn category_wild_id(&self, category: u8) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| s.wild_category() == Some(category))
            .map(|s| s.id)
    }

    /// Marker symbol for `category`
    pub fn category_marker_id(&self, category: u8) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| s.role == SymbolRole::HurricaneCategory(category))
            .map(|s| s.id)
    }

    /// Texture key for a symbol
    pub fn texture(&self, id: SymbolId) -> Option<&str> {
        self.get(id).map(|s| s.texture.as_str())
    }

    /// Row-run payout weight; unknown symbols weigh 1
    pub fn payout_weight(&self, id: SymbolId) -> f64 {
        self.get(id).map_or(1.0, |s| s.payout_weight)
    }

    /// Check if a symbol ID is any wild variant
    pub fn is_wild(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(Symbol::is_wild)
    }

    /// Match rule: equal, or either side wild
    pub fn is_match(&self, a: SymbolId, b: SymbolId) -> bool {
        a == b || self.is_wild(a) || self.is_wild(b)
    }

    /// Pick the wild that fills a hurricane column.
    ///
    /// The category wild is used when the catalog has one and `texture_available`
    /// accepts its texture; otherwise the generic wild stands in.
    pub fn resolve_category_wild(
        &self,
        category: u8,
        texture_available: impl Fn(&str) -> bool,
    ) -> WildSubstitution {
        match self
            .category_wild_id(category)
            .and_then(|id| self.get(id))
            .filter(|s| texture_available(&s.texture))
        {
            Some(symbol) => WildSubstitution::Themed(symbol.id),
            None => WildSubstitution::Fallback(self.wild),
        }
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::hurricane()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_pay() {
        let catalog = SymbolCatalog::hurricane();
        let ace = catalog.get(ids::ACE).unwrap();
        assert_eq!(ace.get_pay(2), 0.0);
        assert_eq!(ace.get_pay(3), 0.5);
        assert_eq!(ace.get_pay(4), 1.25);
        assert_eq!(ace.get_pay(5), 2.5);
        assert_eq!(ace.get_pay(6), 0.0);
    }

    #[test]
    fn test_hurricane_catalog() {
        let catalog = SymbolCatalog::hurricane();
        assert_eq!(catalog.normal_ids().len(), 10);
        assert_eq!(catalog.wild_id(), ids::WILD);
        assert_eq!(catalog.scatter_id(), Some(ids::SCATTER));
        assert_eq!(catalog.walking_scatter_id(), Some(ids::WALKING_SCATTER));

        for category in MIN_CATEGORY..=MAX_CATEGORY {
            let wild = catalog.category_wild_id(category).unwrap();
            assert!(catalog.is_wild(wild));
            assert_eq!(catalog.payout_weight(wild), 50.0 * category as f64);
            assert!(catalog.category_marker_id(category).is_some());
        }
        assert_eq!(catalog.texture(ids::CATEGORY_WILD_BASE + 3), Some("wild3x.png"));
    }

    #[test]
    fn test_match_rule_symmetry() {
        let catalog = SymbolCatalog::hurricane();
        let all: Vec<SymbolId> = catalog.symbols().iter().map(|s| s.id).collect();

        for &a in &all {
            for &b in &all {
                let expected = a == b || catalog.is_wild(a) || catalog.is_wild(b);
                assert_eq!(catalog.is_match(a, b), expected);
                assert_eq!(catalog.is_match(a, b), catalog.is_match(b, a));
            }
        }
        assert!(!catalog.is_match(ids::KING, ids::WATER));
        assert!(catalog.is_match(ids::KING, ids::WILD));
    }

    #[test]
    fn test_resolve_category_wild() {
        let catalog = SymbolCatalog::hurricane();

        let themed = catalog.resolve_category_wild(4, |_| true);
        assert_eq!(themed, WildSubstitution::Themed(ids::CATEGORY_WILD_BASE + 4));
        assert!(!themed.is_fallback());

        let fallback = catalog
            .resolve_category_wild(4, |texture| texture != "wild4x.png");
        assert_eq!(fallback, WildSubstitution::Fallback(ids::WILD));
        assert!(fallback.is_fallback());

        // Unknown category falls back too
        let unknown = catalog.resolve_category_wild(9, |_| true);
        assert_eq!(unknown.symbol(), ids::WILD);
    }

    #[test]
    fn test_catalog_requirements() {
        let no_normal = SymbolCatalog::from_symbols(vec![Symbol::wild(1, "WILD", "wild.png")]);
        assert!(no_normal.is_err());

        let no_wild = SymbolCatalog::from_symbols(vec![Symbol::normal(1, "A", "a.png", 1.0, &[1.0])]);
        assert!(no_wild.is_err());

        let minimal = SymbolCatalog::from_symbols(vec![
            Symbol::normal(1, "A", "a.png", 1.0, &[1.0]),
            Symbol::wild(2, "WILD", "wild.png"),
        ])
        .unwrap();
        assert_eq!(minimal.wild_id(), 2);
        assert_eq!(minimal.scatter_id(), None);
        // No category wilds at all: always the generic one
        assert_eq!(
            minimal.resolve_category_wild(3, |_| true),
            WildSubstitution::Fallback(2)
        );
    }
}
