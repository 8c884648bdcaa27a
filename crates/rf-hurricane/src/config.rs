//! Game configuration
//!
//! Everything a session needs at `init` time: grid geometry, spin speeds,
//! stop pacing, evaluation policy, symbol draw weights and timing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::paytable::{EvaluationPolicy, Payline, standard_paylines};
use crate::symbols::{SymbolCatalog, SymbolId};
use crate::timing::TimingConfig;

/// Largest supported column/row count
pub const MAX_GRID_DIMENSION: usize = 10;

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DRAW POLICY
// ═══════════════════════════════════════════════════════════════════════════

/// Weighted draw used whenever a cell needs a fresh symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawPolicy {
    /// Weight of a uniformly chosen normal symbol
    pub normal_weight: f64,
    /// Weight of the generic wild
    pub wild_weight: f64,
    /// Weight of the free spins scatter
    pub scatter_weight: f64,
}

impl DrawPolicy {
    /// Normal symbols only
    pub fn normal_only() -> Self {
        Self {
            normal_weight: 1.0,
            wild_weight: 0.0,
            scatter_weight: 0.0,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.normal_weight + self.wild_weight + self.scatter_weight
    }

    /// Draw one symbol. Falls back to a normal symbol when the catalog lacks
    /// the scatter the roll landed on.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, catalog: &SymbolCatalog) -> SymbolId {
        let total = self.total_weight();
        if total > 0.0 {
            let roll = rng.random_range(0.0..total);
            if roll >= self.normal_weight {
                if roll < self.normal_weight + self.wild_weight {
                    return catalog.wild_id();
                }
                if let Some(id) = catalog.scatter_id() {
                    return id;
                }
            }
        }
        let normals = catalog.normal_ids();
        normals[rng.random_range(0..normals.len())]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("draw.normal_weight", self.normal_weight),
            ("draw.wild_weight", self.wild_weight),
            ("draw.scatter_weight", self.scatter_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, value));
            }
        }
        if self.total_weight() <= 0.0 {
            return Err(ConfigError::Validation(
                "draw weights must have a positive sum".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DrawPolicy {
    fn default() -> Self {
        Self {
            normal_weight: 0.85,
            wild_weight: 0.10,
            scatter_weight: 0.05,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GAME CONFIG
// ═══════════════════════════════════════════════════════════════════════════

/// Complete session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Reel columns
    pub columns: usize,
    /// Visible rows per column
    pub rows: usize,
    /// Cell height in layout units
    pub cell_size: f64,
    /// Base spin speed (layout units per tick)
    pub base_spin_speed: f64,
    /// Speed factor for columns right of the hurricane
    pub storm_speed_multiplier: f64,
    /// Speed factor for columns the hurricane has passed (spun upward)
    pub post_storm_speed_multiplier: f64,
    /// Recycles every spinning column must reach before stops are scheduled
    pub min_symbols_spun: u32,
    /// Delay between successive column stops (ms)
    pub stagger_delay_ms: f64,

    /// Line evaluation rule
    pub evaluation: EvaluationPolicy,
    /// Paylines for [`EvaluationPolicy::Payline`]
    pub paylines: Vec<Payline>,
    /// Run the walking-wild hurricane instead of plain spins
    pub hurricane_enabled: bool,
    /// Symbol draw weights
    pub draw: DrawPolicy,
    /// Decoy and inter-phase timing
    pub timing: TimingConfig,

    /// Bet used by the autoplay runner when none is given
    pub default_bet: f64,
    /// Selectable bet levels
    pub bet_levels: Vec<f64>,
}

impl GameConfig {
    /// Walking-wild hurricane game (row-run evaluation)
    pub fn hurricane() -> Self {
        Self {
            columns: 5,
            rows: 5,
            cell_size: 124.0,
            base_spin_speed: 8.0,
            storm_speed_multiplier: 2.5,
            post_storm_speed_multiplier: 1.5,
            min_symbols_spun: 20,
            stagger_delay_ms: 500.0,
            evaluation: EvaluationPolicy::RowRun,
            paylines: standard_paylines(),
            hurricane_enabled: true,
            draw: DrawPolicy::default(),
            timing: TimingConfig::normal(),
            default_bet: 10.0,
            bet_levels: vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0],
        }
    }

    /// Plain spins over the 15 standard paylines
    pub fn regular() -> Self {
        Self {
            evaluation: EvaluationPolicy::Payline,
            hurricane_enabled: false,
            ..Self::hurricane()
        }
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML and validate
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Export to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Check every limit the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_GRID_DIMENSION).contains(&self.columns) {
            return Err(ConfigError::invalid("columns", self.columns));
        }
        if !(1..=MAX_GRID_DIMENSION).contains(&self.rows) {
            return Err(ConfigError::invalid("rows", self.rows));
        }
        for (field, value) in [
            ("cell_size", self.cell_size),
            ("base_spin_speed", self.base_spin_speed),
            ("storm_speed_multiplier", self.storm_speed_multiplier),
            ("post_storm_speed_multiplier", self.post_storm_speed_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(field, value));
            }
        }
        if !self.stagger_delay_ms.is_finite() || self.stagger_delay_ms < 0.0 {
            return Err(ConfigError::invalid("stagger_delay_ms", self.stagger_delay_ms));
        }
        if self.min_symbols_spun == 0 {
            return Err(ConfigError::invalid("min_symbols_spun", self.min_symbols_spun));
        }
        // A column must not move more than one cell per tick or recycling skips cells
        let fastest = self.base_spin_speed
            * self
                .storm_speed_multiplier
                .max(self.post_storm_speed_multiplier)
                .max(1.0);
        if fastest >= self.cell_size {
            return Err(ConfigError::Validation(format!(
                "fastest column speed {} must stay below cell_size {}",
                fastest, self.cell_size
            )));
        }

        self.draw.validate()?;
        self.timing.validate()?;

        if self.evaluation == EvaluationPolicy::Payline {
            if self.paylines.is_empty() {
                return Err(ConfigError::Validation(
                    "payline evaluation requires at least one payline".into(),
                ));
            }
            for line in &self.paylines {
                if line.positions.len() != self.columns {
                    return Err(ConfigError::Validation(format!(
                        "payline {} has {} positions, grid has {} columns",
                        line.index,
                        line.positions.len(),
                        self.columns
                    )));
                }
                if line.positions.iter().any(|&row| row as usize >= self.rows) {
                    return Err(ConfigError::Validation(format!(
                        "payline {} leaves the {}-row grid",
                        line.index, self.rows
                    )));
                }
            }
        }

        if !self.default_bet.is_finite() || self.default_bet <= 0.0 {
            return Err(ConfigError::invalid("default_bet", self.default_bet));
        }
        if let Some(bad) = self
            .bet_levels
            .iter()
            .find(|b| !b.is_finite() || **b <= 0.0)
        {
            return Err(ConfigError::invalid("bet_levels", bad));
        }
        Ok(())
    }

    /// Cells per column including the spin buffer
    pub fn cells_per_column(&self) -> usize {
        self.rows + crate::reel::BUFFER_CELLS
    }

    /// Worst-case time from the first stop to the last one (ms)
    pub fn total_stagger_ms(&self) -> f64 {
        self.columns.saturating_sub(1) as f64 * self.stagger_delay_ms
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::hurricane()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_presets_validate() {
        assert!(GameConfig::hurricane().validate().is_ok());
        assert!(GameConfig::regular().validate().is_ok());
        assert_eq!(GameConfig::default().columns, 5);
        assert_eq!(GameConfig::default().cells_per_column(), 8);
        assert_eq!(GameConfig::default().total_stagger_ms(), 2000.0);
    }

    #[test]
    fn test_validate_limits() {
        let mut config = GameConfig::hurricane();
        config.columns = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "columns", .. })
        ));

        let mut config = GameConfig::hurricane();
        config.cell_size = -1.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::hurricane();
        config.base_spin_speed = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = GameConfig::hurricane();
        config.base_spin_speed = 60.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = GameConfig::hurricane();
        config.min_symbols_spun = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::hurricane();
        config.draw = DrawPolicy {
            normal_weight: 0.0,
            wild_weight: 0.0,
            scatter_weight: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_payline_fit() {
        let mut config = GameConfig::regular();
        config.rows = 3;
        assert!(config.validate().is_err());

        // Row-run ignores paylines
        config.evaluation = EvaluationPolicy::RowRun;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = GameConfig::from_json(r#"{"columns": 4, "stagger_delay_ms": 250.0}"#);
        let config = config.unwrap();
        assert_eq!(config.columns, 4);
        assert_eq!(config.rows, 5);
        assert_eq!(config.stagger_delay_ms, 250.0);
        assert!(config.hurricane_enabled);

        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(GameConfig::from_json(r#"{"rows": 11}"#).is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "columns: 5\nrows: 5\nevaluation: payline\nhurricane_enabled: false\n";
        let config = GameConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.evaluation, EvaluationPolicy::Payline);
        assert!(!config.hurricane_enabled);

        assert!(matches!(
            GameConfig::from_yaml("columns: [1"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let json = GameConfig::regular().to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed.evaluation, EvaluationPolicy::Payline);
        assert_eq!(parsed.paylines.len(), 15);
    }

    #[test]
    fn test_draw_policy() {
        let catalog = SymbolCatalog::hurricane();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let policy = DrawPolicy::normal_only();
        for _ in 0..200 {
            let id = policy.draw(&mut rng, &catalog);
            assert!(catalog.normal_ids().contains(&id));
        }

        let wild_only = DrawPolicy {
            normal_weight: 0.0,
            wild_weight: 1.0,
            scatter_weight: 0.0,
        };
        assert_eq!(wild_only.draw(&mut rng, &catalog), catalog.wild_id());

        // Default mix produces all three kinds over enough draws
        let policy = DrawPolicy::default();
        let draws: Vec<SymbolId> = (0..2000).map(|_| policy.draw(&mut rng, &catalog)).collect();
        assert!(draws.contains(&catalog.wild_id()));
        assert!(draws.contains(&catalog.scatter_id().unwrap()));
        let normal = draws
            .iter()
            .filter(|id| catalog.normal_ids().contains(id))
            .count();
        assert!(normal > 1500 && normal < 1900);
    }
}
