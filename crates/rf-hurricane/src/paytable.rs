//! Paylines and win evaluation over a settled lattice

use serde::{Deserialize, Serialize};

use crate::lattice::Lattice;
use crate::symbols::{SymbolCatalog, SymbolId};

/// Minimum run length that pays
pub const MIN_MATCH: usize = 3;

/// Free spins scatters needed to flag a trigger
pub const SCATTER_TRIGGER_COUNT: usize = 3;

/// Line evaluation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// Each row from column 0, reference = first cell, pays `weight * run`
    RowRun,
    /// Fixed paylines, reference = first non-wild, pays `line multiplier * bet`
    Payline,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self::RowRun
    }
}

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (0-based)
    pub index: u8,
    /// Row for each column (e.g. [0, 1, 2, 3, 4] for a falling diagonal)
    pub positions: Vec<u8>,
}

impl Payline {
    /// Create a straight line (same row across all columns)
    pub fn straight(index: u8, row: u8, columns: u8) -> Self {
        Self {
            index,
            positions: vec![row; columns as usize],
        }
    }

    /// Create a line alternating between two rows, starting on `first`
    pub fn zigzag(index: u8, first: u8, second: u8, columns: u8) -> Self {
        Self {
            index,
            positions: (0..columns)
                .map(|c| if c % 2 == 0 { first } else { second })
                .collect(),
        }
    }

    /// (column, row) coordinates along the line
    pub fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(|(col, &row)| (col, row as usize))
    }
}

/// The 15 lines of the 5×5 game: 5 rows, 8 zigzags, 2 diagonals
pub fn standard_paylines() -> Vec<Payline> {
    let mut lines: Vec<Payline> = (0..5).map(|row| Payline::straight(row, row, 5)).collect();

    let zigzags = [(0, 1), (1, 0), (1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)];
    for (i, (first, second)) in zigzags.into_iter().enumerate() {
        lines.push(Payline::zigzag(5 + i as u8, first, second, 5));
    }

    lines.push(Payline {
        index: 13,
        positions: vec![0, 1, 2, 3, 4],
    });
    lines.push(Payline {
        index: 14,
        positions: vec![4, 3, 2, 1, 0],
    });
    lines
}

/// A win on one line (a row for row-run, a payline otherwise)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinResult {
    /// Row index or payline index
    pub line_index: u8,
    /// Reference symbol of the run
    pub symbol: SymbolId,
    /// Symbol name
    pub symbol_name: String,
    /// Length of the matching run
    pub match_count: u8,
    /// Amount won
    pub payout: f64,
    /// Matched cells (column, row)
    pub positions: Vec<(usize, usize)>,
}

/// Result of evaluating a lattice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Line wins
    pub wins: Vec<WinResult>,
    /// Sum of all line payouts
    pub total_win: f64,
    /// Free spins scatters on the lattice
    pub scatter_count: usize,
    /// Scatter count reached the trigger. The free spins round itself is not played.
    pub free_spins_triggered: bool,
}

impl EvaluationResult {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    pub fn win_count(&self) -> usize {
        self.wins.len()
    }
}

/// Evaluates settled lattices under one policy
#[derive(Debug, Clone)]
pub struct PayEvaluator {
    policy: EvaluationPolicy,
    paylines: Vec<Payline>,
}

impl PayEvaluator {
    pub fn new(policy: EvaluationPolicy, paylines: Vec<Payline>) -> Self {
        Self { policy, paylines }
    }

    pub fn row_run() -> Self {
        Self::new(EvaluationPolicy::RowRun, Vec::new())
    }

    pub fn payline() -> Self {
        Self::new(EvaluationPolicy::Payline, standard_paylines())
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    /// Evaluate wins. `bet` only scales payline wins.
    pub fn evaluate(&self, lattice: &Lattice, catalog: &SymbolCatalog, bet: f64) -> EvaluationResult {
        let wins: Vec<WinResult> = match self.policy {
            EvaluationPolicy::RowRun => (0..lattice.rows())
                .filter_map(|row| self.evaluate_row(lattice, catalog, row))
                .collect(),
            EvaluationPolicy::Payline => self
                .paylines
                .iter()
                .filter_map(|line| self.evaluate_payline(lattice, catalog, line, bet))
                .collect(),
        };

        for win in &wins {
            log::debug!(
                "[PayEvaluator] Line {}: {} x{} pays {:.2}",
                win.line_index,
                win.symbol_name,
                win.match_count,
                win.payout
            );
        }

        let scatter_count = catalog
            .scatter_id()
            .map_or(0, |scatter| lattice.count(scatter));
        let free_spins_triggered = scatter_count >= SCATTER_TRIGGER_COUNT;
        if free_spins_triggered {
            log::info!("[PayEvaluator] Free spins triggered by {} scatters", scatter_count);
        }

        EvaluationResult {
            total_win: wins.iter().map(|w| w.payout).sum(),
            wins,
            scatter_count,
            free_spins_triggered,
        }
    }

    /// Row-run rule: reference is the cell in column 0, wild or not
    fn evaluate_row(&self, lattice: &Lattice, catalog: &SymbolCatalog, row: usize) -> Option<WinResult> {
        let symbols = lattice.row(row);
        let coords: Vec<(usize, usize)> = (0..symbols.len()).map(|col| (col, row)).collect();
        let reference = (*symbols.first()?)?;
        let run = Self::line_match(&symbols, reference, catalog)?;
        if run < MIN_MATCH {
            return None;
        }

        let payout = catalog.payout_weight(reference) * run as f64;
        Some(WinResult {
            line_index: row as u8,
            symbol: reference,
            symbol_name: Self::name_of(catalog, reference),
            match_count: run as u8,
            payout,
            positions: coords[..run].to_vec(),
        })
    }

    /// Payline rule: reference is the first non-wild, or wild for an all-wild line
    fn evaluate_payline(
        &self,
        lattice: &Lattice,
        catalog: &SymbolCatalog,
        line: &Payline,
        bet: f64,
    ) -> Option<WinResult> {
        let coords: Vec<(usize, usize)> = line.coordinates().collect();
        let symbols: Vec<Option<SymbolId>> =
            coords.iter().map(|&(col, row)| lattice.get(col, row)).collect();
        if symbols.len() < lattice.columns() {
            return None;
        }

        let known: Vec<SymbolId> = symbols.iter().copied().collect::<Option<_>>()?;
        let reference = known
            .iter()
            .copied()
            .find(|&s| !catalog.is_wild(s))
            .or_else(|| known.first().copied())?;
        let run = Self::line_match(&symbols, reference, catalog)?;
        if run < MIN_MATCH {
            return None;
        }

        let symbol = catalog.get(reference)?;
        let multiplier = symbol.get_pay(run as u8);
        if multiplier <= 0.0 {
            return None;
        }

        Some(WinResult {
            line_index: line.index,
            symbol: reference,
            symbol_name: symbol.name.clone(),
            match_count: run as u8,
            payout: multiplier * bet,
            positions: coords[..run].to_vec(),
        })
    }

    /// Length of the left-to-right run matching `reference`.
    ///
    /// `None` when any cell on the line is unsettled; such a line never pays.
    pub fn line_match(
        symbols: &[Option<SymbolId>],
        reference: SymbolId,
        catalog: &SymbolCatalog,
    ) -> Option<usize> {
        if symbols.iter().any(Option::is_none) {
            return None;
        }
        Some(
            symbols
                .iter()
                .flatten()
                .take_while(|&&s| catalog.is_match(reference, s))
                .count(),
        )
    }

    fn name_of(catalog: &SymbolCatalog, id: SymbolId) -> String {
        catalog
            .get(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }
}

impl Default for PayEvaluator {
    fn default() -> Self {
        Self::row_run()
    }
}
