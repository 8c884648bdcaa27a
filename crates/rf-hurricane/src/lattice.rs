//! Reel lattice: the column set and the settled symbol grid read by evaluation

use serde::{Deserialize, Serialize};

use crate::reel::ReelColumn;
use crate::symbols::SymbolId;

/// Settled COLS×ROWS grid, indexed `[column][row]`.
///
/// `None` marks a cell whose column had not settled when the grid was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    columns: usize,
    rows: usize,
    cells: Vec<Vec<Option<SymbolId>>>,
}

impl Lattice {
    /// All-unsettled grid
    pub fn empty(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![vec![None; rows]; columns],
        }
    }

    /// Build from fully known symbols, `[column][row]`
    pub fn from_columns(columns: Vec<Vec<SymbolId>>) -> Self {
        let rows = columns.first().map_or(0, Vec::len);
        let count = columns.len();
        let cells = columns
            .into_iter()
            .map(|col| {
                let mut col: Vec<Option<SymbolId>> = col.into_iter().map(Some).collect();
                col.resize(rows, None);
                col
            })
            .collect();
        Self {
            columns: count,
            rows,
            cells,
        }
    }

    /// Build from rows of symbols (`[row][column]`), the way a grid reads on screen
    pub fn from_rows(rows: &[Vec<SymbolId>]) -> Self {
        let columns = rows.first().map_or(0, Vec::len);
        let cells = (0..columns)
            .map(|c| rows.iter().map(|r| r.get(c).copied()).collect())
            .collect();
        Self {
            columns,
            rows: rows.len(),
            cells,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, column: usize, row: usize) -> Option<SymbolId> {
        self.cells.get(column)?.get(row).copied().flatten()
    }

    /// One row, left to right
    pub fn row(&self, row: usize) -> Vec<Option<SymbolId>> {
        (0..self.columns)
            .map(|c| self.cells.get(c).and_then(|col| col.get(row)).copied().flatten())
            .collect()
    }

    /// One column, top to bottom
    pub fn column(&self, column: usize) -> &[Option<SymbolId>] {
        self.cells.get(column).map_or(&[], Vec::as_slice)
    }

    /// Every cell holds a symbol
    pub fn is_complete(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    /// Count cells holding `symbol`
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|s| **s == Some(symbol))
            .count()
    }

    fn set_column(&mut self, column: usize, symbols: Vec<Option<SymbolId>>) {
        if let Some(slot) = self.cells.get_mut(column) {
            *slot = symbols;
        }
    }
}

/// Owns the reel columns and the last captured [`Lattice`]
#[derive(Debug, Clone)]
pub struct ReelLattice {
    columns: Vec<ReelColumn>,
    rows: usize,
    settled: Lattice,
}

impl ReelLattice {
    pub fn new(columns: usize, rows: usize, cell_size: f64) -> Self {
        Self {
            columns: (0..columns)
                .map(|i| ReelColumn::new(i, rows, cell_size))
                .collect(),
            rows,
            settled: Lattice::empty(columns, rows),
        }
    }

    /// Repopulate every column and capture the fresh layout
    pub fn populate(&mut self, mut draw: impl FnMut() -> SymbolId) -> &Lattice {
        for column in &mut self.columns {
            column.populate(&mut draw);
        }
        self.capture()
    }

    /// Rebuild the settled grid from the columns. Unsettled columns read as `None`.
    pub fn capture(&mut self) -> &Lattice {
        for (i, column) in self.columns.iter().enumerate() {
            self.settled.set_column(i, column.settled_symbols());
        }
        &self.settled
    }

    /// Last captured grid
    pub fn settled(&self) -> &Lattice {
        &self.settled
    }

    pub fn columns(&self) -> &[ReelColumn] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [ReelColumn] {
        &mut self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ReelColumn> {
        self.columns.get(index)
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut ReelColumn> {
        self.columns.get_mut(index)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Lock or unlock one column; returns false for an unknown index
    pub fn set_locked(&mut self, index: usize, locked: bool) -> bool {
        match self.columns.get_mut(index) {
            Some(column) => {
                column.set_locked(locked);
                true
            }
            None => false,
        }
    }

    pub fn unlock_all(&mut self) {
        for column in &mut self.columns {
            column.set_locked(false);
        }
    }

    /// Indices of columns in the spin pool
    pub fn unlocked_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .filter(|c| !c.is_locked())
            .map(ReelColumn::index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_orientation() {
        let lattice = Lattice::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(lattice.columns(), 3);
        assert_eq!(lattice.rows(), 2);
        assert_eq!(lattice.get(2, 0), Some(3));
        assert_eq!(lattice.get(0, 1), Some(4));
        assert_eq!(lattice.row(1), vec![Some(4), Some(5), Some(6)]);
        assert_eq!(lattice.column(1), &[Some(2), Some(5)]);
        assert_eq!(lattice.get(5, 5), None);
        assert!(lattice.is_complete());
    }

    #[test]
    fn test_populate_and_capture() {
        let mut reels = ReelLattice::new(5, 5, 124.0);
        assert!(!reels.settled().is_complete());

        let lattice = reels.populate(|| 7);
        assert!(lattice.is_complete());
        assert_eq!(lattice.count(7), 25);
    }

    #[test]
    fn test_capture_unsettled_column() {
        let mut reels = ReelLattice::new(3, 3, 100.0);
        reels.populate(|| 1);
        reels.column_mut(1).unwrap().start_spin(5.0);

        let lattice = reels.capture();
        assert!(!lattice.is_complete());
        assert_eq!(lattice.column(1), &[None, None, None]);
        assert_eq!(lattice.get(0, 0), Some(1));
    }

    #[test]
    fn test_locking() {
        let mut reels = ReelLattice::new(5, 5, 124.0);
        assert!(reels.set_locked(4, true));
        assert!(!reels.set_locked(9, true));
        assert_eq!(reels.unlocked_indices(), vec![0, 1, 2, 3]);
        reels.unlock_all();
        assert_eq!(reels.unlocked_indices().len(), 5);
    }
}
