//! Reel column: continuously positioned cells with wraparound and grid snap

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Cells beyond the visible rows. One staged above the window, two below.
pub const BUFFER_CELLS: usize = 3;

/// One symbol slot in a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Logical symbol (the renderer only ever receives a projection of this)
    pub symbol: SymbolId,
    /// Vertical offset in layout units; positive is downward
    pub position: f64,
    /// Visible row occupied after a snap, `None` while moving or off-window
    pub visible_index: Option<usize>,
}

/// Motion mode of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnMode {
    /// Populated, never spun
    Idle,
    /// Moving; cells crossing the trailing edge are recycled
    Spinning,
    /// Snapped; settled symbols may be read
    Settled,
}

/// A single reel column
#[derive(Debug, Clone)]
pub struct ReelColumn {
    index: usize,
    rows: usize,
    cell_size: f64,
    cells: Vec<Cell>,
    speed: f64,
    spin_count: u32,
    locked: bool,
    mode: ColumnMode,
    dirty: bool,
}

impl ReelColumn {
    /// Create an empty column. Call [`ReelColumn::populate`] before use.
    pub fn new(index: usize, rows: usize, cell_size: f64) -> Self {
        Self {
            index,
            rows,
            cell_size,
            cells: Vec::with_capacity(rows + BUFFER_CELLS),
            speed: 0.0,
            spin_count: 0,
            locked: false,
            mode: ColumnMode::Idle,
            dirty: true,
        }
    }

    /// Fill every cell with a fresh symbol and lay them out at `(i - 1) * cell_size`,
    /// which puts exactly `rows` cells in view.
    pub fn populate(&mut self, mut draw: impl FnMut() -> SymbolId) {
        let count = self.rows + BUFFER_CELLS;
        self.cells.clear();
        for _ in 0..count {
            self.cells.push(Cell {
                symbol: draw(),
                position: 0.0,
                visible_index: None,
            });
        }
        self.pack();
        self.speed = 0.0;
        self.spin_count = 0;
        self.mode = ColumnMode::Settled;
        self.dirty = true;
    }

    /// Enter spinning mode at `speed` and reset the recycle counter
    pub fn start_spin(&mut self, speed: f64) {
        self.speed = speed;
        self.spin_count = 0;
        self.mode = ColumnMode::Spinning;
        for cell in &mut self.cells {
            cell.visible_index = None;
        }
        self.dirty = true;
    }

    /// Move every cell by `speed`. While spinning, cells that cross the trailing
    /// edge wrap to the leading edge with a freshly drawn symbol.
    ///
    /// Returns the number of recycles this tick.
    pub fn tick(&mut self, speed: f64, mut draw: impl FnMut() -> SymbolId) -> u32 {
        if speed == 0.0 || !speed.is_finite() || self.cells.is_empty() {
            return 0;
        }
        let recycle = self.mode == ColumnMode::Spinning;
        let span = self.cells.len() as f64 * self.cell_size;
        let bottom = self.cell_size * (self.rows as f64 + 1.0);
        let top = -2.0 * self.cell_size;

        let mut recycled = 0;
        for cell in &mut self.cells {
            cell.position += speed;
            if !recycle {
                continue;
            }
            if speed > 0.0 {
                while cell.position > bottom {
                    cell.position -= span;
                    cell.symbol = draw();
                    recycled += 1;
                }
            } else {
                while cell.position < top {
                    cell.position += span;
                    cell.symbol = draw();
                    recycled += 1;
                }
            }
        }
        self.spin_count += recycled;
        self.dirty = true;
        recycled
    }

    /// Snap to the grid: round each position to a whole cell, then re-pack the
    /// sorted cells into contiguous slots so exactly `rows` occupy `0..rows`.
    pub fn snap_to_grid(&mut self) {
        let cs = self.cell_size;
        for cell in &mut self.cells {
            cell.position = (cell.position / cs).round() * cs;
        }
        self.cells.sort_by(|a, b| a.position.total_cmp(&b.position));
        self.pack();
        self.mode = ColumnMode::Settled;
        self.dirty = true;
    }

    /// Assign `(i - 1) * cell_size` in current order and refresh visible rows
    fn pack(&mut self) {
        let rows = self.rows;
        let cs = self.cell_size;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            cell.position = (i as f64 - 1.0) * cs;
            cell.visible_index = (1..=rows).contains(&i).then(|| i - 1);
        }
    }

    /// Symbols at the visible rows in row order.
    ///
    /// A `None` entry means "not settled": the column is moving or the slot is empty.
    pub fn settled_symbols(&self) -> Vec<Option<SymbolId>> {
        let mut out = vec![None; self.rows];
        if self.mode != ColumnMode::Settled {
            return out;
        }
        for cell in &self.cells {
            if let Some(row) = cell.visible_index {
                if let Some(slot) = out.get_mut(row) {
                    *slot = Some(cell.symbol);
                }
            }
        }
        out
    }

    /// Overwrite every visible cell with `wild`. Motion state is untouched.
    /// Returns the number of cells written.
    pub fn force_full_wild(&mut self, wild: SymbolId) -> usize {
        let mut written = 0;
        for cell in self.cells.iter_mut().filter(|c| c.visible_index.is_some()) {
            cell.symbol = wild;
            written += 1;
        }
        if written > 0 {
            self.dirty = true;
        }
        written
    }

    /// Change speed without touching mode or counters
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn set_locked(&mut self, locked: bool) {
        if self.locked != locked {
            self.locked = locked;
            self.dirty = true;
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn spin_count(&self) -> u32 {
        self.spin_count
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn mode(&self) -> ColumnMode {
        self.mode
    }

    pub fn is_settled(&self) -> bool {
        self.mode == ColumnMode::Settled
    }

    /// Return and clear the "needs re-projection" flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn counter() -> impl FnMut() -> SymbolId {
        let mut next = 0;
        move || {
            next += 1;
            next
        }
    }

    fn visible_positions(column: &ReelColumn) -> Vec<f64> {
        let mut positions: Vec<f64> = column
            .cells()
            .iter()
            .filter(|c| c.visible_index.is_some())
            .map(|c| c.position)
            .collect();
        positions.sort_by(f64::total_cmp);
        positions
    }

    #[test]
    fn test_populate_layout() {
        let mut column = ReelColumn::new(0, 5, 124.0);
        column.populate(counter());

        assert_eq!(column.cells().len(), 8);
        assert_eq!(column.cells()[0].position, -124.0);
        assert_eq!(column.cells()[7].position, 6.0 * 124.0);
        assert_eq!(
            visible_positions(&column),
            vec![0.0, 124.0, 248.0, 372.0, 496.0]
        );
        // Cells 1..=5 are rows 0..=4
        let settled = column.settled_symbols();
        assert_eq!(settled, vec![Some(2), Some(3), Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn test_tick_recycles_downward() {
        let mut column = ReelColumn::new(0, 5, 100.0);
        column.populate(|| 1);
        column.start_spin(10.0);

        let mut recycled = 0;
        for _ in 0..100 {
            recycled += column.tick(10.0, || 2);
            assert_eq!(column.cells().len(), 8);
        }
        // 1000 units of travel over an 800-unit loop; every cell recycles at least once
        assert_eq!(recycled, column.spin_count());
        assert!(recycled >= 8);
        assert!(column.cells().iter().all(|c| c.symbol == 2));
        assert!(column.settled_symbols().iter().all(Option::is_none));
    }

    #[test]
    fn test_tick_recycles_upward() {
        let mut column = ReelColumn::new(0, 5, 100.0);
        column.populate(|| 1);
        column.start_spin(-15.0);

        for _ in 0..200 {
            column.tick(-15.0, || 3);
        }
        assert!(column.spin_count() > 0);
        for cell in column.cells() {
            assert!(cell.position >= -200.0);
            assert!(cell.position <= 600.0);
        }
    }

    #[test]
    fn test_no_recycle_unless_spinning() {
        let mut column = ReelColumn::new(0, 3, 100.0);
        column.populate(|| 1);
        // Settled column moved by hand never redraws symbols
        for _ in 0..50 {
            assert_eq!(column.tick(30.0, || 9), 0);
        }
        assert_eq!(column.spin_count(), 0);
        assert!(column.cells().iter().all(|c| c.symbol == 1));
    }

    #[test]
    fn test_snap_invariant_under_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for rows in [1usize, 3, 5, 7] {
            let mut column = ReelColumn::new(0, rows, 124.0);
            column.populate(|| 1);
            column.start_spin(8.0);
            for _ in 0..rng.random_range(1..400) {
                let speed = rng.random_range(1.0..40.0);
                column.tick(speed, || 2);
            }
            // Uneven per-cell drift
            for cell in &mut column.cells {
                cell.position += rng.random_range(-70.0..70.0);
            }
            column.snap_to_grid();

            let expected: Vec<f64> = (0..rows).map(|r| r as f64 * 124.0).collect();
            assert_eq!(visible_positions(&column), expected);
            assert!(column.settled_symbols().iter().all(Option::is_some));
            assert_eq!(column.cells().len(), rows + BUFFER_CELLS);
        }
    }

    #[test]
    fn test_force_full_wild() {
        let mut column = ReelColumn::new(2, 5, 124.0);
        column.populate(counter());
        column.take_dirty();

        assert_eq!(column.force_full_wild(99), 5);
        assert!(column.take_dirty());
        assert!(column.settled_symbols().iter().all(|s| *s == Some(99)));
        // Buffer cells keep their symbols
        assert_eq!(column.cells().iter().filter(|c| c.symbol == 99).count(), 5);
        assert_eq!(column.speed(), 0.0);
    }

    #[test]
    fn test_force_full_wild_while_spinning() {
        let mut column = ReelColumn::new(0, 5, 124.0);
        column.populate(|| 1);
        column.start_spin(8.0);
        assert_eq!(column.force_full_wild(99), 0);
    }
}
