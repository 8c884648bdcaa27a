//! Walking-wild hurricane state machine
//!
//! The hurricane enters at the rightmost column with a random category,
//! turns that column into a full wild, lets the other columns spin and pays
//! the result, then walks one column left with a ±1 category step. After the
//! leftmost column the accumulated winnings are multiplied by the final
//! category.
//!
//! ```text
//! Idle → Targeting → Selecting → Expanding → SpinningOthers → Propagating ─┐
//!          ↑                                                                │
//!          └──────────────── activeColumn ≥ 0 ─────────────────────────────┤
//!                                                     activeColumn < 0 → Terminated → Idle
//! ```
//!
//! This type owns decisions only. Column locking, decoy pacing and spinning
//! belong to the session that drives it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::symbols::{MAX_CATEGORY, MIN_CATEGORY, WildSubstitution};

/// Hurricane phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HurricanePhase {
    Idle,
    /// Column and category decided
    Targeting,
    /// Column locked, decoy running
    Selecting,
    /// Column filled with the category wild
    Expanding,
    /// Remaining columns spinning
    SpinningOthers,
    /// Round paid, about to move on
    Propagating,
    /// Walked off the board; outcome emitted
    Terminated,
}

impl Default for HurricanePhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Transition requested in the wrong phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while hurricane is {phase:?}")]
pub struct PhaseError {
    pub action: &'static str,
    pub phase: HurricanePhase,
}

/// One category random-walk step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStep {
    Down,
    Up,
}

impl CategoryStep {
    /// Coin flip: heads weakens, tails strengthens
    pub fn from_coin(heads: bool) -> Self {
        if heads { Self::Down } else { Self::Up }
    }

    pub fn flip<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_coin(rng.random_bool(0.5))
    }
}

/// Apply a step. A step that would leave `1..=5` is rejected, not reflected.
pub fn walk_category(category: u8, step: CategoryStep) -> u8 {
    let next = match step {
        CategoryStep::Down => category.checked_sub(1),
        CategoryStep::Up => category.checked_add(1),
    };
    match next {
        Some(n) if (MIN_CATEGORY..=MAX_CATEGORY).contains(&n) => n,
        _ => category,
    }
}

/// Signed spin speed for a column while the hurricane sits on `active`.
///
/// Columns right of the hurricane spin down at the storm multiplier, columns
/// it already passed spin up at the post-storm multiplier.
pub fn storm_speed(
    column: usize,
    active: i32,
    base_speed: f64,
    storm_multiplier: f64,
    post_storm_multiplier: f64,
) -> f64 {
    let column = column as i64;
    let active = active as i64;
    if column > active {
        base_speed * storm_multiplier
    } else if column < active {
        -(base_speed * post_storm_multiplier)
    } else {
        0.0
    }
}

/// One column visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HurricaneStep {
    pub column: usize,
    pub category: u8,
    /// Wild that filled the column
    pub wild: Option<WildSubstitution>,
    /// Winnings of the spin made while the column was held
    pub round_win: f64,
}

/// Emitted when the hurricane leaves the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HurricaneOutcome {
    pub steps: Vec<HurricaneStep>,
    pub accumulated_winnings: f64,
    pub final_category: u8,
    /// `accumulated_winnings * final_category`
    pub final_payout: f64,
}

/// Result of [`HurricaneState::propagate`]
#[derive(Debug, Clone, PartialEq)]
pub enum Propagation {
    /// Moved to `column`; back in `Targeting`
    Continue {
        column: usize,
        previous_category: u8,
        category: u8,
    },
    /// Left the board
    Terminated(HurricaneOutcome),
}

/// Hurricane runtime state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HurricaneState {
    phase: HurricanePhase,
    /// Current column; -1 once departed
    active_column: i32,
    category: u8,
    accumulated_winnings: f64,
    substitution: Option<WildSubstitution>,
    /// Columns already visited, in visit order
    wild_trail: Vec<usize>,
    steps: Vec<HurricaneStep>,
}

impl HurricaneState {
    pub fn new() -> Self {
        Self {
            active_column: -1,
            ..Self::default()
        }
    }

    fn require(&self, phase: HurricanePhase, action: &'static str) -> Result<(), PhaseError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(PhaseError {
                action,
                phase: self.phase,
            })
        }
    }

    /// Idle → Targeting with a uniformly drawn category
    pub fn begin<R: Rng + ?Sized>(&mut self, columns: usize, rng: &mut R) -> Result<(), PhaseError> {
        let category = rng.random_range(MIN_CATEGORY..=MAX_CATEGORY);
        self.begin_with(columns, category)
    }

    /// Idle → Targeting with a given category (clamped into range)
    pub fn begin_with(&mut self, columns: usize, category: u8) -> Result<(), PhaseError> {
        self.require(HurricanePhase::Idle, "begin")?;
        if columns == 0 {
            return Err(PhaseError {
                action: "begin on an empty grid",
                phase: self.phase,
            });
        }
        self.active_column = columns as i32 - 1;
        self.category = category.clamp(MIN_CATEGORY, MAX_CATEGORY);
        self.accumulated_winnings = 0.0;
        self.substitution = None;
        self.wild_trail.clear();
        self.steps.clear();
        self.phase = HurricanePhase::Targeting;
        log::info!(
            "[Hurricane] Category {} enters at column {}",
            self.category,
            self.active_column
        );
        Ok(())
    }

    /// Targeting → Selecting. Returns the column to lock and the category the decoy must end on.
    pub fn select(&mut self) -> Result<(usize, u8), PhaseError> {
        self.require(HurricanePhase::Targeting, "select")?;
        self.phase = HurricanePhase::Selecting;
        Ok((self.active_column as usize, self.category))
    }

    /// Selecting → Expanding. Records the wild used for the column.
    pub fn expand(&mut self, substitution: WildSubstitution) -> Result<usize, PhaseError> {
        self.require(HurricanePhase::Selecting, "expand")?;
        self.substitution = Some(substitution);
        self.phase = HurricanePhase::Expanding;
        Ok(self.active_column as usize)
    }

    /// Expanding → SpinningOthers
    pub fn spin_others(&mut self) -> Result<(), PhaseError> {
        self.require(HurricanePhase::Expanding, "spin others")?;
        self.phase = HurricanePhase::SpinningOthers;
        Ok(())
    }

    /// SpinningOthers → Propagating, accumulating this spin's winnings
    pub fn record_round(&mut self, round_win: f64) -> Result<(), PhaseError> {
        self.require(HurricanePhase::SpinningOthers, "record a round")?;
        self.accumulated_winnings += round_win;
        self.steps.push(HurricaneStep {
            column: self.active_column as usize,
            category: self.category,
            wild: self.substitution,
            round_win,
        });
        self.phase = HurricanePhase::Propagating;
        Ok(())
    }

    /// Propagating → Targeting (next column) or Terminated
    pub fn propagate(&mut self, step: CategoryStep) -> Result<Propagation, PhaseError> {
        self.require(HurricanePhase::Propagating, "propagate")?;
        self.wild_trail.push(self.active_column as usize);
        self.active_column -= 1;
        self.substitution = None;

        if self.active_column >= 0 {
            let previous = self.category;
            self.category = walk_category(previous, step);
            self.phase = HurricanePhase::Targeting;
            if previous != self.category {
                log::info!(
                    "[Hurricane] Category {} -> {} at column {}",
                    previous,
                    self.category,
                    self.active_column
                );
            }
            return Ok(Propagation::Continue {
                column: self.active_column as usize,
                previous_category: previous,
                category: self.category,
            });
        }

        self.phase = HurricanePhase::Terminated;
        let outcome = HurricaneOutcome {
            steps: self.steps.clone(),
            accumulated_winnings: self.accumulated_winnings,
            final_category: self.category,
            final_payout: self.accumulated_winnings * self.category as f64,
        };
        log::info!(
            "[Hurricane] Terminated: {:.2} x{} = {:.2}",
            outcome.accumulated_winnings,
            outcome.final_category,
            outcome.final_payout
        );
        Ok(Propagation::Terminated(outcome))
    }

    /// Back to idle, dropping all round state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> HurricanePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != HurricanePhase::Idle
    }

    pub fn active_column(&self) -> i32 {
        self.active_column
    }

    pub fn category(&self) -> u8 {
        self.category
    }

    pub fn accumulated_winnings(&self) -> f64 {
        self.accumulated_winnings
    }

    pub fn substitution(&self) -> Option<WildSubstitution> {
        self.substitution
    }

    pub fn wild_trail(&self) -> &[usize] {
        &self.wild_trail
    }

    pub fn steps(&self) -> &[HurricaneStep] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run_to_propagating(state: &mut HurricaneState, round_win: f64) {
        state.select().unwrap();
        state.expand(WildSubstitution::Themed(21)).unwrap();
        state.spin_others().unwrap();
        state.record_round(round_win).unwrap();
    }

    #[test]
    fn test_walk_category_bounds() {
        assert_eq!(walk_category(5, CategoryStep::Up), 5);
        assert_eq!(walk_category(1, CategoryStep::Down), 1);
        assert_eq!(walk_category(3, CategoryStep::Up), 4);
        assert_eq!(walk_category(3, CategoryStep::Down), 2);
        for category in MIN_CATEGORY..=MAX_CATEGORY {
            for step in [CategoryStep::Up, CategoryStep::Down] {
                let next = walk_category(category, step);
                assert!((MIN_CATEGORY..=MAX_CATEGORY).contains(&next));
                assert!(next.abs_diff(category) <= 1);
            }
        }
    }

    #[test]
    fn test_storm_speed() {
        assert_eq!(storm_speed(4, 2, 8.0, 2.5, 1.5), 20.0);
        assert_eq!(storm_speed(0, 2, 8.0, 2.5, 1.5), -12.0);
        assert_eq!(storm_speed(2, 2, 8.0, 2.5, 1.5), 0.0);
        // Departed hurricane: every column is right of it
        assert_eq!(storm_speed(0, -1, 8.0, 2.5, 1.5), 20.0);
    }

    #[test]
    fn test_termination_after_five_cycles() {
        let mut state = HurricaneState::new();
        state.begin_with(5, 3).unwrap();
        assert_eq!(state.active_column(), 4);

        let wins = [10.0, 0.0, 25.0, 5.5, 100.0];
        let steps = [
            CategoryStep::Up,
            CategoryStep::Up,
            CategoryStep::Up,
            CategoryStep::Down,
            CategoryStep::Down,
        ];
        let mut outcome = None;
        for (i, (&win, &step)) in wins.iter().zip(steps.iter()).enumerate() {
            run_to_propagating(&mut state, win);
            match state.propagate(step).unwrap() {
                Propagation::Continue { column, .. } => {
                    assert_eq!(column, 3 - i);
                    assert_eq!(state.phase(), HurricanePhase::Targeting);
                }
                Propagation::Terminated(done) => outcome = Some(done),
            }
        }

        let outcome = outcome.unwrap();
        assert_eq!(state.active_column(), -1);
        assert_eq!(state.phase(), HurricanePhase::Terminated);
        // 3 → 4 → 5 → 5 (rejected) → 4; the last step is not applied after the final column
        assert_eq!(outcome.final_category, 4);
        assert_relative_eq!(outcome.accumulated_winnings, wins.iter().sum::<f64>());
        assert_relative_eq!(outcome.final_payout, 140.5 * 4.0);
        assert_eq!(outcome.steps.len(), 5);
        assert_eq!(state.wild_trail(), &[4, 3, 2, 1, 0]);

        state.reset();
        assert_eq!(state.phase(), HurricanePhase::Idle);
        assert!(!state.is_active());
    }

    #[test]
    fn test_wrong_phase_rejected() {
        let mut state = HurricaneState::new();
        assert!(state.select().is_err());
        assert!(state.record_round(1.0).is_err());

        state.begin_with(5, 2).unwrap();
        let err = state.begin_with(5, 2).unwrap_err();
        assert_eq!(err.phase, HurricanePhase::Targeting);
        // State unchanged by the rejected call
        assert_eq!(state.category(), 2);
        assert!(state.expand(WildSubstitution::Fallback(11)).is_err());
    }

    #[test]
    fn test_begin_random_category() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let mut state = HurricaneState::new();
            state.begin(5, &mut rng).unwrap();
            assert!((MIN_CATEGORY..=MAX_CATEGORY).contains(&state.category()));
        }
    }

    #[test]
    fn test_empty_grid_rejected() {
        let mut state = HurricaneState::new();
        assert!(state.begin_with(0, 1).is_err());
        assert_eq!(state.phase(), HurricanePhase::Idle);
    }
}
