//! Game session: owns all mutable game state and drives it frame by frame
//!
//! The host calls [`GameSession::trigger_spin`] to start a round and
//! [`GameSession::tick`] once per animation frame. Every deferred step of a
//! round is a [`SessionEvent`] in the timer queue tagged with the round's
//! [`RoundToken`]; an event whose token or phase no longer matches is counted
//! as stale and dropped.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::hurricane::{
    CategoryStep, HurricaneOutcome, HurricanePhase, HurricaneState, PhaseError, Propagation,
    storm_speed,
};
use crate::lattice::{Lattice, ReelLattice};
use crate::paytable::{EvaluationResult, PayEvaluator};
use crate::render::{ColumnHandle, NullRenderer, OverlayKind, OverlayParams, RenderFacade};
use crate::scheduler::{SchedulerState, SpinScheduler};
use crate::symbols::SymbolCatalog;
use crate::timers::{Fired, RoundToken, TimerQueue};

/// Host-facing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Invalid bet: {0}")]
    InvalidBet(f64),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hurricane error: {0}")]
    Phase(#[from] PhaseError),
}

/// Deferred round steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show decoy frame `frame`
    DecoyFrame { frame: u32 },
    /// Decoy finished; fill the column with the wild
    Expand,
    /// Start the columns around the hurricane
    SpinOthers,
    /// Move the hurricane on
    Propagate,
}

/// Kind of round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundKind {
    /// All columns spin once and are paid
    Regular,
    /// Walking-wild sequence over every column
    Hurricane,
}

/// Completed round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub token: RoundToken,
    pub kind: RoundKind,
    pub bet: f64,
    /// One evaluation per settled spin, in order
    pub evaluations: Vec<EvaluationResult>,
    /// Regular: the spin's win. Hurricane: accumulated winnings times final category.
    pub total_win: f64,
    pub hurricane: Option<HurricaneOutcome>,
    /// Lattice of the last settled spin
    pub lattice: Lattice,
    pub free_spins_triggered: bool,
}

impl RoundResult {
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds: u64,
    pub hurricanes: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub max_win: f64,
    pub free_spin_triggers: u64,
    pub rejected_triggers: u64,
    pub stale_events: u64,
    pub asset_fallbacks: u64,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.rounds > 0 {
            (self.wins as f64 / self.rounds as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveRound {
    token: RoundToken,
    kind: RoundKind,
    bet: f64,
    /// A spin is running and its settle has not been handled yet
    awaiting_settle: bool,
    stops_scheduled: bool,
    evaluations: Vec<EvaluationResult>,
}

/// Hurricane slot game session
pub struct GameSession<R: RenderFacade = NullRenderer> {
    config: GameConfig,
    catalog: SymbolCatalog,
    evaluator: PayEvaluator,
    lattice: ReelLattice,
    scheduler: SpinScheduler,
    hurricane: HurricaneState,
    timers: TimerQueue<SessionEvent>,
    rng: ChaCha8Rng,
    renderer: R,
    handles: Vec<ColumnHandle>,
    round: Option<ActiveRound>,
    next_token: u64,
    last_result: Option<RoundResult>,
    stats: SessionStats,
}

impl<R: RenderFacade> GameSession<R> {
    /// Create a session with an OS-seeded RNG
    pub fn new(config: GameConfig, renderer: R) -> Result<Self, SessionError> {
        Self::with_rng(config, renderer, ChaCha8Rng::from_os_rng())
    }

    /// Create a reproducible session
    pub fn with_seed(config: GameConfig, renderer: R, seed: u64) -> Result<Self, SessionError> {
        Self::with_rng(config, renderer, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, mut renderer: R, rng: ChaCha8Rng) -> Result<Self, SessionError> {
        config.validate()?;
        let catalog = SymbolCatalog::hurricane();
        let evaluator = PayEvaluator::new(config.evaluation, config.paylines.clone());
        let lattice = ReelLattice::new(config.columns, config.rows, config.cell_size);
        let handles = (0..config.columns)
            .map(|c| renderer.create_column_visual(c, config.cells_per_column()))
            .collect();

        let mut session = Self {
            config,
            catalog,
            evaluator,
            lattice,
            scheduler: SpinScheduler::new(),
            hurricane: HurricaneState::new(),
            timers: TimerQueue::new(),
            rng,
            renderer,
            handles,
            round: None,
            next_token: 1,
            last_result: None,
            stats: SessionStats::default(),
        };
        session.repopulate();
        session.project();
        log::info!(
            "[Session] Ready: {}x{} grid, {:?} evaluation, hurricane {}",
            session.config.columns,
            session.config.rows,
            session.config.evaluation,
            if session.config.hurricane_enabled { "on" } else { "off" }
        );
        Ok(session)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HOST API
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start one round. Rejected while a round is in progress; state is left untouched.
    pub fn trigger_spin(&mut self, bet: f64) -> Result<RoundToken, SessionError> {
        if self.is_spinning() {
            self.stats.rejected_triggers += 1;
            log::warn!("[Session] Trigger ignored: round in progress");
            return Err(SessionError::InvalidState("round in progress"));
        }
        if !bet.is_finite() || bet <= 0.0 {
            return Err(SessionError::InvalidBet(bet));
        }

        let token = RoundToken(self.next_token);
        self.next_token += 1;
        // Anything left over belongs to an older round
        self.timers.cancel_all();
        self.clear_round_overlays();

        let kind = if self.config.hurricane_enabled {
            RoundKind::Hurricane
        } else {
            RoundKind::Regular
        };
        self.round = Some(ActiveRound {
            token,
            kind,
            bet,
            awaiting_settle: false,
            stops_scheduled: false,
            evaluations: Vec::new(),
        });
        self.stats.rounds += 1;
        self.stats.total_bet += bet;
        log::info!("[Session] {} started: {:?}, bet {:.2}", token, kind, bet);

        match kind {
            RoundKind::Regular => {
                self.scheduler
                    .start_all(&mut self.lattice, self.config.base_spin_speed);
                self.mark_spin_started();
            }
            RoundKind::Hurricane => {
                self.stats.hurricanes += 1;
                self.repopulate();
                self.hurricane.begin(self.config.columns, &mut self.rng)?;
                self.begin_column_visit(token)?;
            }
        }
        self.project();
        Ok(token)
    }

    /// Advance one animation frame by `dt_ms`
    pub fn tick(&mut self, dt_ms: f64) {
        for fired in self.timers.advance(dt_ms) {
            self.handle_event(fired);
        }

        if self.scheduler.is_spinning() {
            let draw_policy = self.config.draw;
            let catalog = &self.catalog;
            let rng = &mut self.rng;
            self.scheduler
                .tick(dt_ms, &mut self.lattice, || draw_policy.draw(rng, catalog));

            let ready_to_stop = self.scheduler.state() == SchedulerState::Spinning
                && self
                    .scheduler
                    .all_columns_spun_at_least(&self.lattice, self.config.min_symbols_spun);
            if let Some(round) = self.round.as_mut() {
                if ready_to_stop && !round.stops_scheduled {
                    round.stops_scheduled = true;
                    self.scheduler
                        .stop_staggered(&self.lattice, self.config.stagger_delay_ms);
                }
            }
        }

        let settled = self.scheduler.state() == SchedulerState::Settled
            && self.round.as_ref().is_some_and(|r| r.awaiting_settle);
        if settled {
            self.on_settled();
        }

        self.project();
    }

    /// A round is in progress
    pub fn is_spinning(&self) -> bool {
        self.round.is_some()
    }

    /// Last captured lattice
    pub fn lattice_snapshot(&self) -> Lattice {
        self.lattice.settled().clone()
    }

    pub fn last_round_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    /// Read-only hurricane state for overlays
    pub fn hurricane(&self) -> &HurricaneState {
        &self.hurricane
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn reels(&self) -> &ReelLattice {
        &self.lattice
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Token of the round in progress
    pub fn current_round(&self) -> Option<RoundToken> {
        self.round.as_ref().map(|r| r.token)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ROUND FLOW
    // ═══════════════════════════════════════════════════════════════════════════

    fn repopulate(&mut self) {
        let draw_policy = self.config.draw;
        let catalog = &self.catalog;
        let rng = &mut self.rng;
        self.lattice.populate(|| draw_policy.draw(rng, catalog));
    }

    fn mark_spin_started(&mut self) {
        if let Some(round) = self.round.as_mut() {
            round.awaiting_settle = true;
            round.stops_scheduled = false;
        }
    }

    /// Targeting → Selecting: lock the column and start the decoy
    fn begin_column_visit(&mut self, token: RoundToken) -> Result<(), PhaseError> {
        let (column, category) = self.hurricane.select()?;
        self.lattice.set_locked(column, true);
        self.renderer.set_column_locked(column, true);
        self.renderer
            .play_decoy_animation(column, category, self.config.timing.decoy_duration());
        self.timers.schedule(
            self.config.timing.decoy_delay(0),
            token,
            SessionEvent::DecoyFrame { frame: 0 },
        );
        Ok(())
    }

    fn handle_event(&mut self, fired: Fired<SessionEvent>) {
        let Some(token) = self.current_round().filter(|t| *t == fired.token) else {
            self.stale(&fired, "round mismatch");
            return;
        };
        let expected = match fired.event {
            SessionEvent::DecoyFrame { .. } | SessionEvent::Expand => HurricanePhase::Selecting,
            SessionEvent::SpinOthers => HurricanePhase::Expanding,
            SessionEvent::Propagate => HurricanePhase::Propagating,
        };
        if self.hurricane.phase() != expected {
            self.stale(&fired, "phase mismatch");
            return;
        }

        let result = match fired.event {
            SessionEvent::DecoyFrame { frame } => {
                self.decoy_frame(token, frame);
                Ok(())
            }
            SessionEvent::Expand => self.expand(token),
            SessionEvent::SpinOthers => self.spin_others(),
            SessionEvent::Propagate => self.propagate(token),
        };
        if let Err(e) = result {
            log::warn!("[Session] {:?} failed: {}", fired.event, e);
        }
    }

    fn stale(&mut self, fired: &Fired<SessionEvent>, reason: &str) {
        self.stats.stale_events += 1;
        log::debug!(
            "[Session] Stale {:?} from {} dropped ({})",
            fired.event,
            fired.token,
            reason
        );
    }

    fn decoy_frame(&mut self, token: RoundToken, frame: u32) {
        let timing = &self.config.timing;
        let column = self.hurricane.active_column().max(0) as usize;
        let shown = timing.decoy_frame_category(frame, self.hurricane.category());
        self.renderer.show_decoy_frame(column, shown);

        let next = frame + 1;
        if next < timing.decoy_cycles {
            let delay = timing.decoy_delay(next);
            self.timers
                .schedule(delay, token, SessionEvent::DecoyFrame { frame: next });
        } else {
            let hold = timing.decoy_hold_ms;
            self.timers.schedule(hold, token, SessionEvent::Expand);
        }
    }

    /// Selecting → Expanding: fill the column with the category wild
    fn expand(&mut self, token: RoundToken) -> Result<(), PhaseError> {
        let category = self.hurricane.category();
        let renderer = &self.renderer;
        let substitution = self
            .catalog
            .resolve_category_wild(category, |texture| renderer.has_texture(texture));
        if substitution.is_fallback() {
            self.stats.asset_fallbacks += 1;
            log::warn!(
                "[Session] Category {} wild asset missing, using generic wild",
                category
            );
        }

        let column = self.hurricane.expand(substitution)?;
        if let Some(reel) = self.lattice.column_mut(column) {
            reel.force_full_wild(substitution.symbol());
            reel.set_speed(0.0);
        }
        self.renderer.show_overlay(
            OverlayKind::HurricaneColumn,
            &OverlayParams::HurricaneColumn { column, category },
        );
        self.timers.schedule(
            self.config.timing.expand_delay_ms,
            token,
            SessionEvent::SpinOthers,
        );
        Ok(())
    }

    /// Expanding → SpinningOthers
    fn spin_others(&mut self) -> Result<(), PhaseError> {
        self.hurricane.spin_others()?;
        self.renderer.clear_overlay(OverlayKind::WinLine);

        let active = self.hurricane.active_column();
        let base = self.config.base_spin_speed;
        let storm = self.config.storm_speed_multiplier;
        let post = self.config.post_storm_speed_multiplier;
        self.scheduler.start_with(&mut self.lattice, |column| {
            storm_speed(column, active, base, storm, post)
        });
        self.mark_spin_started();
        Ok(())
    }

    /// Settle: capture, evaluate, then finish (regular) or record the step (hurricane)
    fn on_settled(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        round.awaiting_settle = false;
        let (token, kind, bet) = (round.token, round.kind, round.bet);

        let lattice = self.lattice.capture();
        let evaluation = self.evaluator.evaluate(lattice, &self.catalog, bet);
        for win in &evaluation.wins {
            self.renderer.show_overlay(
                OverlayKind::WinLine,
                &OverlayParams::WinLine {
                    line_index: win.line_index,
                    positions: win.positions.clone(),
                    payout: win.payout,
                },
            );
        }
        if evaluation.free_spins_triggered {
            self.stats.free_spin_triggers += 1;
        }
        let round_win = evaluation.total_win;
        if let Some(round) = self.round.as_mut() {
            round.evaluations.push(evaluation);
        }

        match kind {
            RoundKind::Regular => {
                self.scheduler.reset();
                self.finish_round(round_win, None);
            }
            RoundKind::Hurricane => {
                if let Err(e) = self.hurricane.record_round(round_win) {
                    log::warn!("[Session] Settle outside of a hurricane spin: {}", e);
                    return;
                }
                self.scheduler.reset();
                log::debug!(
                    "[Session] Column {} paid {:.2}, accumulated {:.2}",
                    self.hurricane.active_column(),
                    round_win,
                    self.hurricane.accumulated_winnings()
                );
                self.timers.schedule(
                    self.config.timing.propagate_delay_ms,
                    token,
                    SessionEvent::Propagate,
                );
            }
        }
    }

    /// Propagating → next column or termination
    fn propagate(&mut self, token: RoundToken) -> Result<(), PhaseError> {
        let departed = self.hurricane.active_column().max(0) as usize;
        let step = CategoryStep::flip(&mut self.rng);

        match self.hurricane.propagate(step)? {
            Propagation::Continue { .. } => {
                // The departed column rejoins the spin pool but stays hidden behind its marker
                self.lattice.set_locked(departed, false);
                self.renderer.clear_overlay(OverlayKind::HurricaneColumn);
                self.renderer.show_overlay(
                    OverlayKind::WildTrail,
                    &OverlayParams::WildTrail {
                        columns: self.hurricane.wild_trail().to_vec(),
                    },
                );
                self.begin_column_visit(token)
            }
            Propagation::Terminated(outcome) => {
                let total = outcome.final_payout;
                self.finish_round(total, Some(outcome));
                Ok(())
            }
        }
    }

    fn finish_round(&mut self, total_win: f64, outcome: Option<HurricaneOutcome>) {
        let Some(round) = self.round.take() else {
            return;
        };
        self.timers.cancel_all();
        self.scheduler.reset();

        if round.kind == RoundKind::Hurricane {
            self.renderer.clear_overlay(OverlayKind::HurricaneColumn);
            self.renderer.clear_overlay(OverlayKind::WildTrail);
            for column in 0..self.lattice.column_count() {
                self.renderer.set_column_locked(column, false);
            }
            self.lattice.unlock_all();
            self.hurricane.reset();
        }

        let free_spins_triggered = round.evaluations.iter().any(|e| e.free_spins_triggered);
        let result = RoundResult {
            token: round.token,
            kind: round.kind,
            bet: round.bet,
            evaluations: round.evaluations,
            total_win,
            hurricane: outcome,
            lattice: self.lattice.settled().clone(),
            free_spins_triggered,
        };

        self.stats.total_win += total_win;
        if result.is_win() {
            self.stats.wins += 1;
        }
        self.stats.max_win = self.stats.max_win.max(total_win);
        log::info!(
            "[Session] {} finished: win {:.2} over {} spin(s)",
            result.token,
            total_win,
            result.evaluations.len()
        );
        self.last_result = Some(result);
    }

    fn clear_round_overlays(&mut self) {
        self.renderer.clear_overlay(OverlayKind::WinLine);
        self.renderer.clear_overlay(OverlayKind::HurricaneColumn);
        self.renderer.clear_overlay(OverlayKind::WildTrail);
    }

    /// Push changed columns to the renderer
    fn project(&mut self) {
        for (column, handle) in self.lattice.columns_mut().iter_mut().zip(&self.handles) {
            if !column.take_dirty() {
                continue;
            }
            for (i, cell) in column.cells().iter().enumerate() {
                let texture = self.catalog.texture(cell.symbol).unwrap_or_default();
                self.renderer
                    .set_cell_texture(*handle, i, cell.symbol, texture);
                self.renderer.set_cell_offset(*handle, i, cell.position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use crate::timing::TimingConfig;

    fn studio_config() -> GameConfig {
        GameConfig {
            timing: TimingConfig::studio(),
            stagger_delay_ms: 10.0,
            ..GameConfig::hurricane()
        }
    }

    #[test]
    fn test_new_projects_all_columns() {
        let session = GameSession::with_seed(GameConfig::hurricane(), RecordingRenderer::new(), 1).unwrap();
        assert!(!session.is_spinning());
        assert!(session.lattice_snapshot().is_complete());
        assert_eq!(session.renderer().texture_updates, 5 * 8);
        assert!(session.last_round_result().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            rows: 0,
            ..GameConfig::hurricane()
        };
        assert!(matches!(
            GameSession::with_seed(config, NullRenderer, 1),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_bet() {
        let mut session = GameSession::with_seed(studio_config(), NullRenderer, 1).unwrap();
        assert!(matches!(session.trigger_spin(0.0), Err(SessionError::InvalidBet(_))));
        assert!(matches!(session.trigger_spin(f64::NAN), Err(SessionError::InvalidBet(_))));
        assert!(!session.is_spinning());
        assert_eq!(session.stats().rounds, 0);
    }

    #[test]
    fn test_stale_token_dropped() {
        let mut session = GameSession::with_seed(studio_config(), NullRenderer, 3).unwrap();
        let token = session.trigger_spin(1.0).unwrap();
        let phase = session.hurricane().phase();

        session
            .timers
            .schedule(0.0, RoundToken(token.0 + 100), SessionEvent::Propagate);
        session.tick(0.0);

        assert_eq!(session.stats().stale_events, 1);
        assert_eq!(session.hurricane().phase(), phase);
        assert_eq!(session.current_round(), Some(token));
    }

    #[test]
    fn test_wrong_phase_event_dropped() {
        let mut session = GameSession::with_seed(studio_config(), NullRenderer, 3).unwrap();
        let token = session.trigger_spin(1.0).unwrap();
        assert_eq!(session.hurricane().phase(), HurricanePhase::Selecting);

        // Right round, wrong phase
        session.timers.schedule(0.0, token, SessionEvent::Propagate);
        session.tick(0.0);
        assert_eq!(session.stats().stale_events, 1);
        assert_eq!(session.hurricane().phase(), HurricanePhase::Selecting);
    }

    #[test]
    fn test_hurricane_locks_rightmost_column() {
        let mut session = GameSession::with_seed(studio_config(), RecordingRenderer::new(), 9).unwrap();
        session.trigger_spin(1.0).unwrap();

        assert_eq!(session.hurricane().active_column(), 4);
        assert!(session.reels().column(4).unwrap().is_locked());
        assert_eq!(session.reels().unlocked_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stats_rates() {
        let stats = SessionStats {
            rounds: 4,
            wins: 1,
            total_bet: 40.0,
            total_win: 30.0,
            ..SessionStats::default()
        };
        assert_eq!(stats.rtp(), 75.0);
        assert_eq!(stats.hit_rate(), 25.0);
        assert_eq!(SessionStats::default().rtp(), 0.0);
    }
}
