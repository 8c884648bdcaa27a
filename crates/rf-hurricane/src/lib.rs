//! # rf-hurricane: Reel lattice and walking-wild hurricane engine
//!
//! Frame-driven round logic for a 5×5 (configurable) slot game with a
//! travelling expanding-wild bonus. Rendering is external and reached only
//! through the [`RenderFacade`] trait.
//!
//! ## Features
//!
//! - **Reel Columns**: Continuous cell motion, wraparound recycling, grid snap
//! - **Spin Scheduler**: Per-frame motion and staggered left-to-right stops
//! - **Hurricane**: Column targeting, category decoy, full-column wild, random-walk propagation
//! - **Evaluation**: Row-run or 15-payline policies with wild substitution
//! - **Timing Profiles**: Normal, Turbo, Studio (near-instant) decoy and phase pacing
//!
//! ## Architecture
//!
//! ```text
//! GameSession (trigger_spin / tick)
//!     │
//!     ├── TimerQueue<SessionEvent>  (round-token tagged deferrals)
//!     ├── HurricaneState            (phase machine, category walk)
//!     ├── SpinScheduler             (motion, staggered stops)
//!     │       │
//!     │       v
//!     ├── ReelLattice ── ReelColumn × COLS
//!     │       │
//!     │       v  settled Lattice
//!     ├── PayEvaluator + SymbolCatalog
//!     │       │
//!     │       v
//!     └── RoundResult ──> RenderFacade (cells, overlays, decoy)
//! ```

pub mod config;
pub mod hurricane;
pub mod lattice;
pub mod paytable;
pub mod reel;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod symbols;
pub mod timers;
pub mod timing;

pub use config::*;
pub use hurricane::*;
pub use lattice::*;
pub use paytable::*;
pub use reel::*;
pub use render::*;
pub use scheduler::*;
pub use session::*;
pub use symbols::*;
pub use timers::*;
pub use timing::*;
