//! Rendering facade
//!
//! The engine never reads anything back from the renderer except
//! [`RenderFacade::has_texture`]. Cell textures are a write-only projection of
//! the logical symbols.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Opaque handle returned by [`RenderFacade::create_column_visual`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnHandle(pub usize);

/// Overlay layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Border and category label on the expanded column
    HurricaneColumn,
    /// Static wild markers on columns the hurricane left
    WildTrail,
    /// Winning line highlight
    WinLine,
}

/// Data for one overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayParams {
    HurricaneColumn {
        column: usize,
        category: u8,
    },
    WildTrail {
        columns: Vec<usize>,
    },
    WinLine {
        line_index: u8,
        positions: Vec<(usize, usize)>,
        payout: f64,
    },
}

impl OverlayParams {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Self::HurricaneColumn { .. } => OverlayKind::HurricaneColumn,
            Self::WildTrail { .. } => OverlayKind::WildTrail,
            Self::WinLine { .. } => OverlayKind::WinLine,
        }
    }
}

/// Drawing surface consumed by the engine
pub trait RenderFacade {
    /// Create the visual for one column with `cells` sprites
    fn create_column_visual(&mut self, column: usize, cells: usize) -> ColumnHandle;

    fn set_cell_texture(&mut self, handle: ColumnHandle, cell: usize, symbol: SymbolId, texture: &str);

    fn set_cell_offset(&mut self, handle: ColumnHandle, cell: usize, position: f64);

    /// Hide (`true`) or show a column held by the hurricane
    fn set_column_locked(&mut self, column: usize, locked: bool);

    /// The category decoy starts on `column`; it will end on `final_category`
    /// after `duration_ms`. Frames arrive through [`RenderFacade::show_decoy_frame`].
    fn play_decoy_animation(&mut self, column: usize, final_category: u8, duration_ms: f64);

    /// One decoy frame
    fn show_decoy_frame(&mut self, _column: usize, _category: u8) {}

    fn show_overlay(&mut self, kind: OverlayKind, params: &OverlayParams);

    fn clear_overlay(&mut self, kind: OverlayKind);

    /// Whether an asset can be drawn. Missing category wilds fall back to the generic wild.
    fn has_texture(&self, _texture: &str) -> bool {
        true
    }
}

/// Renderer that draws nothing (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RenderFacade for NullRenderer {
    fn create_column_visual(&mut self, column: usize, _cells: usize) -> ColumnHandle {
        ColumnHandle(column)
    }

    fn set_cell_texture(&mut self, _: ColumnHandle, _: usize, _: SymbolId, _: &str) {}

    fn set_cell_offset(&mut self, _: ColumnHandle, _: usize, _: f64) {}

    fn set_column_locked(&mut self, _: usize, _: bool) {}

    fn play_decoy_animation(&mut self, _: usize, _: u8, _: f64) {}

    fn show_overlay(&mut self, _: OverlayKind, _: &OverlayParams) {}

    fn clear_overlay(&mut self, _: OverlayKind) {}
}

/// Non-cell renderer calls, in order
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateColumn { column: usize, cells: usize },
    ColumnLocked { column: usize, locked: bool },
    DecoyStarted { column: usize, final_category: u8 },
    DecoyFrame { column: usize, category: u8 },
    ShowOverlay(OverlayParams),
    ClearOverlay(OverlayKind),
}

/// Renderer that records what the engine asked for. Used by tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    /// Last symbol projected into each (column, cell)
    pub textures: HashMap<(usize, usize), SymbolId>,
    pub texture_updates: usize,
    pub offset_updates: usize,
    missing: HashSet<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `texture` as unavailable
    pub fn with_missing_texture(mut self, texture: impl Into<String>) -> Self {
        self.missing.insert(texture.into());
        self
    }

    /// Decoy frames shown so far, in order
    pub fn decoy_frames(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::DecoyFrame { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }

    /// Overlays shown so far of one kind
    pub fn overlays(&self, kind: OverlayKind) -> Vec<&OverlayParams> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::ShowOverlay(params) if params.kind() == kind => Some(params),
                _ => None,
            })
            .collect()
    }
}

impl RenderFacade for RecordingRenderer {
    fn create_column_visual(&mut self, column: usize, cells: usize) -> ColumnHandle {
        self.calls.push(RenderCall::CreateColumn { column, cells });
        ColumnHandle(column)
    }

    fn set_cell_texture(&mut self, handle: ColumnHandle, cell: usize, symbol: SymbolId, _texture: &str) {
        self.textures.insert((handle.0, cell), symbol);
        self.texture_updates += 1;
    }

    fn set_cell_offset(&mut self, _handle: ColumnHandle, _cell: usize, _position: f64) {
        self.offset_updates += 1;
    }

    fn set_column_locked(&mut self, column: usize, locked: bool) {
        self.calls.push(RenderCall::ColumnLocked { column, locked });
    }

    fn play_decoy_animation(&mut self, column: usize, final_category: u8, _duration_ms: f64) {
        self.calls.push(RenderCall::DecoyStarted {
            column,
            final_category,
        });
    }

    fn show_decoy_frame(&mut self, column: usize, category: u8) {
        self.calls.push(RenderCall::DecoyFrame { column, category });
    }

    fn show_overlay(&mut self, _kind: OverlayKind, params: &OverlayParams) {
        self.calls.push(RenderCall::ShowOverlay(params.clone()));
    }

    fn clear_overlay(&mut self, kind: OverlayKind) {
        self.calls.push(RenderCall::ClearOverlay(kind));
    }

    fn has_texture(&self, texture: &str) -> bool {
        !self.missing.contains(texture)
    }
}
