//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, and
//! `Editor::dispatch` runs them. On macOS `meta` is ⌘; elsewhere `ctrl`
//! plays the same role.

use crate::editor::Editor;
use df_core::Vec2;

/// Points moved per arrow-key press; Shift multiplies by 10.
pub const NUDGE_STEP: f64 = 1.0;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,
    Deselect,
    Duplicate,
    Copy,
    Cut,
    Paste,
    /// Move the selection by whole steps; `large` means ×10.
    Nudge { dx: i8, dy: i8, large: bool },

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ZoomReset,
    ToggleGrid,
    ToggleSnap,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if let Some((dx, dy)) = arrow(key)
            && !cmd
        {
            return Some(ShortcutAction::Nudge {
                dx,
                dy,
                large: shift,
            });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                "1" => Some(ShortcutAction::ZoomReset),
                "'" => Some(ShortcutAction::ToggleGrid),
                ";" => Some(ShortcutAction::ToggleSnap),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<(i8, i8)> {
    match key {
        "ArrowLeft" => Some((-1, 0)),
        "ArrowRight" => Some((1, 0)),
        "ArrowUp" => Some((0, -1)),
        "ArrowDown" => Some((0, 1)),
        _ => None,
    }
}

impl Editor {
    /// Run a shortcut action. Returns true if anything changed.
    pub fn dispatch(&mut self, action: ShortcutAction) -> bool {
        log::trace!("dispatch {action:?}");
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.remove_selected() > 0,
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Deselect => self.deselect(),
            ShortcutAction::Duplicate => !self.duplicate_selection().is_empty(),
            ShortcutAction::Copy => self.copy() > 0,
            ShortcutAction::Cut => self.cut() > 0,
            ShortcutAction::Paste => !self.paste().is_empty(),
            ShortcutAction::Nudge { dx, dy, large } => {
                let step = if large { NUDGE_STEP * 10.0 } else { NUDGE_STEP };
                self.move_selection(Vec2::new(dx as f64 * step, dy as f64 * step))
            }
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ZoomToFit => self.zoom_to_fit(),
            ShortcutAction::ZoomReset => self.reset_view(),
            ShortcutAction::ToggleGrid => self.toggle_grid(),
            ShortcutAction::ToggleSnap => self.toggle_snap(),
            ShortcutAction::SendBackward => self.restack_selection(Restack::Backward),
            ShortcutAction::BringForward => self.restack_selection(Restack::Forward),
            ShortcutAction::SendToBack => self.restack_selection(Restack::ToBack),
            ShortcutAction::BringToFront => self.restack_selection(Restack::ToFront),
        }
    }
}

/// Z-order move applied to each selected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restack {
    Forward,
    Backward,
    ToFront,
    ToBack,
}
