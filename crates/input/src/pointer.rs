use crate::ControlAction;

/// Pointer buttons that start a camera drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Rotates.
    Primary,
    /// Dollies.
    Middle,
    /// Pans.
    Secondary,
}

/// Tracks button and cursor state and turns drags into [`ControlAction`]s.
#[derive(Debug, Default)]
pub struct PointerTracker {
    dragging: Option<PointerButton>,
    last: Option<(f32, f32)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<PointerButton> {
        self.dragging
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match (pressed, self.dragging) {
            (true, None) => {
                tracing::trace!(?button, "drag start");
                self.dragging = Some(button);
            }
            (false, Some(active)) if active == button => {
                tracing::trace!(?button, "drag end");
                self.dragging = None;
            }
            _ => {}
        }
    }

    /// Record a cursor position; returns the drag action, if any.
    pub fn moved(&mut self, x: f32, y: f32) -> Option<ControlAction> {
        let previous = self.last.replace((x, y));
        let button = self.dragging?;
        let (px, py) = previous?;
        let (dx, dy) = (x - px, y - py);

        let action = match button {
            PointerButton::Primary => ControlAction::Rotate { dx, dy },
            PointerButton::Secondary => ControlAction::Pan { dx, dy },
            // Dragging down moves away from the target.
            PointerButton::Middle => ControlAction::Dolly {
                steps: if dy == 0.0 { 0.0 } else { -dy.signum() },
            },
        };
        (!action.is_noop()).then_some(action)
    }

    /// Wheel input; positive `delta_y` scrolls up, which moves in.
    pub fn wheel(&mut self, delta_y: f32) -> Option<ControlAction> {
        if delta_y == 0.0 {
            return None;
        }
        Some(ControlAction::Dolly {
            steps: delta_y.signum(),
        })
    }

    /// Forget the cursor, e.g. when it leaves the window.
    pub fn left(&mut self) {
        self.last = None;
        self.dragging = None;
    }
}
