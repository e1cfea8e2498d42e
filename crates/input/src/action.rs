/// A camera control request produced from pointer input.
///
/// Deltas are in logical pixels; the controller scales them by the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Orbit around the target.
    Rotate { dx: f32, dy: f32 },
    /// Translate camera and target together in the view plane.
    Pan { dx: f32, dy: f32 },
    /// Move along the view axis. Positive steps move toward the target.
    Dolly { steps: f32 },
}

impl ControlAction {
    /// Whether applying this action would change nothing.
    pub fn is_noop(&self) -> bool {
        match *self {
            ControlAction::Rotate { dx, dy } | ControlAction::Pan { dx, dy } => {
                dx == 0.0 && dy == 0.0
            }
            ControlAction::Dolly { steps } => steps == 0.0,
        }
    }
}
