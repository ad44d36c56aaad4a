//! Placement of the 2D overlay labels.

use nalgebra::{Matrix4, Point2, Vector2};

use crate::coords::{to_screen, Viewport};
use crate::gesture::{Role, TrackedPair};
use crate::sink::SceneSink;

/// Default vertical label offset in pixels. Negative values move the label up.
pub const LABEL_OFFSET_Y: f32 = -120.0;

/// Keeps each hand's label floating above the segment between its tracked fingertips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacer {
    pub offset_y: f32,
}

impl Default for LabelPlacer {
    fn default() -> Self {
        Self {
            offset_y: LABEL_OFFSET_Y,
        }
    }
}

impl LabelPlacer {
    /// Computes the screen position of the label for `pair`.
    ///
    /// Returns [`None`] if the midpoint of the pair cannot be projected.
    pub fn label_position(
        &self,
        pair: &TrackedPair,
        view_projection: &Matrix4<f32>,
        viewport: Viewport,
    ) -> Option<Point2<f32>> {
        let screen = to_screen(&pair.midpoint(), view_projection, viewport)?;
        Some(screen + Vector2::new(0.0, self.offset_y))
    }

    /// Moves the label of `role` above `pair`.
    ///
    /// If no position can be computed, the label stays where it was.
    pub fn place<S: SceneSink + ?Sized>(
        &self,
        sink: &mut S,
        role: Role,
        pair: &TrackedPair,
        view_projection: &Matrix4<f32>,
        viewport: Viewport,
    ) {
        match self.label_position(pair, view_projection, viewport) {
            Some(pos) => sink.set_label_position(role, &pos),
            None => log::warn!("{role:?} label midpoint lies in the camera plane; not moving it"),
        }
    }
}
