//! Writing pipeline state onto renderer-owned scene objects.
//!
//! The renderer owns the scene graph. It exposes the handful of objects the pipeline drives
//! through the [`SceneSink`] trait. [`HeadlessScene`] is an in-memory implementation without any
//! rendering attached, used for replays and tests.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::gesture::Role;
use crate::pipeline::{HandState, ObjectState};

/// One of the two tracking markers of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Thumb,
    Index,
}

/// Update access to the scene objects driven by the pipeline.
pub trait SceneSink {
    /// Sets the scale of the controlled object.
    fn set_object_scale(&mut self, scale: &Vector3<f32>);

    /// Sets the rotation of the controlled object about its X and Y axes, in radians.
    ///
    /// Rotation about Z is never driven and should be left untouched.
    fn set_object_rotation(&mut self, rotation: &Vector2<f32>);

    fn set_marker_position(&mut self, role: Role, marker: Marker, position: &Point3<f32>);

    /// Replaces the vertex positions of a hand's connecting segment.
    ///
    /// `positions` holds start XYZ followed by end XYZ. Implementations must flag the geometry
    /// for re-upload before the next draw.
    fn set_segment(&mut self, role: Role, positions: &[f32; 6]);

    /// Moves a hand's overlay label to a position in screen pixels.
    fn set_label_position(&mut self, role: Role, position: &Point2<f32>);
}

/// Writes the controlled object's transform to `sink`.
pub fn write_object<S: SceneSink + ?Sized>(sink: &mut S, object: &ObjectState) {
    sink.set_object_scale(&object.scale);
    sink.set_object_rotation(&object.rotation);
}

/// Writes a hand's markers and segment to `sink`.
pub fn write_hand<S: SceneSink + ?Sized>(sink: &mut S, role: Role, hand: &HandState) {
    sink.set_marker_position(role, Marker::Thumb, &hand.thumb);
    sink.set_marker_position(role, Marker::Index, &hand.index);
    sink.set_segment(role, &hand.segment);
}

/// The object whose transform is driven by the gestures.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub scale: Vector3<f32>,
    /// Euler angles about X, Y and Z.
    pub rotation: Vector3<f32>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            scale: Vector3::repeat(1.0),
            rotation: Vector3::zeros(),
        }
    }
}

/// Line geometry with two vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentGeometry {
    positions: [f32; 6],
    needs_update: bool,
}

impl SegmentGeometry {
    pub fn positions(&self) -> &[f32; 6] {
        &self.positions
    }

    pub fn start(&self) -> Point3<f32> {
        let [x, y, z, ..] = self.positions;
        Point3::new(x, y, z)
    }

    pub fn end(&self) -> Point3<f32> {
        let [_, _, _, x, y, z] = self.positions;
        Point3::new(x, y, z)
    }

    pub fn set_positions(&mut self, positions: &[f32; 6]) {
        self.positions = *positions;
        self.needs_update = true;
    }

    /// Whether the positions changed since the renderer last uploaded them.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Clears the update flag, returning whether it was set.
    ///
    /// Renderers call this right before uploading the vertex data.
    pub fn take_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }
}

/// A 2D text element positioned in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    text: &'static str,
    position: Option<Point2<f32>>,
}

impl LabelAnchor {
    pub fn new(text: &'static str) -> Self {
        Self {
            text,
            position: None,
        }
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    /// Returns the label's screen position, or [`None`] if it was never placed.
    pub fn position(&self) -> Option<Point2<f32>> {
        self.position
    }
}

/// The scene objects attached to a single hand role.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObjects {
    pub thumb: Point3<f32>,
    pub index: Point3<f32>,
    pub segment: SegmentGeometry,
    pub label: LabelAnchor,
}

impl HandObjects {
    fn new(role: Role) -> Self {
        Self {
            thumb: Point3::origin(),
            index: Point3::origin(),
            segment: SegmentGeometry::default(),
            label: LabelAnchor::new(role.label()),
        }
    }
}

/// A scene that only stores what the pipeline writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessScene {
    pub object: SceneObject,
    hands: [HandObjects; 2],
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self {
            object: SceneObject::default(),
            hands: Role::ALL.map(HandObjects::new),
        }
    }
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hand(&self, role: Role) -> &HandObjects {
        &self.hands[role.index()]
    }

    pub fn hand_mut(&mut self, role: Role) -> &mut HandObjects {
        &mut self.hands[role.index()]
    }
}

impl SceneSink for HeadlessScene {
    fn set_object_scale(&mut self, scale: &Vector3<f32>) {
        self.object.scale = *scale;
    }

    fn set_object_rotation(&mut self, rotation: &Vector2<f32>) {
        self.object.rotation.x = rotation.x;
        self.object.rotation.y = rotation.y;
    }

    fn set_marker_position(&mut self, role: Role, marker: Marker, position: &Point3<f32>) {
        let hand = self.hand_mut(role);
        match marker {
            Marker::Thumb => hand.thumb = *position,
            Marker::Index => hand.index = *position,
        }
    }

    fn set_segment(&mut self, role: Role, positions: &[f32; 6]) {
        self.hand_mut(role).segment.set_positions(positions);
    }

    fn set_label_position(&mut self, role: Role, position: &Point2<f32>) {
        self.hand_mut(role).label.position = Some(*position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_scene() {
        let scene = HeadlessScene::new();
        assert_eq!(scene.object.scale, Vector3::repeat(1.0));
        assert_eq!(scene.object.rotation, Vector3::zeros());
        assert_eq!(scene.hand(Role::Scale).label.text(), "expand");
        assert_eq!(scene.hand(Role::Rotation).label.text(), "rotate");
        assert_eq!(scene.hand(Role::Scale).label.position(), None);
        assert!(!scene.hand(Role::Rotation).segment.needs_update());
    }

    #[test]
    fn segment_dirty_flag() {
        let mut scene = HeadlessScene::new();
        scene.set_segment(Role::Rotation, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let segment = &mut scene.hand_mut(Role::Rotation).segment;
        assert!(segment.needs_update());
        assert_eq!(segment.start(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(segment.end(), Point3::new(4.0, 5.0, 6.0));
        assert!(segment.take_update());
        assert!(!segment.needs_update());
        assert!(!segment.take_update());

        assert!(!scene.hand(Role::Scale).segment.needs_update());
    }

    #[test]
    fn rotation_leaves_z_alone() {
        let mut scene = HeadlessScene::new();
        scene.object.rotation.z = 0.25;
        scene.set_object_rotation(&Vector2::new(1.0, -1.0));
        assert_eq!(scene.object.rotation, Vector3::new(1.0, -1.0, 0.25));
    }

    #[test]
    fn write_hand_touches_only_its_role() {
        let mut scene = HeadlessScene::new();
        let hand = HandState {
            thumb: Point3::new(0.1, 0.2, 0.3),
            index: Point3::new(-0.1, -0.2, -0.3),
            segment: [0.1, 0.2, 0.3, -0.1, -0.2, -0.3],
        };
        write_hand(&mut scene, Role::Scale, &hand);

        let objects = scene.hand(Role::Scale);
        assert_eq!(objects.thumb, hand.thumb);
        assert_eq!(objects.index, hand.index);
        assert_eq!(objects.segment.positions(), &hand.segment);
        assert_eq!(scene.hand(Role::Rotation), HeadlessScene::new().hand(Role::Rotation));
    }
}
