//! Interpretation of hand poses as scale and rotation gestures.
//!
//! Each detection frame, the hands in it are assigned a [`Role`] based on the detector's own
//! handedness classification. There is no identity tracking across frames: whichever hand the
//! detector calls "Left" controls scale in that frame.

use std::f32::consts::PI;

use nalgebra::{distance, Point3, Vector2, Vector3};

use crate::coords::{to_scene_scaled, SCENE_SCALE};
use crate::landmark::{DetectionResult, HandLandmarks, Handedness};

/// The task a hand performs in a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Pinch distance controls the object's scale.
    Scale,
    /// Thumb/index displacement controls the object's rotation.
    Rotation,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Scale, Role::Rotation];

    #[inline]
    pub fn from_handedness(handedness: Handedness) -> Self {
        match handedness {
            Handedness::Left => Role::Scale,
            Handedness::Right => Role::Rotation,
        }
    }

    /// Text of the overlay label attached to this role's hand.
    pub fn label(self) -> &'static str {
        match self {
            Role::Scale => "expand",
            Role::Rotation => "rotate",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Thumb tip and index finger tip of one hand, in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPair {
    pub thumb: Point3<f32>,
    pub index: Point3<f32>,
}

impl TrackedPair {
    pub fn from_hand(hand: &HandLandmarks, scene_scale: f32) -> Self {
        Self {
            thumb: to_scene_scaled(hand.thumb_tip(), scene_scale),
            index: to_scene_scaled(hand.index_tip(), scene_scale),
        }
    }

    /// Euclidean distance between the two tips.
    pub fn pinch_distance(&self) -> f32 {
        distance(&self.thumb, &self.index)
    }

    /// Thumb position minus index position, projected onto the XY plane.
    pub fn displacement(&self) -> Vector2<f32> {
        (self.thumb - self.index).xy()
    }

    pub fn midpoint(&self) -> Point3<f32> {
        nalgebra::center(&self.thumb, &self.index)
    }
}

/// Maps pinch distance to a uniform scale factor: `base + distance * gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGesture {
    pub base: f32,
    pub gain: f32,
}

impl Default for ScaleGesture {
    fn default() -> Self {
        Self {
            base: 0.3,
            gain: 1.5,
        }
    }
}

impl ScaleGesture {
    pub fn scale_for_distance(&self, distance: f32) -> f32 {
        self.base + distance * self.gain
    }

    pub fn target(&self, pair: &TrackedPair) -> Vector3<f32> {
        Vector3::repeat(self.scale_for_distance(pair.pinch_distance()))
    }
}

/// Maps thumb/index displacement to rotation angles about the X and Y axes.
///
/// Vertical displacement tilts the object about X, horizontal displacement turns it about Y. The
/// resulting angles are not wrapped into any range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationGesture {
    pub gain: f32,
}

impl Default for RotationGesture {
    fn default() -> Self {
        Self { gain: PI * 5.0 }
    }
}

impl RotationGesture {
    /// Returns the target `(x, y)` rotation in radians.
    pub fn target(&self, pair: &TrackedPair) -> Vector2<f32> {
        let d = pair.displacement();
        Vector2::new(d.y * self.gain, d.x * self.gain)
    }
}

/// Per-role gesture targets computed from one detection frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureTargets {
    pub scale: Option<ScaleTarget>,
    pub rotation: Option<RotationTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTarget {
    pub pair: TrackedPair,
    pub scale: Vector3<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationTarget {
    pub pair: TrackedPair,
    /// Rotation about X and Y, in radians.
    pub rotation: Vector2<f32>,
}

impl GestureTargets {
    pub fn pair(&self, role: Role) -> Option<&TrackedPair> {
        match role {
            Role::Scale => self.scale.as_ref().map(|t| &t.pair),
            Role::Rotation => self.rotation.as_ref().map(|t| &t.pair),
        }
    }
}

/// Turns detection results into gesture targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureInterpreter {
    pub scene_scale: f32,
    pub scale: ScaleGesture,
    pub rotation: RotationGesture,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self {
            scene_scale: SCENE_SCALE,
            scale: ScaleGesture::default(),
            rotation: RotationGesture::default(),
        }
    }
}

impl GestureInterpreter {
    /// Assigns roles to the hands in `detection` and computes each present role's target.
    ///
    /// If two hands end up with the same role, the one reported later by the detector wins.
    pub fn interpret(&self, detection: &DetectionResult) -> GestureTargets {
        let mut pairs: [Option<TrackedPair>; 2] = [None, None];
        for hand in detection.hands() {
            let role = Role::from_handedness(hand.handedness);
            let slot = &mut pairs[role.index()];
            if slot.is_some() {
                log::trace!("two hands classified for {role:?}, keeping the later one");
            }
            *slot = Some(TrackedPair::from_hand(&hand.landmarks, self.scene_scale));
        }

        let [scale, rotation] = pairs;
        GestureTargets {
            scale: scale.map(|pair| ScaleTarget {
                pair,
                scale: self.scale.target(&pair),
            }),
            rotation: rotation.map(|pair| RotationTarget {
                pair,
                rotation: self.rotation.target(&pair),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::landmark::{HandObservation, Landmark, NUM_LANDMARKS};

    fn hand(handedness: Handedness, thumb: [f32; 3], index: [f32; 3]) -> HandObservation {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0); NUM_LANDMARKS];
        landmarks[4] = thumb.into();
        landmarks[8] = index.into();
        HandObservation {
            handedness,
            landmarks: HandLandmarks::new(landmarks),
        }
    }

    #[test]
    fn role_assignment() {
        assert_eq!(Role::from_handedness(Handedness::Left), Role::Scale);
        assert_eq!(Role::from_handedness(Handedness::Right), Role::Rotation);
        assert_eq!(Role::Scale.label(), "expand");
        assert_eq!(Role::Rotation.label(), "rotate");
    }

    #[test]
    fn pinch_scale() {
        let detection = DetectionResult::new(vec![hand(
            Handedness::Left,
            [0.5, 0.5, 0.0],
            [0.6, 0.5, 0.0],
        )]);
        let targets = GestureInterpreter::default().interpret(&detection);
        let scale = targets.scale.unwrap();
        assert_relative_eq!(scale.pair.pinch_distance(), 0.35, epsilon = 1e-5);
        assert_relative_eq!(scale.scale, Vector3::repeat(0.825), epsilon = 1e-5);
        assert!(targets.rotation.is_none());
    }

    #[test]
    fn zero_distance_gives_minimum_scale() {
        let detection = DetectionResult::new(vec![hand(
            Handedness::Left,
            [0.3, 0.7, 0.1],
            [0.3, 0.7, 0.1],
        )]);
        let targets = GestureInterpreter::default().interpret(&detection);
        assert_eq!(targets.scale.unwrap().scale, Vector3::repeat(0.3));
    }

    #[test]
    fn scale_is_monotonic_in_distance() {
        let gesture = ScaleGesture::default();
        let mut prev = gesture.scale_for_distance(0.0);
        assert_eq!(prev, 0.3);
        for i in 1..100 {
            let s = gesture.scale_for_distance(i as f32 * 0.05);
            assert!(s > prev);
            prev = s;
        }
    }

    #[test]
    fn displacement_rotation() {
        let detection = DetectionResult::new(vec![hand(
            Handedness::Right,
            [0.6, 0.5, 0.0],
            [0.5, 0.5, 0.0],
        )]);
        let targets = GestureInterpreter::default().interpret(&detection);
        let rot = targets.rotation.unwrap();
        assert_abs_diff_eq!(rot.rotation.x, 0.0, epsilon = 1e-6);
        // ~5.50 rad, deliberately not wrapped into [-π, π].
        assert_relative_eq!(rot.rotation.y, 0.35 * PI * 5.0, epsilon = 1e-4);
        assert!(rot.rotation.y > PI);
        assert!(targets.scale.is_none());
    }

    #[test]
    fn rotation_is_linear_in_displacement() {
        let gesture = RotationGesture::default();
        let pair = |dx: f32, dy: f32| TrackedPair {
            thumb: Point3::new(dx, dy, 0.7),
            index: Point3::origin(),
        };
        assert_eq!(gesture.target(&pair(0.0, 0.0)), Vector2::zeros());
        assert_relative_eq!(
            gesture.target(&pair(0.2, -0.1)),
            Vector2::new(-0.1 * PI * 5.0, 0.2 * PI * 5.0),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            gesture.target(&pair(0.4, -0.2)),
            gesture.target(&pair(0.2, -0.1)) * 2.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn both_hands() {
        let detection = DetectionResult::new(vec![
            hand(Handedness::Right, [0.5, 0.4, 0.0], [0.5, 0.5, 0.0]),
            hand(Handedness::Left, [0.5, 0.5, 0.0], [0.5, 0.5, 0.0]),
        ]);
        let targets = GestureInterpreter::default().interpret(&detection);
        assert_eq!(targets.scale.unwrap().scale, Vector3::repeat(0.3));
        let rot = targets.rotation.unwrap().rotation;
        // Thumb is above the index finger (smaller detection Y), so dy > 0.
        assert!(rot.x > 0.0);
        assert_abs_diff_eq!(rot.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn duplicate_role_keeps_later_hand() {
        let detection = DetectionResult::new(vec![
            hand(Handedness::Left, [0.5, 0.5, 0.0], [0.6, 0.5, 0.0]),
            hand(Handedness::Left, [0.5, 0.5, 0.0], [0.5, 0.5, 0.0]),
        ]);
        let targets = GestureInterpreter::default().interpret(&detection);
        assert_eq!(targets.scale.unwrap().scale, Vector3::repeat(0.3));
        assert!(targets.rotation.is_none());
    }

    #[test]
    fn no_hands_no_targets() {
        let targets = GestureInterpreter::default().interpret(&DetectionResult::empty());
        assert_eq!(targets, GestureTargets::default());
        assert!(targets.pair(Role::Scale).is_none());
    }

    #[test]
    fn midpoint() {
        let pair = TrackedPair {
            thumb: Point3::new(0.0, 1.0, 0.0),
            index: Point3::new(1.0, 0.0, 0.5),
        };
        assert_relative_eq!(pair.midpoint(), Point3::new(0.5, 0.5, 0.25));
    }
}
