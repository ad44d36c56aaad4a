//! Hand landmarks as delivered by the detector.
//!
//! The detector hands over loosely structured data ([`RawDetection`]). It is validated exactly
//! once, in [`DetectionResult::from_raw`], into fixed-size [`HandLandmarks`] records. Everything
//! downstream works with those.

use std::fmt;

use serde::Deserialize;

/// Number of landmarks the hand landmark network predicts per hand.
pub const NUM_LANDMARKS: usize = 21;

/// A landmark in normalized detection space.
///
/// `x` and `y` are in range 0.0 to 1.0 for points inside the camera image (with Y pointing down),
/// `z` is a depth relative to the wrist. Values outside of that range are passed through as-is.
#[derive(Debug, Default, PartialEq, PartialOrd, Clone, Copy)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The full set of landmarks of a single detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    landmarks: [Landmark; NUM_LANDMARKS],
}

impl HandLandmarks {
    pub fn new(landmarks: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Validates a landmark list coming from the detector.
    ///
    /// Fails unless `positions` contains exactly [`NUM_LANDMARKS`] entries.
    pub fn from_positions(positions: &[[f32; 3]]) -> Result<Self, LandmarkError> {
        if positions.len() != NUM_LANDMARKS {
            return Err(LandmarkError::WrongCount {
                expected: NUM_LANDMARKS,
                actual: positions.len(),
            });
        }

        let mut landmarks = [Landmark::default(); NUM_LANDMARKS];
        for (out, pos) in landmarks.iter_mut().zip(positions) {
            *out = Landmark::from(*pos);
        }
        Ok(Self { landmarks })
    }

    #[inline]
    pub fn get(&self, idx: LandmarkIdx) -> Landmark {
        self.landmarks[idx as usize]
    }

    #[inline]
    pub fn thumb_tip(&self) -> Landmark {
        self.get(LandmarkIdx::ThumbTip)
    }

    #[inline]
    pub fn index_tip(&self) -> Landmark {
        self.get(LandmarkIdx::IndexFingerTip)
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.landmarks.iter().copied()
    }
}

/// Which hand the detector believes it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Interprets the detector's classification label.
    ///
    /// Only the exact label `"Left"` maps to [`Handedness::Left`]. Everything else, including
    /// labels in other casing, is treated as [`Handedness::Right`].
    pub fn from_label(label: &str) -> Self {
        if label == "Left" {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// One detected hand, valid for a single detection frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub handedness: Handedness,
    pub landmarks: HandLandmarks,
}

/// A frame's worth of validated hand observations, in detector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    hands: Vec<HandObservation>,
}

impl DetectionResult {
    /// A detection result without any hands in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(hands: Vec<HandObservation>) -> Self {
        Self { hands }
    }

    /// Validates a raw detector payload.
    ///
    /// Hands with the wrong number of landmarks are dropped, as are all hands beyond the first
    /// `max_hands`. Neither is an error: the affected hand is simply absent from this frame.
    pub fn from_raw(raw: &RawDetection, max_hands: usize) -> Self {
        let mut hands = Vec::with_capacity(raw.hands.len().min(max_hands));
        for (i, hand) in raw.hands.iter().enumerate() {
            if hands.len() == max_hands {
                log::debug!(
                    "dropping {} hand(s) beyond the limit of {max_hands}",
                    raw.hands.len() - i
                );
                break;
            }

            match HandLandmarks::from_positions(&hand.landmarks) {
                Ok(landmarks) => hands.push(HandObservation {
                    handedness: Handedness::from_label(&hand.label),
                    landmarks,
                }),
                Err(e) => log::debug!("dropping hand #{i} ('{}'): {e}", hand.label),
            }
        }
        Self { hands }
    }

    pub fn hands(&self) -> &[HandObservation] {
        &self.hands
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

/// Detector output before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDetection {
    #[serde(default)]
    pub hands: Vec<RawHand>,
}

/// A single hand as reported by the detector: its handedness label and landmark positions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHand {
    pub label: String,
    pub landmarks: Vec<[f32; 3]>,
}

/// Errors produced when validating detector output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    /// The hand did not have the expected number of landmarks.
    WrongCount { expected: usize, actual: usize },
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongCount { expected, actual } => {
                write!(f, "expected {expected} landmarks, got {actual}")
            }
        }
    }
}

impl std::error::Error for LandmarkError {}
