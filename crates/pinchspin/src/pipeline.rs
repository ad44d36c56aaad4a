//! The landmark-to-transform pipeline.
//!
//! A [`PipelineContext`] owns everything that persists across frames: the configuration, the
//! smoothed state and the camera last reported by the renderer. Detection results are fed in via
//! [`PipelineContext::on_detection`]; render ticks update the camera via
//! [`PipelineContext::set_view`].

use std::f32::consts::PI;
use std::fmt;

use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use serde::Deserialize;

use crate::coords::{Camera, Viewport, SCENE_SCALE};
use crate::gesture::{
    GestureInterpreter, GestureTargets, Role, RotationGesture, ScaleGesture, TrackedPair,
};
use crate::landmark::{DetectionResult, RawDetection};
use crate::overlay::{LabelPlacer, LABEL_OFFSET_Y};
use crate::sink::{self, SceneSink};
use crate::smoothing::{InvalidFactor, Smoothing};

/// Pipeline tuning parameters.
///
/// All fields have defaults, so a deserialized config only needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub scene_scale: f32,
    pub marker_smoothing: f32,
    pub segment_smoothing: f32,
    pub scale_smoothing: f32,
    pub rotation_smoothing: f32,
    pub scale_base: f32,
    pub scale_gain: f32,
    pub rotation_gain: f32,
    pub label_offset_y: f32,
    pub max_hands: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scene_scale: SCENE_SCALE,
            marker_smoothing: 0.2,
            segment_smoothing: 0.2,
            scale_smoothing: 0.05,
            rotation_smoothing: 0.1,
            scale_base: 0.3,
            scale_gain: 1.5,
            rotation_gain: PI * 5.0,
            label_offset_y: LABEL_OFFSET_Y,
            max_hands: 2,
        }
    }
}

impl PipelineConfig {
    /// Sets the number of scene units covered by the detection image.
    pub fn scene_scale(self, scene_scale: f32) -> Self {
        Self {
            scene_scale,
            ..self
        }
    }

    /// Sets the smoothing factor of the tracking markers.
    pub fn marker_smoothing(self, factor: f32) -> Self {
        Self {
            marker_smoothing: factor,
            ..self
        }
    }

    /// Sets the smoothing factor of the connecting segments' endpoints.
    pub fn segment_smoothing(self, factor: f32) -> Self {
        Self {
            segment_smoothing: factor,
            ..self
        }
    }

    /// Sets the smoothing factor of the object's scale.
    pub fn scale_smoothing(self, factor: f32) -> Self {
        Self {
            scale_smoothing: factor,
            ..self
        }
    }

    /// Sets the smoothing factor of the object's rotation.
    pub fn rotation_smoothing(self, factor: f32) -> Self {
        Self {
            rotation_smoothing: factor,
            ..self
        }
    }

    /// Sets the vertical offset between a hand's segment midpoint and its label, in pixels.
    pub fn label_offset_y(self, offset: f32) -> Self {
        Self {
            label_offset_y: offset,
            ..self
        }
    }

    /// Sets the maximum number of hands taken from each detection result.
    pub fn max_hands(self, max_hands: usize) -> Self {
        Self { max_hands, ..self }
    }

    /// Checks that all smoothing factors are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.smoothers().map(drop)
    }

    fn smoothers(&self) -> Result<Smoothers, ConfigError> {
        let factor = |name: &'static str, value: f32| {
            Smoothing::try_new(value).map_err(|source| ConfigError::Smoothing { name, source })
        };
        Ok(Smoothers {
            marker: factor("marker_smoothing", self.marker_smoothing)?,
            segment: factor("segment_smoothing", self.segment_smoothing)?,
            scale: factor("scale_smoothing", self.scale_smoothing)?,
            rotation: factor("rotation_smoothing", self.rotation_smoothing)?,
        })
    }
}

/// Invalid [`PipelineConfig`] values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Smoothing {
        name: &'static str,
        source: InvalidFactor,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smoothing { name, source } => write!(f, "invalid `{name}`: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Smoothing { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Smoothers {
    marker: Smoothing,
    segment: Smoothing,
    scale: Smoothing,
    rotation: Smoothing,
}

/// Smoothed transform of the controlled object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectState {
    pub scale: Vector3<f32>,
    /// Rotation about X and Y, in radians.
    pub rotation: Vector2<f32>,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            scale: Vector3::repeat(1.0),
            rotation: Vector2::zeros(),
        }
    }
}

/// Smoothed marker and segment positions of one hand role.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandState {
    pub thumb: Point3<f32>,
    pub index: Point3<f32>,
    /// Segment start XYZ followed by end XYZ.
    pub segment: [f32; 6],
}

fn segment_positions(pair: &TrackedPair) -> [f32; 6] {
    let (a, b) = (pair.thumb, pair.index);
    [a.x, a.y, a.z, b.x, b.y, b.z]
}

/// Everything the pipeline smooths, persisted across frames.
///
/// A role's entries only change in frames where a hand for that role was observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedState {
    pub object: ObjectState,
    hands: [HandState; 2],
}

impl SmoothedState {
    pub fn hand(&self, role: Role) -> &HandState {
        &self.hands[role.index()]
    }

    fn hand_mut(&mut self, role: Role) -> &mut HandState {
        &mut self.hands[role.index()]
    }
}

/// Pipeline state shared by the detection and render paths.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: PipelineConfig,
    interpreter: GestureInterpreter,
    labels: LabelPlacer,
    smoothers: Smoothers,
    state: SmoothedState,
    camera: Camera,
    viewport: Viewport,
    detections: u64,
}

impl PipelineContext {
    /// Creates a context using the default [`Camera`] and [`Viewport`].
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let smoothers = config.smoothers()?;
        Ok(Self {
            interpreter: GestureInterpreter {
                scene_scale: config.scene_scale,
                scale: ScaleGesture {
                    base: config.scale_base,
                    gain: config.scale_gain,
                },
                rotation: RotationGesture {
                    gain: config.rotation_gain,
                },
            },
            labels: LabelPlacer {
                offset_y: config.label_offset_y,
            },
            smoothers,
            config,
            state: SmoothedState::default(),
            camera: Camera::default(),
            viewport: Viewport::default(),
            detections: 0,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &SmoothedState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of detection results processed so far, including empty ones.
    pub fn detections(&self) -> u64 {
        self.detections
    }

    /// Records the camera and viewport the renderer is currently drawing with.
    ///
    /// These are used to place labels for all following detection results.
    pub fn set_view(&mut self, camera: Camera, viewport: Viewport) {
        self.camera = camera;
        self.viewport = viewport;
    }

    /// Validates a raw detector payload and processes it like [`PipelineContext::on_detection`].
    pub fn on_raw_detection<S: SceneSink + ?Sized>(
        &mut self,
        raw: &RawDetection,
        sink: &mut S,
    ) -> GestureTargets {
        let detection = DetectionResult::from_raw(raw, self.config.max_hands);
        self.on_detection(&detection, sink)
    }

    /// Advances the smoothed state by one detection frame and writes it to `sink`.
    ///
    /// Roles without a hand in `detection` are left exactly as they were, and nothing is written
    /// for them. Returns the unsmoothed targets computed for this frame.
    pub fn on_detection<S: SceneSink + ?Sized>(
        &mut self,
        detection: &DetectionResult,
        sink: &mut S,
    ) -> GestureTargets {
        self.detections += 1;
        let targets = self.interpreter.interpret(detection);
        log::trace!(
            "detection #{}: {} hand(s), scale={}, rotation={}",
            self.detections,
            detection.hands().len(),
            targets.scale.is_some(),
            targets.rotation.is_some(),
        );

        if let Some(target) = &targets.scale {
            self.smoothers
                .scale
                .apply(&mut self.state.object.scale, &target.scale);
        }
        if let Some(target) = &targets.rotation {
            self.smoothers
                .rotation
                .apply(&mut self.state.object.rotation, &target.rotation);
        }
        if targets.scale.is_some() || targets.rotation.is_some() {
            sink::write_object(sink, &self.state.object);
        }

        let view_projection = self.camera.view_projection(self.viewport);
        for role in Role::ALL {
            if let Some(pair) = targets.pair(role) {
                self.track_hand(sink, role, pair, &view_projection);
            }
        }

        targets
    }

    fn track_hand<S: SceneSink + ?Sized>(
        &mut self,
        sink: &mut S,
        role: Role,
        pair: &TrackedPair,
        view_projection: &Matrix4<f32>,
    ) {
        let Smoothers {
            marker, segment, ..
        } = self.smoothers;
        let hand = self.state.hand_mut(role);
        marker.apply(&mut hand.thumb, &pair.thumb);
        marker.apply(&mut hand.index, &pair.index);
        segment.apply(&mut hand.segment, &segment_positions(pair));
        sink::write_hand(sink, role, hand);

        self.labels
            .place(sink, role, pair, view_projection, self.viewport);
    }
}
