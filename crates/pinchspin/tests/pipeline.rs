use std::fs;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{Point3, Vector2, Vector3};
use pinchspin::coords::{to_scene, Camera, Viewport};
use pinchspin::gesture::Role;
use pinchspin::landmark::{Landmark, RawDetection, RawHand};
use pinchspin::pipeline::{PipelineConfig, PipelineContext};
use pinchspin::runtime::EventLoop;
use pinchspin::sink::HeadlessScene;

fn raw_hand(label: &str, thumb: [f32; 3], index: [f32; 3]) -> RawHand {
    let mut landmarks = vec![[0.5, 0.6, 0.0]; 21];
    landmarks[4] = thumb;
    landmarks[8] = index;
    RawHand {
        label: label.into(),
        landmarks,
    }
}

fn frame(hands: Vec<RawHand>) -> RawDetection {
    RawDetection { hands }
}

fn context() -> PipelineContext {
    PipelineContext::new(PipelineConfig::default()).unwrap()
}

#[test]
fn origin_maps_to_scene_origin() {
    assert_eq!(to_scene(Landmark::new(0.5, 0.5, 0.0)), Point3::origin());
}

#[test]
fn left_pinch_targets_scale() {
    let mut ctx = context();
    let mut scene = HeadlessScene::new();
    let targets = ctx.on_raw_detection(
        &frame(vec![raw_hand("Left", [0.5, 0.5, 0.0], [0.6, 0.5, 0.0])]),
        &mut scene,
    );
    assert_relative_eq!(
        targets.scale.unwrap().scale,
        Vector3::repeat(0.825),
        epsilon = 1e-5
    );
    assert!(targets.rotation.is_none());
}

#[test]
fn right_displacement_targets_unwrapped_rotation() {
    let mut ctx = context();
    let mut scene = HeadlessScene::new();
    let targets = ctx.on_raw_detection(
        &frame(vec![raw_hand("Right", [0.6, 0.5, 0.0], [0.5, 0.5, 0.0])]),
        &mut scene,
    );
    let rotation = targets.rotation.unwrap().rotation;
    assert_abs_diff_eq!(rotation.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(rotation.y, 5.50, epsilon = 1e-2);
}

#[test]
fn malformed_hand_is_absent() {
    let mut ctx = context();
    let mut scene = HeadlessScene::new();
    let mut hand = raw_hand("Left", [0.5, 0.5, 0.0], [0.6, 0.5, 0.0]);
    hand.landmarks.truncate(8);
    let targets = ctx.on_raw_detection(&frame(vec![hand]), &mut scene);
    assert!(targets.scale.is_none());
    assert_eq!(scene, HeadlessScene::new());
    assert_eq!(ctx.state().object.scale, Vector3::repeat(1.0));
}

#[test]
fn empty_frames_keep_last_transform() {
    let mut ctx = context();
    let mut scene = HeadlessScene::new();
    ctx.on_raw_detection(
        &frame(vec![
            raw_hand("Left", [0.4, 0.5, 0.0], [0.6, 0.5, 0.0]),
            raw_hand("Right", [0.6, 0.5, 0.0], [0.5, 0.4, 0.0]),
        ]),
        &mut scene,
    );
    let state = *ctx.state();
    let labels = Role::ALL.map(|role| scene.hand(role).label.position());
    assert!(labels.iter().all(Option::is_some));

    ctx.on_raw_detection(&frame(vec![]), &mut scene);
    ctx.on_raw_detection(&RawDetection::default(), &mut scene);

    assert_eq!(ctx.state(), &state);
    assert_eq!(scene.object.scale, state.object.scale);
    assert_eq!(
        Vector2::new(scene.object.rotation.x, scene.object.rotation.y),
        state.object.rotation
    );
    assert_eq!(
        Role::ALL.map(|role| scene.hand(role).label.position()),
        labels
    );
}

#[test]
fn labels_follow_their_hands() {
    let mut ctx = context();
    let mut scene = HeadlessScene::new();
    ctx.set_view(Camera::default(), Viewport::new(1000.0, 1000.0));
    ctx.on_raw_detection(
        &frame(vec![
            raw_hand("Left", [0.2, 0.5, 0.0], [0.3, 0.5, 0.0]),
            raw_hand("Right", [0.7, 0.5, 0.0], [0.8, 0.5, 0.0]),
        ]),
        &mut scene,
    );
    let expand = scene.hand(Role::Scale).label.position().unwrap();
    let rotate = scene.hand(Role::Rotation).label.position().unwrap();
    assert!(expand.x < 500.0);
    assert!(rotate.x > 500.0);
    assert_relative_eq!(expand.y, 500.0 - 120.0, epsilon = 1e-2);
    assert_relative_eq!(rotate.y, 500.0 - 120.0, epsilon = 1e-2);
}

#[derive(serde::Deserialize)]
struct Recording {
    frames: Vec<RawDetection>,
}

#[test]
fn replay_demo_recording() {
    let data = fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../demos/pinch.json"
    ))
    .unwrap();
    let recording: Recording = serde_json::from_str(&data).unwrap();
    assert!(!recording.frames.is_empty());

    let event_loop = EventLoop::builder()
        .spawn(context(), HeadlessScene::new(), |_, _| {})
        .unwrap();
    let detector = event_loop.detector();
    let renderer = event_loop.renderer();
    let frame_count = recording.frames.len();
    for frame in recording.frames {
        detector.send_raw(frame).unwrap();
        renderer
            .tick(Camera::default(), Viewport::new(1280.0, 720.0))
            .unwrap();
    }
    drop((detector, renderer));

    let (ctx, scene) = event_loop.join();
    assert_eq!(ctx.detections(), frame_count as u64);
    let object = &ctx.state().object;
    assert_ne!(object.scale, Vector3::repeat(1.0));
    assert_ne!(object.rotation, Vector2::zeros());
    assert_eq!(scene.object.scale, object.scale);
    for role in Role::ALL {
        assert!(scene.hand(role).label.position().is_some());
        assert_eq!(scene.hand(role).thumb, ctx.state().hand(role).thumb);
    }
}
