//! Replays a recorded detection stream through the pipeline.
//!
//! Detection frames are sent from one thread at the recording's detection rate while another
//! thread produces render ticks, the same way a live detector and renderer would.

use std::{env, fs, thread, time::Duration};

use anyhow::{bail, Context};
use crossbeam_channel::select;
use pinchspin::coords::{Camera, Viewport};
use pinchspin::gesture::Role;
use pinchspin::landmark::RawDetection;
use pinchspin::pipeline::{PipelineConfig, PipelineContext};
use pinchspin::runtime::EventLoop;
use pinchspin::sink::HeadlessScene;
use serde::Deserialize;

#[derive(Deserialize)]
struct Recording {
    #[serde(default)]
    config: PipelineConfig,
    #[serde(default = "default_detection_fps")]
    detection_fps: f32,
    #[serde(default = "default_render_fps")]
    render_fps: f32,
    #[serde(default)]
    viewport: Viewport,
    frames: Vec<RawDetection>,
}

fn default_detection_fps() -> f32 {
    30.0
}

fn default_render_fps() -> f32 {
    60.0
}

fn render_fps_override() -> anyhow::Result<Option<f32>> {
    match env::var("PINCHSPIN_RENDER_FPS") {
        Ok(value) => {
            let fps = value
                .parse()
                .with_context(|| format!("invalid PINCHSPIN_RENDER_FPS '{value}'"))?;
            Ok(Some(fps))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).context("invalid PINCHSPIN_RENDER_FPS"),
    }
}

fn interval(fps: f32) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f32(1.0 / fps)
        .with_context(|| format!("frame rate {fps} has no representable interval"))
}

fn main() -> anyhow::Result<()> {
    pinchspin::init_logger!();

    let Some(path) = env::args_os().nth(1) else {
        bail!("usage: pinchspin <recording.json>");
    };
    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.to_string_lossy()))?;
    let mut recording: Recording =
        serde_json::from_str(&data).context("failed to parse recording")?;
    if let Some(fps) = render_fps_override()? {
        recording.render_fps = fps;
    }
    if !(recording.detection_fps > 0.0 && recording.render_fps > 0.0) {
        bail!(
            "frame rates must be positive (detection: {}, render: {})",
            recording.detection_fps,
            recording.render_fps
        );
    }

    let context = PipelineContext::new(recording.config).context("invalid pipeline config")?;
    log::info!(
        "replaying {} detection frames at {} FPS, rendering at {} FPS into {}x{}",
        recording.frames.len(),
        recording.detection_fps,
        recording.render_fps,
        recording.viewport.width,
        recording.viewport.height,
    );

    let event_loop = EventLoop::builder().name("pipeline").spawn(
        context,
        HeadlessScene::new(),
        |_, scene| {
            for role in Role::ALL {
                if scene.hand_mut(role).segment.take_update() {
                    log::trace!("uploading {role:?} segment");
                }
            }
        },
    )?;

    let detector = event_loop.detector();
    let renderer = event_loop.renderer();
    let frames = recording.frames;
    let detection_interval = interval(recording.detection_fps)?;
    let render_interval = interval(recording.render_fps)?;
    let viewport = recording.viewport;
    // Dropped by the detection thread once the recording is exhausted.
    let (done, finished) = crossbeam_channel::bounded::<()>(0);

    thread::scope(|s| -> anyhow::Result<()> {
        let detection = s.spawn(move || -> anyhow::Result<()> {
            let _done = done;
            for frame in frames {
                detector.send_raw(frame)?;
                thread::sleep(detection_interval);
            }
            Ok(())
        });
        let render = s.spawn(move || -> anyhow::Result<()> {
            let ticker = crossbeam_channel::tick(render_interval);
            loop {
                select! {
                    recv(ticker) -> _ => renderer.tick(Camera::default(), viewport)?,
                    recv(finished) -> _ => return Ok(()),
                }
            }
        });

        for handle in [detection, render] {
            match handle.join() {
                Ok(result) => result?,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        Ok(())
    })?;

    let (context, scene) = event_loop.join();
    let object = &context.state().object;
    log::info!(
        "processed {} detections; scale={:.3}, rotation=({:.3}, {:.3})",
        context.detections(),
        object.scale.x,
        object.rotation.x,
        object.rotation.y,
    );
    for role in Role::ALL {
        let hand = scene.hand(role);
        match hand.label.position() {
            Some(pos) => log::info!(
                "'{}' label at ({:.1}, {:.1}), markers at {:?} / {:?}",
                hand.label.text(),
                pos.x,
                pos.y,
                hand.thumb.coords.as_slice(),
                hand.index.coords.as_slice(),
            ),
            None => log::info!("'{}' hand was never seen", hand.label.text()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_fps() {
        assert_eq!(interval(4.0).unwrap(), Duration::from_millis(250));
        assert!(interval(1e-30).is_err());
        assert!(interval(f32::INFINITY).unwrap().is_zero());
    }
}
