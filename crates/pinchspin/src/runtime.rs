//! Single-consumer event loop driving a [`PipelineContext`].
//!
//! Detection and rendering run independently and at different rates. Both send their per-frame
//! events into one channel, which is drained by a single thread owning the pipeline state and the
//! scene. Handling of one event therefore never interleaves with another, no matter which thread
//! produced it.

use std::{
    fmt, io,
    panic::resume_unwind,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};

use crate::coords::{Camera, Viewport};
use crate::landmark::{DetectionResult, RawDetection};
use crate::pipeline::PipelineContext;
use crate::sink::SceneSink;
use crate::timer::RateCounter;

/// A message from one of the frame producers.
#[derive(Debug, Clone)]
pub enum Event {
    /// A validated detection result.
    Detection(DetectionResult),
    /// A detector payload that still needs validating.
    RawDetection(RawDetection),
    /// The renderer is about to draw a frame with this camera and viewport.
    Render { camera: Camera, viewport: Viewport },
}

/// Error returned when sending to an [`EventLoop`] that has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected {
    _priv: (),
}

impl fmt::Display for Disconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pipeline event loop has exited")
    }
}

impl std::error::Error for Disconnected {}

/// Producer handle for the detection side.
#[derive(Clone)]
pub struct DetectionSender {
    inner: Sender<Event>,
}

impl DetectionSender {
    /// Queues a detection result. Never blocks.
    pub fn send(&self, detection: DetectionResult) -> Result<(), Disconnected> {
        send(&self.inner, Event::Detection(detection))
    }

    /// Queues an unvalidated detector payload. Never blocks.
    pub fn send_raw(&self, raw: RawDetection) -> Result<(), Disconnected> {
        send(&self.inner, Event::RawDetection(raw))
    }
}

/// Producer handle for the render side.
#[derive(Clone)]
pub struct RenderSender {
    inner: Sender<Event>,
}

impl RenderSender {
    /// Queues a render tick. Never blocks.
    pub fn tick(&self, camera: Camera, viewport: Viewport) -> Result<(), Disconnected> {
        send(&self.inner, Event::Render { camera, viewport })
    }
}

fn send(sender: &Sender<Event>, event: Event) -> Result<(), Disconnected> {
    sender.send(event).map_err(|_| Disconnected { _priv: () })
}

/// A builder object that can be used to configure and spawn an [`EventLoop`].
#[derive(Clone, Default)]
pub struct EventLoopBuilder {
    name: Option<String>,
}

impl EventLoopBuilder {
    /// Sets the name of the consumer thread.
    pub fn name<N: Into<String>>(self, name: N) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Spawns the consumer thread.
    ///
    /// The thread takes ownership of `context` and `sink`. For every render tick, `draw` is
    /// invoked after the new view has been recorded; it may upload geometry (clearing dirty
    /// flags), but must not change the transforms driven by the pipeline.
    pub fn spawn<S, D>(
        self,
        context: PipelineContext,
        sink: S,
        draw: D,
    ) -> io::Result<EventLoop<S>>
    where
        S: SceneSink + Send + 'static,
        D: FnMut(&PipelineContext, &mut S) + Send + 'static,
    {
        let (sender, recv) = crossbeam_channel::unbounded();
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name.clone() {
            builder = builder.name(name);
        }
        let name = self.name.unwrap_or_else(|| "pipeline".into());
        let handle = builder.spawn(move || consume(&name, recv, context, sink, draw))?;

        Ok(EventLoop {
            sender: Some(sender),
            handle: Some(handle),
        })
    }
}

fn consume<S, D>(
    name: &str,
    recv: Receiver<Event>,
    mut context: PipelineContext,
    mut sink: S,
    mut draw: D,
) -> (PipelineContext, S)
where
    S: SceneSink,
    D: FnMut(&PipelineContext, &mut S),
{
    log::debug!("event loop '{name}' starting");
    let mut detections = RateCounter::new(format!("{name}: detections"));
    let mut renders = RateCounter::new(format!("{name}: render ticks"));

    for event in recv {
        match event {
            Event::Detection(detection) => {
                context.on_detection(&detection, &mut sink);
                detections.tick();
            }
            Event::RawDetection(raw) => {
                context.on_raw_detection(&raw, &mut sink);
                detections.tick();
            }
            Event::Render { camera, viewport } => {
                context.set_view(camera, viewport);
                draw(&context, &mut sink);
                renders.tick();
            }
        }
    }

    log::debug!(
        "event loop '{name}' exiting after {} detections and {} render ticks",
        detections.total(),
        renders.total(),
    );
    (context, sink)
}

/// A handle to the consumer thread owning the pipeline.
///
/// The thread exits once this handle and every [`DetectionSender`] and [`RenderSender`] created
/// from it have been dropped. If the thread has panicked, the panic is forwarded to the thread
/// calling [`EventLoop::join`] or dropping the [`EventLoop`].
pub struct EventLoop<S: Send + 'static> {
    sender: Option<Sender<Event>>,
    handle: Option<JoinHandle<(PipelineContext, S)>>,
}

impl EventLoop<()> {
    /// Returns a builder that can be used to configure and spawn an [`EventLoop`].
    #[inline]
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::default()
    }
}

impl<S: Send + 'static> EventLoop<S> {
    pub fn detector(&self) -> DetectionSender {
        DetectionSender {
            inner: self.sender(),
        }
    }

    pub fn renderer(&self) -> RenderSender {
        RenderSender {
            inner: self.sender(),
        }
    }

    fn sender(&self) -> Sender<Event> {
        match &self.sender {
            Some(sender) => sender.clone(),
            None => unreachable!("sender is only taken when the loop is shut down"),
        }
    }

    /// Waits for all producers to hang up and returns the final pipeline state and scene.
    pub fn join(mut self) -> (PipelineContext, S) {
        drop(self.sender.take());
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(output)) => output,
            Some(Err(payload)) => resume_unwind(payload),
            None => unreachable!("`join` consumes the event loop"),
        }
    }
}

impl<S: Send + 'static> Drop for EventLoop<S> {
    fn drop(&mut self) {
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
            }
        }
    }
}
