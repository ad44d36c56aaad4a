//! Hand-gesture driven object transforms.
//!
//! Takes per-frame hand landmark detections, interprets the thumb/index pinch of one hand as a
//! scale gesture and the thumb/index displacement of the other as a rotation gesture, smooths the
//! resulting values and writes them onto renderer-owned scene objects.
//!
//! # Coordinates
//!
//! Landmarks arrive in the detector's normalized image space: X points right, Y points *down*,
//! both in `0.0..=1.0`, and Z is a relative depth. [`coords::to_scene`] converts them into scene
//! space, where X points right, Y points up and the camera looks down the negative Z axis.
//!
//! # Environment Variables
//!
//! * `RUST_LOG`: overrides the log filter set up by [`init_logger!`].
//! * `PINCHSPIN_RENDER_FPS`: overrides the render tick rate of the `pinchspin` replay binary.

pub mod coords;
pub mod gesture;
pub mod landmark;
pub mod overlay;
pub mod pipeline;
pub mod runtime;
pub mod sink;
pub mod smoothing;
pub mod timer;

use log::LevelFilter;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and pinchspin will log at *debug* level. `RUST_LOG` can override this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
