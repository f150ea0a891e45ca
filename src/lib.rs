#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`LedStrip`**: packed per-pixel RGB storage with a batched `render` to the transport
//! - **`StripTransport`**: trait to implement for your byte channel (SPI, UART bridge, test mock)
//! - **`StripRunner`**: execution controller guaranteeing at most one program owns the strip
//! - **`CancelToken`**: hierarchical cooperative cancellation, polled by programs
//! - **`ProgramParams`**: bundle of up to three integer parameters forwarded to a program
//! - **`RunHandle`**: completion handle for a scheduled run
//! - **`programs`**: ready-made animations (rainbows, fades, blink, sunrise)
//!
//! Programs are plain callables of shape
//! `FnMut(&mut LedStrip<T>, &CancelToken, &ProgramParams)`. The runner
//! invokes them on a worker thread with exclusive strip access; stopping
//! is cooperative, so programs check the token between steps and return
//! promptly once it reads cancelled.

pub mod cancel;
pub mod color;
pub mod params;
pub mod programs;
pub mod runner;
pub mod strip;

pub use cancel::CancelToken;
pub use color::{BLACK, BLUE, Color, GREEN, RED, WHITE, hsv, hue, wheel};
pub use params::{MAX_PARAMS, ProgramParams};
pub use runner::{RunHandle, RunnerError, StripRunner};
pub use strip::{LedStrip, RENDER_SETTLE, StripError, StripTransport};

/// All pixels off.
pub const COLOR_OFF: Color = Color::OFF;
