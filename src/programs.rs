//! Ready-made animation programs.
//!
//! Every program here matches the shape [`StripRunner`] schedules: it
//! receives exclusive strip access plus a cancellation token, polls the
//! token between discrete steps (pixel writes, renders, frame delays) and
//! returns promptly once a stop is requested. A transport failure ends
//! the program after a logged warning.
//!
//! Color-valued parameters arrive packed in position 0 of
//! [`ProgramParams`]; a missing or non-positive value selects the
//! program's default, so every program also runs parameterless.
//!
//! [`StripRunner`]: crate::runner::StripRunner

use std::time::Duration;

use tracing::warn;

use crate::cancel::CancelToken;
use crate::color::{self, Color};
use crate::params::ProgramParams;
use crate::strip::{LedStrip, StripTransport};

const BLINK_FLASH: Duration = Duration::from_millis(80);
const BLINK_HOLD: Duration = Duration::from_millis(500);
const SOFT_ON_STEP: Duration = Duration::from_secs(1);
const SOFT_OFF_STEP: Duration = Duration::from_secs(2);
const SUNRISE_STEP: Duration = Duration::from_millis(200);
const DIM_FRAME: Duration = Duration::from_millis(10);
const RAINBOW_FRAME: Duration = Duration::from_millis(50);
const RAINBOW_SUCCESSIVE_FRAME: Duration = Duration::from_millis(100);

/// Reads a packed color parameter; non-positive means "not supplied".
fn color_param(params: &ProgramParams, index: usize) -> Option<Color> {
    params
        .get(index)
        .filter(|&value| value > 0)
        .map(|value| Color::from_packed(value as u32))
}

/// Renders the current frame, ending the program on a transport failure.
fn render_frame<T: StripTransport>(strip: &mut LedStrip<T>) -> bool {
    match strip.render() {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "transport write failed, ending program");
            false
        }
    }
}

/// Wheel stride so the full 256-position wheel spreads over the strip.
fn wheel_stride<T: StripTransport>(strip: &LedStrip<T>) -> u32 {
    256 / strip.pixel_count() as u32
}

/// Lights the whole strip in one color (param 0, default warm gray).
pub fn all_on<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    params: &ProgramParams,
) {
    let fallback = Color::from_packed(0x0099_9999);
    let fill = color_param(params, 0).unwrap_or(fallback);

    if token.is_cancelled() {
        return;
    }
    strip.fill(fill);
    render_frame(strip);
}

/// Turns the whole strip off.
pub fn all_off<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    if token.is_cancelled() {
        return;
    }
    strip.clear();
    render_frame(strip);
}

/// Flashes the strip twice in one color (param 0, default red), then holds
/// dark briefly. Suited to recurring scheduling.
pub fn blink<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    params: &ProgramParams,
) {
    let fill = color_param(params, 0).unwrap_or(color::RED);

    if token.is_cancelled() {
        return;
    }
    strip.clear();
    if !render_frame(strip) {
        return;
    }

    for _ in 0..2 {
        strip.fill(fill);
        if !render_frame(strip) || !token.sleep(BLINK_FLASH) {
            return;
        }
        strip.clear();
        if !render_frame(strip) || !token.sleep(BLINK_FLASH) {
            return;
        }
    }

    token.sleep(BLINK_HOLD);
}

/// Ramps the whole strip from dark to a soft white, one step per second.
pub fn soft_on<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    for level in 0..99u8 {
        if token.is_cancelled() {
            return;
        }
        strip.fill_rgb(level, level, level);
        if !render_frame(strip) || !token.sleep(SOFT_ON_STEP) {
            return;
        }
    }
}

/// Ramps the whole strip from soft white down to dark.
pub fn soft_off<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    for level in (0..=99u8).rev() {
        if token.is_cancelled() {
            return;
        }
        strip.fill_rgb(level, level, level);
        if !render_frame(strip) || !token.sleep(SOFT_OFF_STEP) {
            return;
        }
    }
}

/// Simulates a sunrise: a slow red ramp, then green and blue intensity
/// rising toward full white.
pub fn sunrise<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    let mut green = 0u8;
    let mut blue = 0u8;

    for red in 0..=255u8 {
        if token.is_cancelled() {
            return;
        }
        strip.fill_rgb(red, green, blue);
        if !render_frame(strip) || !token.sleep(SUNRISE_STEP) {
            return;
        }
    }

    for level in 0..=255u8 {
        if token.is_cancelled() {
            return;
        }
        green = level;
        strip.fill_rgb(255, green, blue);
        if !render_frame(strip) || !token.sleep(SUNRISE_STEP) {
            return;
        }

        blue = level;
        strip.fill_rgb(255, green, blue);
        if !render_frame(strip) || !token.sleep(SUNRISE_STEP) {
            return;
        }
    }
}

/// Fades whatever the strip currently shows down to black, one brightness
/// step per frame.
pub fn brightness_decrease<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    for _ in 0..256 {
        for index in 0..strip.pixel_count() {
            if token.is_cancelled() {
                return;
            }
            let [r, g, b] = strip.pixel_rgb(index);
            strip.set_pixel_rgb(
                index,
                r.saturating_sub(1),
                g.saturating_sub(1),
                b.saturating_sub(1),
            );
        }
        if !render_frame(strip) || !token.sleep(DIM_FRAME) {
            return;
        }
    }
}

/// Grows a lit region from the front while a single pixel runs in from the
/// back (param 0 selects the color, default red).
pub fn appear_from_back<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    params: &ProgramParams,
) {
    let fill = color_param(params, 0).unwrap_or(color::RED);
    let count = strip.pixel_count();

    for settled in 0..count {
        for runner in (1..count).rev() {
            strip.clear();
            for index in 0..settled {
                if token.is_cancelled() {
                    return;
                }
                strip.set_pixel(index, fill);
            }
            strip.set_pixel(runner, fill);
            if !render_frame(strip) {
                return;
            }
        }
    }
}

/// Cycles every pixel together through the color wheel.
pub fn rainbow_colors<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    let stride = wheel_stride(strip);

    for frame in 0..256u32 {
        if token.is_cancelled() {
            return;
        }
        let fill = color::wheel(((stride + frame) % 256) as u8);
        strip.fill(fill);
        if !render_frame(strip) || !token.sleep(RAINBOW_FRAME) {
            return;
        }
    }
}

/// Distributes the color wheel across the strip and rotates it, so the
/// whole rainbow marches along the pixels.
pub fn rainbow_cycle<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    let stride = wheel_stride(strip);

    for frame in 0..256u32 {
        for index in 0..strip.pixel_count() {
            if token.is_cancelled() {
                return;
            }
            let pos = ((index as u32 * stride + frame) % 256) as u8;
            strip.set_pixel(index, color::wheel(pos));
        }
        if !render_frame(strip) || !token.sleep(RAINBOW_FRAME) {
            return;
        }
    }
}

/// Paints the wheel across the strip one pixel at a time, rendering after
/// each write.
pub fn rainbow_cycle_successive<T: StripTransport>(
    strip: &mut LedStrip<T>,
    token: &CancelToken,
    _params: &ProgramParams,
) {
    let stride = wheel_stride(strip);

    for index in 0..strip.pixel_count() {
        if token.is_cancelled() {
            return;
        }
        let pos = ((index as u32 * stride) % 256) as u8;
        strip.set_pixel(index, color::wheel(pos));
        if !render_frame(strip) || !token.sleep(RAINBOW_SUCCESSIVE_FRAME) {
            return;
        }
    }
}
