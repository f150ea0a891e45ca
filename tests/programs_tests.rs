//! Integration tests for the built-in animation programs
//!
//! Programs are plain functions, so most checks drive them directly with a
//! strip and token instead of going through the runner.

mod common;
use common::*;

use std::time::{Duration, Instant};

use strip_runner::{CancelToken, LedStrip, ProgramParams, programs};

fn strip_of(pixel_count: usize, transport: &MockTransport) -> LedStrip<MockTransport> {
    LedStrip::new(pixel_count, transport.clone()).unwrap()
}

#[test]
fn all_on_uses_the_color_parameter() {
    let transport = MockTransport::new();
    let mut strip = strip_of(2, &transport);

    programs::all_on(
        &mut strip,
        &CancelToken::new(),
        &ProgramParams::from(0xFF8000),
    );

    assert_eq!(transport.last_frame().unwrap(), vec![0xFF, 0x80, 0x00, 0xFF, 0x80, 0x00]);
}

#[test]
fn all_on_falls_back_to_its_default_color() {
    let transport = MockTransport::new();
    let mut strip = strip_of(1, &transport);

    programs::all_on(&mut strip, &CancelToken::new(), &ProgramParams::none());

    assert_eq!(transport.last_frame().unwrap(), vec![0x99, 0x99, 0x99]);
}

#[test]
fn all_off_blanks_the_strip() {
    let transport = MockTransport::new();
    let mut strip = strip_of(3, &transport);
    strip.fill_rgb(50, 60, 70);

    programs::all_off(&mut strip, &CancelToken::new(), &ProgramParams::none());

    assert_eq!(transport.last_frame().unwrap(), vec![0u8; 9]);
}

#[test]
fn blink_ends_dark() {
    let transport = MockTransport::new();
    let mut strip = strip_of(2, &transport);

    programs::blink(&mut strip, &CancelToken::new(), &ProgramParams::none());

    // Initial clear plus two on/off cycles.
    assert_eq!(transport.frame_count(), 5);
    assert_eq!(transport.last_frame().unwrap(), vec![0u8; 6]);
}

#[test]
fn appear_from_back_settles_the_full_pattern() {
    let transport = MockTransport::new();
    let mut strip = strip_of(3, &transport);

    programs::appear_from_back(&mut strip, &CancelToken::new(), &ProgramParams::none());

    // Last frame: two pixels settled at the front, the runner resting at 1.
    assert_eq!(
        transport.last_frame().unwrap(),
        vec![255, 0, 0, 255, 0, 0, 0, 0, 0]
    );
}

#[test]
fn rainbow_cycle_successive_spreads_the_wheel() {
    let transport = MockTransport::new();
    let mut strip = strip_of(2, &transport);

    programs::rainbow_cycle_successive(&mut strip, &CancelToken::new(), &ProgramParams::none());

    // One render per pixel; pixel 0 sits at the wheel start (red), pixel 1
    // half a wheel later (cyan).
    assert_eq!(transport.frame_count(), 2);
    assert_eq!(
        transport.last_frame().unwrap(),
        vec![255, 0, 0, 0, 255, 255]
    );
}

#[test]
fn cancelled_token_stops_programs_before_any_frame() {
    let token = CancelToken::new();
    token.cancel();
    let params = ProgramParams::none();

    let transport = MockTransport::new();
    let mut strip = strip_of(4, &transport);

    let started = Instant::now();
    programs::soft_on(&mut strip, &token, &params);
    programs::soft_off(&mut strip, &token, &params);
    programs::sunrise(&mut strip, &token, &params);
    programs::brightness_decrease(&mut strip, &token, &params);
    programs::rainbow_colors(&mut strip, &token, &params);
    programs::rainbow_cycle(&mut strip, &token, &params);
    programs::rainbow_cycle_successive(&mut strip, &token, &params);
    programs::all_on(&mut strip, &token, &params);
    programs::all_off(&mut strip, &token, &params);

    assert_eq!(transport.frame_count(), 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn programs_run_under_the_runner() {
    let transport = MockTransport::new();
    let runner = strip_runner::StripRunner::new(3, transport.clone()).unwrap();

    let handle = runner.run_once(programs::all_on, 0x0000FF).unwrap();
    handle.wait();

    assert!(!runner.is_running());
    assert_eq!(
        transport.last_frame().unwrap(),
        vec![0, 0, 255, 0, 0, 255, 0, 0, 255]
    );
}
