// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use decklink::{CallbackStats, CaptureConfig, DisplayMode, PixelFormat, VideoInputFlags};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

/// Interval between progress reports and shutdown checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Device match pattern ("*" for the first device)
    #[arg(default_value = decklink::discovery::MATCH_ANY)]
    pattern: String,

    /// Capture duration in seconds (runs until Ctrl+C if omitted)
    #[arg(short = 't', long)]
    duration: Option<u64>,

    /// Pixel formats to try, in order of preference
    #[arg(short, long, default_value = "bgra,yuv8")]
    format: String,

    /// Ask the driver to detect the input format
    #[arg(long)]
    detect_format: bool,
}

#[derive(Debug, Serialize)]
struct CaptureReport {
    serial: String,
    display_mode: DisplayMode,
    pixel_format: PixelFormat,
    elapsed_secs: f64,
    callbacks: CallbackStats,
    frame_rate: f64,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Capture parameters: {:?}", args);

    let pixel_formats = utils::parse_pixel_formats(&args.format)?;
    let flags = if args.detect_format {
        VideoInputFlags::ENABLE_FORMAT_DETECTION
    } else {
        VideoInputFlags::DEFAULT
    };
    let config = CaptureConfig::default()
        .with_pixel_formats(pixel_formats)
        .with_input_flags(flags);

    let term = utils::install_signal_handler()?;

    let mut session = decklink::context().open_session(&args.pattern, &config)?;
    log::info!(
        "Capturing from {} ({} as {})",
        session.serial(),
        session.display_mode(),
        session.pixel_format()
    );

    let start = Instant::now();
    let max_duration = args.duration.map(Duration::from_secs);
    let mut last_report = start;

    while !term.load(Ordering::Relaxed) {
        if let Some(max_dur) = max_duration {
            if start.elapsed() >= max_dur {
                log::debug!("Duration limit reached");
                break;
            }
        }

        thread::sleep(POLL_INTERVAL);

        if !json && last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let stats = session.stats();
            log::info!(
                "{:.0}s: {} frames, {} format changes",
                start.elapsed().as_secs_f64(),
                stats.frames_arrived,
                stats.format_changes
            );
        }
    }

    if term.load(Ordering::Relaxed) {
        log::info!("Received shutdown signal");
    }

    let elapsed = start.elapsed().as_secs_f64();
    let callbacks = session.stats();
    session
        .stop()
        .map_err(|e| CliError::CaptureFailed(format!("teardown: {}", e)))?;

    let report = CaptureReport {
        serial: session.serial().to_string(),
        display_mode: session.display_mode().clone(),
        pixel_format: session.pixel_format(),
        elapsed_secs: elapsed,
        frame_rate: if elapsed > 0.0 {
            callbacks.frames_arrived as f64 / elapsed
        } else {
            0.0
        },
        callbacks,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("Device:        {}", report.serial);
        println!("Display mode:  {}", report.display_mode);
        println!("Pixel format:  {}", report.pixel_format);
        println!("Duration:      {:.2}s", report.elapsed_secs);
        println!(
            "Frames:        {} ({:.2} fps)",
            report.callbacks.frames_arrived, report.frame_rate
        );
        println!("Format changes: {}", report.callbacks.format_changes);
    }

    Ok(())
}
