// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use decklink::PixelFormat;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Parse a comma-separated pixel format preference list.
///
/// Accepts short names ("bgra", "yuv8", "yuv10") and DeckLink fourccs
/// ("2vuy", "v210", "r210"), case-insensitive.
pub fn parse_pixel_formats(s: &str) -> Result<Vec<PixelFormat>, CliError> {
    let formats = s
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            PixelFormat::from_name(name)
                .ok_or_else(|| CliError::InvalidArgs(format!("Unknown pixel format: {}", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if formats.is_empty() {
        return Err(CliError::InvalidArgs(
            "At least one pixel format is required".to_string(),
        ));
    }
    Ok(formats)
}

/// Install signal handlers for graceful shutdown on Ctrl+C or SIGTERM
///
/// Returns an Arc<AtomicBool> that will be set to true when a signal is received.
/// Check this flag periodically in your main loop to exit gracefully.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    for signal in [SIGINT, SIGTERM] {
        flag::register(signal, Arc::clone(&term))
            .map_err(|e| CliError::General(format!("Failed to register signal handler: {}", e)))?;
    }

    log::debug!("Installed SIGINT/SIGTERM handlers");
    Ok(term)
}
