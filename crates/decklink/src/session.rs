// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Capture session lifecycle.
//!
//! A session moves through `Created → ModeNegotiated → Streaming → Stopped`.
//! Opening negotiates a display mode and pixel format, registers a callback
//! object with the input and starts the stream. Dropping the session (or
//! calling [`CaptureSession::stop`]) stops the stream, unregisters the
//! callbacks and disables the input. The callback object may outlive the
//! session while the driver still holds references to it.
//!
//! # Example
//!
//! ```no_run
//! use decklink::{CaptureConfig, PixelFormat};
//!
//! let config = CaptureConfig::default().with_pixel_formats(vec![PixelFormat::YUV8]);
//! let mut session = decklink::context().open_session("*", &config)?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! println!("{} frames", session.stats().frames_arrived);
//! session.stop()?;
//! # Ok::<(), decklink::Error>(())
//! ```

use std::{fmt, sync::Arc};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    callback::{CallbackEvents, CallbackRef, CallbackStats},
    driver::{DeviceHandle, DisplayMode, Input, PixelFormat, VideoInputFlags},
    Error,
};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Created,
    ModeNegotiated,
    Streaming,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::ModeNegotiated => "mode-negotiated",
            SessionState::Streaming => "streaming",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// How a session configures the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pixel_formats: Vec<PixelFormat>,
    input_flags: VideoInputFlags,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            pixel_formats: PixelFormat::DEFAULT_PREFERENCE.to_vec(),
            input_flags: VideoInputFlags::DEFAULT,
        }
    }
}

impl CaptureConfig {
    /// Pixel formats to try, most preferred first.
    pub fn with_pixel_formats(mut self, pixel_formats: Vec<PixelFormat>) -> Self {
        self.pixel_formats = pixel_formats;
        self
    }

    pub fn with_input_flags(mut self, input_flags: VideoInputFlags) -> Self {
        self.input_flags = input_flags;
        self
    }

    pub fn pixel_formats(&self) -> &[PixelFormat] {
        &self.pixel_formats
    }

    pub fn input_flags(&self) -> VideoInputFlags {
        self.input_flags
    }
}

/// Display mode and pixel format accepted by the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiatedMode {
    pub display_mode: DisplayMode,
    pub pixel_format: PixelFormat,
}

/// Enable video input with the first display mode and pixel format the input
/// accepts.
///
/// Formats are tried in preference order; for each format every mode is tried
/// in the order given. The first pair the driver accepts is left enabled and
/// returned.
pub fn negotiate(
    input: &dyn Input,
    modes: &[DisplayMode],
    pixel_formats: &[PixelFormat],
    flags: VideoInputFlags,
) -> Result<NegotiatedMode, Error> {
    for &pixel_format in pixel_formats {
        for mode in modes {
            debug!("Trying {} as {}", mode, pixel_format);
            let result = input.enable_video_input(mode.id, pixel_format, flags);
            if result.is_ok() {
                return Ok(NegotiatedMode {
                    display_mode: mode.clone(),
                    pixel_format,
                });
            }
            debug!("{} as {} rejected: {}", mode.id, pixel_format, result);
        }
    }
    Err(Error::NoCompatibleMode)
}

/// A running capture from one device.
///
/// Fields drop in declaration order, releasing driver references in the
/// reverse of acquisition.
pub struct CaptureSession {
    serial: String,
    callback: CallbackRef,
    input: Box<dyn Input>,
    device: DeviceHandle,
    negotiated: NegotiatedMode,
    state: SessionState,
}

impl CaptureSession {
    /// Negotiate a mode on `device` and start streaming.
    ///
    /// On any failure the input is left disabled with no callbacks registered.
    pub fn open(
        device: DeviceHandle,
        serial: &str,
        config: &CaptureConfig,
    ) -> Result<CaptureSession, Error> {
        debug!("{}: {}", serial, SessionState::Created);

        let input = device
            .input()
            .ok_or(Error::CapabilityUnsupported("input"))?;

        let modes = input.display_modes()?;
        debug!("{}: {} display modes", serial, modes.len());

        let negotiated = negotiate(
            input.as_ref(),
            &modes,
            config.pixel_formats(),
            config.input_flags(),
        )?;
        debug!(
            "{}: {} ({} as {})",
            serial,
            SessionState::ModeNegotiated,
            negotiated.display_mode.id,
            negotiated.pixel_format
        );

        let callback = CallbackRef::new(Arc::new(CallbackEvents::new(serial)));
        let mut session = CaptureSession {
            serial: serial.to_string(),
            callback,
            input,
            device,
            negotiated,
            state: SessionState::ModeNegotiated,
        };

        // On error the session drops here and unwinds what start registered.
        session.start()?;
        Ok(session)
    }

    fn start(&mut self) -> Result<(), Error> {
        self.input
            .set_callback(Some(&self.callback))
            .check("IDeckLinkInput::SetCallback")?;
        self.input
            .set_screen_preview_callback(Some(&self.callback))
            .check("IDeckLinkInput::SetScreenPreviewCallback")?;

        let result = self.input.start_streams();
        if !result.is_ok() {
            return Err(Error::StreamStartFailed(result));
        }

        self.state = SessionState::Streaming;
        info!(
            "{}: capturing {} as {}",
            self.serial, self.negotiated.display_mode, self.negotiated.pixel_format
        );
        Ok(())
    }

    /// Stop streaming and release the input. Calling it again does nothing.
    ///
    /// Teardown always runs to completion; the first failing driver call is
    /// reported.
    pub fn stop(&mut self) -> Result<(), Error> {
        let mut first_error = None;
        let mut note = |call: &'static str, result: crate::HResult| {
            if let Err(err) = result.check(call) {
                warn!("{}: {}", self.serial, err);
                first_error.get_or_insert(err);
            }
        };

        match self.state {
            SessionState::Stopped | SessionState::Created => return Ok(()),
            SessionState::Streaming => {
                note("IDeckLinkInput::StopStreams", self.input.stop_streams());
            }
            SessionState::ModeNegotiated => {}
        }

        note("IDeckLinkInput::SetCallback", self.input.set_callback(None));
        note(
            "IDeckLinkInput::SetScreenPreviewCallback",
            self.input.set_screen_preview_callback(None),
        );
        note(
            "IDeckLinkInput::DisableVideoInput",
            self.input.disable_video_input(),
        );

        self.state = SessionState::Stopped;
        debug!("{}: {}", self.serial, self.state);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn display_mode(&self) -> &DisplayMode {
        &self.negotiated.display_mode
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.negotiated.pixel_format
    }

    pub fn negotiated(&self) -> &NegotiatedMode {
        &self.negotiated
    }

    /// Callback activity so far.
    pub fn stats(&self) -> CallbackStats {
        self.callback.stats()
    }

    /// The session's reference to its callback object.
    pub fn callback(&self) -> &CallbackRef {
        &self.callback
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("{}: teardown incomplete: {}", self.serial, err);
        }
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("serial", &self.serial)
            .field("state", &self.state)
            .field("negotiated", &self.negotiated)
            .field("callback", &self.callback)
            .finish_non_exhaustive()
    }
}
