// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Driver interface consumed by discovery and capture.
//!
//! [`crate::sdk`] implements these traits over libDeckLinkAPI. Tests provide
//! their own implementations, which is how device ordering, negotiation ordering
//! and stream start failures are exercised without hardware.

use std::{fmt, ops::BitOr, sync::Arc};

use decklink_sys as ffi;
use serde::Serialize;

use crate::{callback::CallbackRef, fourcc::FourCC, Error};

/// Result code returned by driver calls.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

impl HResult {
    pub const OK: HResult = HResult(ffi::S_OK);
    pub const FALSE: HResult = HResult(ffi::S_FALSE);
    pub const FAIL: HResult = HResult(ffi::E_FAIL);
    pub const NOT_IMPLEMENTED: HResult = HResult(ffi::E_NOTIMPL);
    pub const INVALID_ARG: HResult = HResult(ffi::E_INVALIDARG);
    pub const NO_INTERFACE: HResult = HResult(ffi::E_NOINTERFACE);
    pub const POINTER: HResult = HResult(ffi::E_POINTER);
    pub const ACCESS_DENIED: HResult = HResult(ffi::E_ACCESSDENIED);

    /// Only `S_OK` counts as success. `S_FALSE` is how iterators report exhaustion.
    pub fn is_ok(self) -> bool {
        self.0 == ffi::S_OK
    }

    /// Map a failure code onto [`Error::Driver`] tagged with the call name.
    pub fn check(self, call: &'static str) -> Result<(), Error> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::Driver { call, result: self })
        }
    }

    fn name(self) -> Option<&'static str> {
        match self.0 {
            ffi::S_OK => Some("S_OK"),
            ffi::S_FALSE => Some("S_FALSE"),
            ffi::E_UNEXPECTED => Some("E_UNEXPECTED"),
            ffi::E_NOTIMPL => Some("E_NOTIMPL"),
            ffi::E_OUTOFMEMORY => Some("E_OUTOFMEMORY"),
            ffi::E_INVALIDARG => Some("E_INVALIDARG"),
            ffi::E_NOINTERFACE => Some("E_NOINTERFACE"),
            ffi::E_POINTER => Some("E_POINTER"),
            ffi::E_HANDLE => Some("E_HANDLE"),
            ffi::E_ABORT => Some("E_ABORT"),
            ffi::E_FAIL => Some("E_FAIL"),
            ffi::E_ACCESSDENIED => Some("E_ACCESSDENIED"),
            _ => None,
        }
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#010x})", name, self.0 as u32),
            None => write!(f, "{:#010x}", self.0 as u32),
        }
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult({})", self)
    }
}

impl From<i32> for HResult {
    fn from(value: i32) -> Self {
        HResult(value)
    }
}

/// Pixel format requested from the input (`BMDPixelFormat`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PixelFormat(pub FourCC);

impl PixelFormat {
    pub const YUV8: PixelFormat = PixelFormat(FourCC(*b"2vuy"));
    pub const YUV10: PixelFormat = PixelFormat(FourCC(*b"v210"));
    pub const ARGB8: PixelFormat = PixelFormat(FourCC::from_u32(ffi::bmdFormat8BitARGB));
    pub const BGRA8: PixelFormat = PixelFormat(FourCC(*b"BGRA"));
    pub const RGB10: PixelFormat = PixelFormat(FourCC(*b"r210"));

    /// Formats tried, in order, when none are configured.
    pub const DEFAULT_PREFERENCE: [PixelFormat; 2] = [PixelFormat::BGRA8, PixelFormat::YUV8];

    pub fn from_raw(raw: ffi::BMDPixelFormat) -> Self {
        PixelFormat(FourCC::from_u32(raw))
    }

    pub fn as_raw(self) -> ffi::BMDPixelFormat {
        self.0.to_u32()
    }

    /// Look a format up by short name ("bgra", "yuv8") or fourcc ("2vuy").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bgra" | "bgra8" => Some(PixelFormat::BGRA8),
            "argb" | "argb8" => Some(PixelFormat::ARGB8),
            "2vuy" | "uyvy" | "yuv8" => Some(PixelFormat::YUV8),
            "v210" | "yuv10" => Some(PixelFormat::YUV10),
            "r210" | "rgb10" => Some(PixelFormat::RGB10),
            _ => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == PixelFormat::ARGB8 {
            f.write_str("ARGB")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({})", self)
    }
}

/// Display mode identifier (`BMDDisplayMode`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DisplayModeId(pub FourCC);

impl DisplayModeId {
    pub const NTSC: DisplayModeId = DisplayModeId(FourCC(*b"ntsc"));
    pub const PAL: DisplayModeId = DisplayModeId(FourCC(*b"pal "));
    pub const HD720P60: DisplayModeId = DisplayModeId(FourCC(*b"hp60"));
    pub const HD1080I50: DisplayModeId = DisplayModeId(FourCC(*b"Hi50"));
    pub const HD1080P30: DisplayModeId = DisplayModeId(FourCC(*b"Hp30"));
    pub const HD1080P60: DisplayModeId = DisplayModeId(FourCC(*b"Hp60"));
    pub const UHD2160P30: DisplayModeId = DisplayModeId(FourCC(*b"4k30"));
    pub const UNKNOWN: DisplayModeId = DisplayModeId(FourCC(*b"iunk"));

    pub fn from_raw(raw: ffi::BMDDisplayMode) -> Self {
        DisplayModeId(FourCC::from_u32(raw))
    }

    pub fn as_raw(self) -> ffi::BMDDisplayMode {
        self.0.to_u32()
    }
}

impl fmt::Display for DisplayModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DisplayModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayModeId({})", self.0)
    }
}

/// Flags passed when enabling video input (`BMDVideoInputFlags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VideoInputFlags(u32);

impl VideoInputFlags {
    pub const DEFAULT: VideoInputFlags = VideoInputFlags(ffi::bmdVideoInputFlagDefault);
    pub const ENABLE_FORMAT_DETECTION: VideoInputFlags =
        VideoInputFlags(ffi::bmdVideoInputEnableFormatDetection);
    pub const DUAL_STREAM_3D: VideoInputFlags = VideoInputFlags(ffi::bmdVideoInputDualStream3D);

    pub fn from_bits(bits: u32) -> Self {
        VideoInputFlags(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: VideoInputFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for VideoInputFlags {
    type Output = VideoInputFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        VideoInputFlags(self.0 | rhs.0)
    }
}

/// Which properties of the incoming signal changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatChangeEvents(pub u32);

impl FormatChangeEvents {
    pub const DISPLAY_MODE: FormatChangeEvents =
        FormatChangeEvents(ffi::bmdVideoInputDisplayModeChanged);
    pub const FIELD_DOMINANCE: FormatChangeEvents =
        FormatChangeEvents(ffi::bmdVideoInputFieldDominanceChanged);
    pub const COLORSPACE: FormatChangeEvents =
        FormatChangeEvents(ffi::bmdVideoInputColorspaceChanged);

    pub fn contains(self, other: FormatChangeEvents) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Signal properties reported alongside a format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectedSignalFlags(pub u32);

impl DetectedSignalFlags {
    pub const YCBCR422: DetectedSignalFlags =
        DetectedSignalFlags(ffi::bmdDetectedVideoInputYCbCr422);
    pub const RGB444: DetectedSignalFlags = DetectedSignalFlags(ffi::bmdDetectedVideoInputRGB444);
    pub const DUAL_STREAM_3D: DetectedSignalFlags =
        DetectedSignalFlags(ffi::bmdDetectedVideoInputDualStream3D);

    pub fn contains(self, other: DetectedSignalFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A video mode the input can capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMode {
    pub id: DisplayModeId,
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Frame duration in `time_scale` units.
    pub frame_duration: i64,
    pub time_scale: i64,
}

impl DisplayMode {
    pub fn new(id: DisplayModeId, width: u32, height: u32) -> Self {
        DisplayMode {
            id,
            name: None,
            width,
            height,
            frame_duration: 0,
            time_scale: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_frame_rate(mut self, frame_duration: i64, time_scale: i64) -> Self {
        self.frame_duration = frame_duration;
        self.time_scale = time_scale;
        self
    }

    /// Frames per second, or 0.0 when the driver did not report a rate.
    pub fn frame_rate(&self) -> f64 {
        if self.frame_duration == 0 {
            0.0
        } else {
            self.time_scale as f64 / self.frame_duration as f64
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.id, self.width, self.height)?;
        if self.frame_duration != 0 {
            write!(f, " @ {:.2}", self.frame_rate())?;
        }
        if let Some(name) = &self.name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

/// Shared handle to an enumerated device.
///
/// Cloning shares the underlying driver reference; the reference is released
/// when the last handle drops.
pub type DeviceHandle = Arc<dyn Device>;

/// Entry point into a driver.
pub trait Driver: Send + Sync {
    /// Create an iterator over attached devices.
    ///
    /// Fails when the driver is not installed or the library cannot be loaded.
    fn create_iterator(&self) -> Result<Box<dyn DeviceIterator>, Error>;
}

/// Sequence of devices in driver order.
pub trait DeviceIterator {
    /// Next device, `Ok(None)` when exhausted.
    fn next_device(&mut self) -> Result<Option<DeviceHandle>, Error>;
}

/// A DeckLink device.
pub trait Device: Send + Sync {
    /// Persistent display name (distinguishes devices of the same model).
    fn display_name(&self) -> Option<String>;

    /// Model name.
    fn model_name(&self) -> Option<String>;

    /// Query the capture-input capability. `None` for output-only devices.
    fn input(&self) -> Option<Box<dyn Input>>;
}

/// Capture-input capability of a device.
///
/// Raw driver results are returned as [`HResult`] so callers decide which
/// failures are fatal.
pub trait Input: Send + Sync {
    /// Display modes the input supports, in driver order.
    fn display_modes(&self) -> Result<Vec<DisplayMode>, Error>;

    fn enable_video_input(
        &self,
        mode: DisplayModeId,
        format: PixelFormat,
        flags: VideoInputFlags,
    ) -> HResult;

    fn disable_video_input(&self) -> HResult;

    /// Register (or with `None`, clear) the frame and format-change callback.
    fn set_callback(&self, callback: Option<&CallbackRef>) -> HResult;

    /// Register (or with `None`, clear) the preview callback.
    fn set_screen_preview_callback(&self, callback: Option<&CallbackRef>) -> HResult;

    fn start_streams(&self) -> HResult;

    fn stop_streams(&self) -> HResult;
}
