// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! DeckLink Capture Library for Rust
//!
//! Safe Rust bindings for Blackmagic DeckLink capture hardware, covering
//! device discovery, device selection by match pattern, video mode
//! negotiation and the lifetime of a running capture session.
//!
//! The DeckLink driver is a COM-style C++ API: every object is manually
//! reference counted and the driver calls back into the application from its
//! own capture threads. This crate hides that behind the [`driver`] traits,
//! a reference-counted [`callback::CallbackRef`] the driver can hold safely,
//! and a [`session::CaptureSession`] that stops the hardware when dropped.
//!
//! # Quick Start
//!
//! ## Listing Devices
//!
//! ```no_run
//! decklink::enumerate_device_names(|serial| println!("{}", serial))?;
//! # Ok::<(), decklink::Error>(())
//! ```
//!
//! ## Opening a Capture Session
//!
//! ```no_run
//! // "*" selects the first input-capable device, any other pattern is a
//! // case-insensitive substring of the device serial.
//! let session = decklink::open_session("UltraStudio")?;
//! println!(
//!     "{} streaming {} as {}",
//!     session.serial(),
//!     session.display_mode().id,
//!     session.pixel_format()
//! );
//! # Ok::<(), decklink::Error>(())
//! ```
//!
//! # Runtime Requirements
//!
//! `libDeckLinkAPI.so` is loaded at runtime from the Desktop Video driver
//! package. Set `DECKLINK_LIBRARY` to load it from a custom path.

use std::{error, fmt};

use decklink_sys as ffi;

pub use driver::HResult;

/// Error type for DeckLink operations
#[derive(Debug)]
pub enum Error {
    /// The DeckLink dispatch library (libDeckLinkAPI.so) could not be loaded at runtime
    LibraryNotLoaded(ffi::libloading::Error),

    /// A required entry point is missing from the loaded library
    SymbolNotFound(&'static str),

    /// The driver could not create a device iterator (driver not installed)
    DriverUnavailable(String),

    /// No enumerated device matched the requested pattern
    DeviceNotFound(String),

    /// The device does not implement a required capability
    CapabilityUnsupported(&'static str),

    /// Every display mode and pixel format combination was rejected
    NoCompatibleMode,

    /// The driver rejected the request to start streaming
    StreamStartFailed(HResult),

    /// A driver call returned a failure code
    Driver {
        call: &'static str,
        result: HResult,
    },

    /// A capability query named an interface the object does not implement
    NoInterface,

    /// Null pointer returned from the DeckLink API where a valid pointer was expected
    NullPointer,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LibraryNotLoaded(err) => {
                write!(f, "DeckLink library could not be loaded: {}", err)
            }
            Error::SymbolNotFound(sym) => write!(f, "DeckLink library symbol not found: {}", sym),
            Error::DriverUnavailable(msg) => write!(f, "DeckLink driver unavailable: {}", msg),
            Error::DeviceNotFound(pattern) => {
                write!(f, "No DeckLink devices matching {}", pattern)
            }
            Error::CapabilityUnsupported(cap) => write!(f, "Device does not support {}", cap),
            Error::NoCompatibleMode => write!(f, "No compatible video mode"),
            Error::StreamStartFailed(result) => write!(f, "Failed to start capture: {}", result),
            Error::Driver { call, result } => write!(f, "{} failed: {}", call, result),
            Error::NoInterface => write!(f, "Interface not supported"),
            Error::NullPointer => write!(f, "Null pointer returned from DeckLink API"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LibraryNotLoaded(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ffi::libloading::Error> for Error {
    fn from(err: ffi::libloading::Error) -> Self {
        Error::LibraryNotLoaded(err)
    }
}

/// Call a method through a COM vtable: `com_call!(ptr, Method(args))`.
///
/// `ptr` is anything with an `as_ptr()` returning a pointer to an interface
/// struct whose first field is its vtable pointer.
macro_rules! com_call {
    ($ptr:expr, $method:ident($($arg:expr),*)) => {{
        let this = $ptr.as_ptr();
        #[allow(unused_unsafe)]
        let result = unsafe { ((*(*this).lpVtbl).$method)(this $(, $arg)*) };
        result
    }};
}

/// The fourcc module provides the big-endian codes used by DeckLink enums.
pub mod fourcc;

/// The driver module defines the interface the capture core consumes.
pub mod driver;

/// The com module provides reference-counted interface pointers.
pub mod com;

/// The callback module provides the ref-counted object the driver calls into.
pub mod callback;

/// The discovery module enumerates devices and resolves match patterns.
pub mod discovery;

/// The session module negotiates a video mode and runs the capture stream.
pub mod session;

/// The extractor module adapts a capture session to media extraction.
pub mod extractor;

/// The sdk module implements the driver interface over libDeckLinkAPI.
pub mod sdk;

pub use callback::{CallbackRef, CallbackStats};
pub use discovery::{context, enumerate_device_names, open_session, DeviceContext};
pub use driver::{
    Device, DeviceHandle, DisplayMode, DisplayModeId, Driver, Input, PixelFormat, VideoInputFlags,
};
pub use session::{CaptureConfig, CaptureSession, SessionState};

/// Get the DeckLink API version string (e.g. "10.11.4")
///
/// Returns an error if the library is not loaded.
pub fn version() -> Result<String, Error> {
    let lib = ffi::init()?;

    let create_fn = *lib
        .CreateDeckLinkAPIInformationInstance
        .as_ref()
        .map_err(|_| Error::SymbolNotFound("CreateDeckLinkAPIInformationInstance"))?;

    let info = unsafe { com::ComPtr::from_raw(create_fn()) }.ok_or(Error::NullPointer)?;

    let mut packed: i64 = 0;
    let result = HResult(com_call!(info, GetInt(ffi::BMDDeckLinkAPIVersion, &mut packed)));
    result.check("IDeckLinkAPIInformation::GetInt")?;

    Ok(format_version(packed))
}

/// The API reports its version as `0xMMmmpp00`.
fn format_version(packed: i64) -> String {
    let major = (packed >> 24) & 0xff;
    let minor = (packed >> 16) & 0xff;
    let point = (packed >> 8) & 0xff;
    format!("{}.{}.{}", major, minor, point)
}
