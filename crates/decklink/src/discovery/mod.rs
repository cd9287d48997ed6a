// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Device discovery and selection.
//!
//! Devices are identified by a serial string (see [`serial_for`]) and
//! selected with a match pattern (see [`matches`]). The process-wide
//! [`context()`] talks to the installed driver; [`DeviceContext::new`] accepts
//! any other [`crate::Driver`].
//!
//! # Example
//!
//! ```no_run
//! for serial in decklink::context().device_names()? {
//!     println!("{}", serial);
//! }
//! # Ok::<(), decklink::Error>(())
//! ```

mod context;
mod enumerator;
mod matcher;
mod serial;

use std::sync::{Arc, OnceLock};

pub use context::DeviceContext;
pub use enumerator::{DeviceEnumerator, DEFAULT_MAX_DEVICES};
pub use matcher::{matches, MATCH_ANY};
pub use serial::serial_for;

use crate::{
    sdk::SdkDriver,
    session::{CaptureConfig, CaptureSession},
    Error,
};

static CONTEXT: OnceLock<DeviceContext> = OnceLock::new();

/// Process-wide context over the installed DeckLink driver.
///
/// Created on first use. The driver library itself is only loaded when the
/// first enumeration runs.
pub fn context() -> &'static DeviceContext {
    CONTEXT.get_or_init(|| DeviceContext::new(Arc::new(SdkDriver)))
}

/// Visit the serial of every capture-capable device on the installed driver.
pub fn enumerate_device_names<F>(visit: F) -> Result<usize, Error>
where
    F: FnMut(&str),
{
    context().enumerate_names(visit)
}

/// Open a capture session on the first installed device matching `pattern`,
/// with the default configuration.
pub fn open_session(pattern: &str) -> Result<CaptureSession, Error> {
    context().open_session(pattern, &CaptureConfig::default())
}
