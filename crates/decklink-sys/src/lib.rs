// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

include!("ffi.rs");

// Re-export libloading for error handling
pub use libloading;

use std::sync::{Mutex, OnceLock};

/// Library loaded when `DECKLINK_LIBRARY` is not set.
pub const DEFAULT_LIBRARY_NAME: &str = "libDeckLinkAPI.so";

static LIBRARY: OnceLock<DeckLinkLibrary> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the DeckLink API by loading libDeckLinkAPI.so
///
/// The library is installed by the Desktop Video driver package; failure to
/// load it almost always means the driver is not installed.
///
/// The environment variable `DECKLINK_LIBRARY` can be used to specify
/// a custom path to the library. If not set, searches standard system paths.
pub fn init() -> Result<&'static DeckLinkLibrary, libloading::Error> {
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    // Double-check after acquiring lock
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let lib_path =
        std::env::var("DECKLINK_LIBRARY").unwrap_or_else(|_| DEFAULT_LIBRARY_NAME.to_string());

    let lib = unsafe { DeckLinkLibrary::new(lib_path.as_str())? };

    Ok(LIBRARY.get_or_init(|| lib))
}
