// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Driver backend over libDeckLinkAPI.
//!
//! Each wrapper owns one driver reference through [`ComPtr`] and releases it
//! on drop, so every acquired device, input, iterator and display mode is
//! released exactly once.

mod device;
#[cfg(test)]
mod fake;
mod input;

use std::ffi::{c_char, c_void, CStr};

use decklink_sys as ffi;
use log::debug;

use crate::{
    com::ComPtr,
    driver::{DeviceHandle, DeviceIterator, Driver},
    Error, HResult,
};

pub use device::SdkDevice;
pub use input::SdkInput;
pub(crate) use input::display_mode_from_raw;

/// Driver backed by the installed Desktop Video driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkDriver;

impl Driver for SdkDriver {
    fn create_iterator(&self) -> Result<Box<dyn DeviceIterator>, Error> {
        let lib = ffi::init()?;

        let create_fn = *lib
            .CreateDeckLinkIteratorInstance
            .as_ref()
            .map_err(|_| Error::SymbolNotFound("CreateDeckLinkIteratorInstance"))?;

        let iterator = unsafe { ComPtr::from_raw(create_fn()) }.ok_or_else(|| {
            Error::DriverUnavailable(
                "device iterator could not be created, is the Desktop Video driver installed?"
                    .to_string(),
            )
        })?;

        debug!("Created DeckLink device iterator");
        Ok(Box::new(SdkIterator { iterator }))
    }
}

struct SdkIterator {
    iterator: ComPtr<ffi::IDeckLinkIterator>,
}

impl DeviceIterator for SdkIterator {
    fn next_device(&mut self) -> Result<Option<DeviceHandle>, Error> {
        let mut raw = std::ptr::null_mut();
        let result = HResult(com_call!(self.iterator, Next(&mut raw)));

        // Take ownership before checking the result so a device returned
        // alongside an error is still released.
        let device = unsafe { ComPtr::from_raw(raw) };
        let Some(device) = device else {
            return Ok(None);
        };
        result.check("IDeckLinkIterator::Next")?;

        Ok(Some(std::sync::Arc::new(SdkDevice::new(device))))
    }
}

/// Copy a driver-allocated string and free the original.
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string allocated with malloc that
/// the caller owns.
unsafe fn take_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    unsafe { libc::free(ptr.cast_mut().cast::<c_void>()) };
    Some(value)
}
