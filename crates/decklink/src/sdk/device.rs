// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::{fmt, ptr};

use decklink_sys as ffi;
use log::trace;

use super::{take_string, SdkInput};
use crate::{
    com::ComPtr,
    driver::{Device, Input},
    HResult,
};

/// A device returned by the DeckLink iterator.
pub struct SdkDevice {
    device: ComPtr<ffi::IDeckLink>,
}

impl SdkDevice {
    pub(super) fn new(device: ComPtr<ffi::IDeckLink>) -> Self {
        SdkDevice { device }
    }
}

impl Device for SdkDevice {
    fn display_name(&self) -> Option<String> {
        let mut name = ptr::null();
        let result = HResult(com_call!(self.device, GetDisplayName(&mut name)));
        let name = unsafe { take_string(name) };
        result.is_ok().then_some(name).flatten()
    }

    fn model_name(&self) -> Option<String> {
        let mut name = ptr::null();
        let result = HResult(com_call!(self.device, GetModelName(&mut name)));
        let name = unsafe { take_string(name) };
        result.is_ok().then_some(name).flatten()
    }

    fn input(&self) -> Option<Box<dyn Input>> {
        match self
            .device
            .query_interface::<ffi::IDeckLinkInput>(&ffi::IID_IDeckLinkInput)
        {
            Ok(input) => Some(Box::new(SdkInput::new(input))),
            Err(result) => {
                trace!("IDeckLinkInput not available: {}", result);
                None
            }
        }
    }
}

impl fmt::Debug for SdkDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkDevice")
            .field("device", &self.device)
            .finish()
    }
}
