// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::ptr;

use decklink_sys as ffi;
use log::warn;

use super::take_string;
use crate::{
    callback::CallbackRef,
    com::ComPtr,
    driver::{DisplayMode, DisplayModeId, Input, PixelFormat, VideoInputFlags},
    Error, HResult,
};

/// Upper bound on modes read from one iterator.
const MAX_DISPLAY_MODES: usize = 256;

/// Capture input of an [`super::SdkDevice`].
#[derive(Debug)]
pub struct SdkInput {
    input: ComPtr<ffi::IDeckLinkInput>,
}

impl SdkInput {
    pub(super) fn new(input: ComPtr<ffi::IDeckLinkInput>) -> Self {
        SdkInput { input }
    }
}

impl Input for SdkInput {
    fn display_modes(&self) -> Result<Vec<DisplayMode>, Error> {
        let mut raw = ptr::null_mut();
        let result = HResult(com_call!(self.input, GetDisplayModeIterator(&mut raw)));
        // Owned before the check so an iterator returned with an error is released.
        let iterator = unsafe { ComPtr::from_raw(raw) };
        result.check("IDeckLinkInput::GetDisplayModeIterator")?;
        let iterator = iterator.ok_or(Error::NullPointer)?;

        let mut modes = Vec::new();
        loop {
            let mut raw = ptr::null_mut();
            let result = HResult(com_call!(iterator, Next(&mut raw)));
            let Some(mode) = (unsafe { ComPtr::from_raw(raw) }) else {
                break;
            };
            if !result.is_ok() {
                break;
            }
            if let Some(mode) = unsafe { display_mode_from_raw(mode.as_ptr()) } {
                modes.push(mode);
            }
            if modes.len() >= MAX_DISPLAY_MODES {
                warn!("Display mode list truncated at {}", MAX_DISPLAY_MODES);
                break;
            }
        }
        Ok(modes)
    }

    fn enable_video_input(
        &self,
        mode: DisplayModeId,
        format: PixelFormat,
        flags: VideoInputFlags,
    ) -> HResult {
        HResult(com_call!(
            self.input,
            EnableVideoInput(mode.as_raw(), format.as_raw(), flags.bits())
        ))
    }

    fn disable_video_input(&self) -> HResult {
        HResult(com_call!(self.input, DisableVideoInput()))
    }

    fn set_callback(&self, callback: Option<&CallbackRef>) -> HResult {
        let callback = callback.map_or(ptr::null_mut(), CallbackRef::input_callback_ptr);
        HResult(com_call!(self.input, SetCallback(callback)))
    }

    fn set_screen_preview_callback(&self, callback: Option<&CallbackRef>) -> HResult {
        let callback = callback.map_or(ptr::null_mut(), CallbackRef::screen_preview_callback_ptr);
        HResult(com_call!(self.input, SetScreenPreviewCallback(callback)))
    }

    fn start_streams(&self) -> HResult {
        HResult(com_call!(self.input, StartStreams()))
    }

    fn stop_streams(&self) -> HResult {
        HResult(com_call!(self.input, StopStreams()))
    }
}

/// Read a display mode without taking a reference.
///
/// # Safety
///
/// `mode` must be null or point to a display mode that stays alive for the call.
pub(crate) unsafe fn display_mode_from_raw(
    mode: *mut ffi::IDeckLinkDisplayMode,
) -> Option<DisplayMode> {
    let mode = ptr::NonNull::new(mode)?;

    let id = DisplayModeId::from_raw(com_call!(mode, GetDisplayMode()));
    let width = com_call!(mode, GetWidth()).max(0) as u32;
    let height = com_call!(mode, GetHeight()).max(0) as u32;

    let mut name = ptr::null();
    let result = HResult(com_call!(mode, GetName(&mut name)));
    let name = unsafe { take_string(name) };
    let name = result.is_ok().then_some(name).flatten();

    let mut frame_duration: i64 = 0;
    let mut time_scale: i64 = 0;
    if !HResult(com_call!(mode, GetFrameRate(&mut frame_duration, &mut time_scale))).is_ok() {
        frame_duration = 0;
        time_scale = 0;
    }

    Some(DisplayMode {
        id,
        name,
        width,
        height,
        frame_duration,
        time_scale,
    })
}
