// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// In-memory driver used by the integration tests. Devices are yielded in the
// order given; inputs record every call made on them and hold callback
// references while registered, like the real driver does.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use decklink::{
    driver::DeviceIterator, CallbackRef, Device, DeviceContext, DeviceHandle, DisplayMode,
    DisplayModeId, Driver, Error, HResult, Input, PixelFormat, VideoInputFlags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Enable(DisplayModeId, PixelFormat, VideoInputFlags),
    Disable,
    SetCallback(bool),
    SetPreviewCallback(bool),
    Start,
    Stop,
}

pub struct FakeInput {
    modes: Vec<DisplayMode>,
    accept: Option<Vec<(DisplayModeId, PixelFormat)>>,
    start_result: HResult,
    calls: Mutex<Vec<Call>>,
    callback: Mutex<Option<CallbackRef>>,
    preview: Mutex<Option<CallbackRef>>,
    open_handles: AtomicUsize,
}

impl FakeInput {
    /// Input offering `modes` that accepts every combination.
    pub fn new(modes: Vec<DisplayMode>) -> Self {
        FakeInput {
            modes,
            accept: None,
            start_result: HResult::OK,
            calls: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
            preview: Mutex::new(None),
            open_handles: AtomicUsize::new(0),
        }
    }

    /// Accept only the listed combinations.
    pub fn accepting(mut self, accept: Vec<(DisplayModeId, PixelFormat)>) -> Self {
        self.accept = Some(accept);
        self
    }

    pub fn with_start_result(mut self, start_result: HResult) -> Self {
        self.start_result = start_result;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<(DisplayModeId, PixelFormat)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Enable(mode, format, _) => Some((mode, format)),
                _ => None,
            })
            .collect()
    }

    /// Input handles currently acquired and not yet released.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn holds_callback(&self) -> bool {
        self.callback.lock().unwrap().is_some() || self.preview.lock().unwrap().is_some()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

struct InputHandle(Arc<FakeInput>);

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.0.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Input for InputHandle {
    fn display_modes(&self) -> Result<Vec<DisplayMode>, Error> {
        Ok(self.0.modes.clone())
    }

    fn enable_video_input(
        &self,
        mode: DisplayModeId,
        format: PixelFormat,
        flags: VideoInputFlags,
    ) -> HResult {
        self.0.record(Call::Enable(mode, format, flags));
        let accepted = match &self.0.accept {
            None => true,
            Some(accept) => accept.contains(&(mode, format)),
        };
        if accepted {
            HResult::OK
        } else {
            HResult::NOT_IMPLEMENTED
        }
    }

    fn disable_video_input(&self) -> HResult {
        self.0.record(Call::Disable);
        HResult::OK
    }

    fn set_callback(&self, callback: Option<&CallbackRef>) -> HResult {
        self.0.record(Call::SetCallback(callback.is_some()));
        *self.0.callback.lock().unwrap() = callback.cloned();
        HResult::OK
    }

    fn set_screen_preview_callback(&self, callback: Option<&CallbackRef>) -> HResult {
        self.0.record(Call::SetPreviewCallback(callback.is_some()));
        *self.0.preview.lock().unwrap() = callback.cloned();
        HResult::OK
    }

    fn start_streams(&self) -> HResult {
        self.0.record(Call::Start);
        self.0.start_result
    }

    fn stop_streams(&self) -> HResult {
        self.0.record(Call::Stop);
        HResult::OK
    }
}

pub struct FakeDevice {
    display_name: Option<String>,
    model_name: Option<String>,
    input: Option<Arc<FakeInput>>,
}

impl FakeDevice {
    pub fn capture(display_name: &str, input: Arc<FakeInput>) -> Arc<Self> {
        Arc::new(FakeDevice {
            display_name: Some(display_name.to_string()),
            model_name: None,
            input: Some(input),
        })
    }

    pub fn output_only(display_name: &str) -> Arc<Self> {
        Arc::new(FakeDevice {
            display_name: Some(display_name.to_string()),
            model_name: None,
            input: None,
        })
    }

    /// Capture device that reports no names, so its serial is its index.
    pub fn unnamed(input: Arc<FakeInput>) -> Arc<Self> {
        Arc::new(FakeDevice {
            display_name: None,
            model_name: None,
            input: Some(input),
        })
    }

    pub fn model_only(model_name: &str, input: Arc<FakeInput>) -> Arc<Self> {
        Arc::new(FakeDevice {
            display_name: Some(String::new()),
            model_name: Some(model_name.to_string()),
            input: Some(input),
        })
    }
}

impl Device for FakeDevice {
    fn display_name(&self) -> Option<String> {
        self.display_name.clone()
    }

    fn model_name(&self) -> Option<String> {
        self.model_name.clone()
    }

    fn input(&self) -> Option<Box<dyn Input>> {
        let input = self.input.clone()?;
        input.open_handles.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(InputHandle(input)))
    }
}

#[derive(Default)]
pub struct FakeDriver {
    devices: Vec<Arc<FakeDevice>>,
    unavailable: bool,
    fail_at: Option<usize>,
    iterators: AtomicUsize,
}

impl FakeDriver {
    pub fn new(devices: Vec<Arc<FakeDevice>>) -> Self {
        FakeDriver {
            devices,
            ..Default::default()
        }
    }

    /// A driver that cannot create iterators, as when it is not installed.
    pub fn unavailable() -> Self {
        FakeDriver {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Fail the iterator step that would yield device `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn iterators_created(&self) -> usize {
        self.iterators.load(Ordering::SeqCst)
    }
}

impl Driver for FakeDriver {
    fn create_iterator(&self) -> Result<Box<dyn DeviceIterator>, Error> {
        if self.unavailable {
            return Err(Error::DriverUnavailable("fake driver offline".to_string()));
        }
        self.iterators.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeIterator {
            devices: self.devices.clone(),
            position: 0,
            fail_at: self.fail_at,
        }))
    }
}

struct FakeIterator {
    devices: Vec<Arc<FakeDevice>>,
    position: usize,
    fail_at: Option<usize>,
}

impl DeviceIterator for FakeIterator {
    fn next_device(&mut self) -> Result<Option<DeviceHandle>, Error> {
        if self.fail_at == Some(self.position) {
            return Err(Error::Driver {
                call: "IDeckLinkIterator::Next",
                result: HResult::FAIL,
            });
        }
        let device = self.devices.get(self.position).cloned();
        self.position += 1;
        Ok(device.map(|device| device as DeviceHandle))
    }
}

pub fn context(driver: FakeDriver) -> DeviceContext {
    DeviceContext::new(Arc::new(driver))
}

pub fn hd_modes() -> Vec<DisplayMode> {
    vec![
        DisplayMode::new(DisplayModeId::NTSC, 720, 486)
            .with_name("NTSC")
            .with_frame_rate(1001, 30000),
        DisplayMode::new(DisplayModeId::HD1080I50, 1920, 1080)
            .with_name("1080i50")
            .with_frame_rate(1000, 25000),
        DisplayMode::new(DisplayModeId::HD1080P30, 1920, 1080)
            .with_name("1080p30")
            .with_frame_rate(1000, 30000),
    ]
}

pub fn input() -> Arc<FakeInput> {
    Arc::new(FakeInput::new(hd_modes()))
}

pub fn serials(ctx: &DeviceContext) -> Vec<String> {
    ctx.device_names().unwrap()
}
