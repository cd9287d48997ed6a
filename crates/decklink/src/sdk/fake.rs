// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! In-process stand-ins for driver objects.
//!
//! Each fake carries a real vtable and an atomic reference count, so the SDK
//! wrappers run unchanged against them. Tests own the fakes; a count that
//! returns to one means every reference handed to a wrapper was released.

use std::{
    collections::VecDeque,
    ffi::{c_char, c_long, c_void, CStr},
    ptr,
    sync::{
        atomic::{AtomicU32, Ordering},
        Mutex,
    },
};

use decklink_sys as ffi;

use crate::com::ComPtr;

#[repr(C)]
pub(super) struct Fake<V: 'static, S> {
    // Only read through the object pointer.
    #[allow(dead_code)]
    vtbl: &'static V,
    refs: AtomicU32,
    pub state: S,
}

impl<V: 'static, S> Fake<V, S> {
    fn new(vtbl: &'static V, state: S) -> Box<Self> {
        Box::new(Fake {
            vtbl,
            refs: AtomicU32::new(1),
            state,
        })
    }

    /// References currently held, including the test's own.
    pub fn refs(&self) -> u32 {
        self.refs.load(Ordering::SeqCst)
    }

    pub fn as_raw<T>(&self) -> *mut T {
        (self as *const Self).cast_mut().cast()
    }

    /// A new counted reference, as the driver hands them out.
    pub fn acquire<T>(&self) -> ComPtr<T> {
        self.refs.fetch_add(1, Ordering::SeqCst);
        unsafe { ComPtr::from_raw(self.as_raw()) }.expect("fake is never null")
    }
}

type Unknown = Fake<ffi::IUnknownVtbl, ()>;

/// # Safety
///
/// `this` must point to a live fake.
unsafe fn refs<'a>(this: *mut c_void) -> &'a AtomicU32 {
    unsafe { &(*this.cast::<Unknown>()).refs }
}

unsafe extern "C" fn add_ref(this: *mut c_void) -> ffi::ULONG {
    unsafe { refs(this) }.fetch_add(1, Ordering::SeqCst) + 1
}

// Over-release wraps the count, which the owning test then sees.
unsafe extern "C" fn release(this: *mut c_void) -> ffi::ULONG {
    unsafe { refs(this) }
        .fetch_sub(1, Ordering::SeqCst)
        .wrapping_sub(1)
}

unsafe extern "C" fn query_interface(
    this: *mut c_void,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    if iid == ffi::IID_IUnknown {
        unsafe { give(this, ppv) }
    } else {
        unsafe { *ppv = ptr::null_mut() };
        ffi::E_NOINTERFACE
    }
}

/// Hand out `object` with a new reference, or null.
unsafe fn give<T>(object: *mut T, out: *mut *mut T) -> ffi::HRESULT {
    if !object.is_null() {
        unsafe { add_ref(object.cast()) };
    }
    unsafe { *out = object };
    ffi::S_OK
}

/// Hand out a malloc'd copy of `value` the way the SDK returns strings.
unsafe fn give_string(value: Option<&CStr>, out: *mut *const c_char) -> ffi::HRESULT {
    match value {
        Some(value) => {
            unsafe { *out = libc::strdup(value.as_ptr()) };
            ffi::S_OK
        }
        None => {
            unsafe { *out = ptr::null() };
            ffi::E_FAIL
        }
    }
}

const UNKNOWN: ffi::IUnknownVtbl = ffi::IUnknownVtbl {
    QueryInterface: query_interface,
    AddRef: add_ref,
    Release: release,
};

/// Results returned by successive `Next` calls, then `S_FALSE` with null.
pub(super) struct Queue<T>(Mutex<VecDeque<(ffi::HRESULT, *mut T)>>);

impl<T> Queue<T> {
    fn new(items: Vec<(ffi::HRESULT, *mut T)>) -> Self {
        Queue(Mutex::new(items.into()))
    }

    unsafe fn next(&self, out: *mut *mut T) -> ffi::HRESULT {
        let item = self.0.lock().unwrap().pop_front();
        match item {
            Some((result, object)) => {
                unsafe { give(object, out) };
                result
            }
            None => {
                unsafe { *out = ptr::null_mut() };
                ffi::S_FALSE
            }
        }
    }
}

// Device iterator

pub(super) type FakeDeviceIterator = Fake<ffi::IDeckLinkIteratorVtbl, Queue<ffi::IDeckLink>>;

unsafe extern "C" fn device_iterator_next(
    this: *mut ffi::IDeckLinkIterator,
    out: *mut *mut ffi::IDeckLink,
) -> ffi::HRESULT {
    let iterator = unsafe { &*this.cast::<FakeDeviceIterator>() };
    unsafe { iterator.state.next(out) }
}

static DEVICE_ITERATOR_VTBL: ffi::IDeckLinkIteratorVtbl = ffi::IDeckLinkIteratorVtbl {
    base: UNKNOWN,
    Next: device_iterator_next,
};

pub(super) fn device_iterator(
    devices: Vec<(ffi::HRESULT, *mut ffi::IDeckLink)>,
) -> Box<FakeDeviceIterator> {
    Fake::new(&DEVICE_ITERATOR_VTBL, Queue::new(devices))
}

// Device

pub(super) struct DeviceState {
    display_name: Option<&'static CStr>,
    model_name: Option<&'static CStr>,
    input: *mut ffi::IDeckLinkInput,
    pub queries: AtomicU32,
}

pub(super) type FakeDevice = Fake<ffi::IDeckLinkVtbl, DeviceState>;

unsafe extern "C" fn device_query_interface(
    this: *mut c_void,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    let device = unsafe { &*this.cast::<FakeDevice>() };
    device.state.queries.fetch_add(1, Ordering::SeqCst);
    if iid == ffi::IID_IDeckLinkInput && !device.state.input.is_null() {
        unsafe { give(device.state.input.cast(), ppv) }
    } else {
        unsafe { query_interface(this, iid, ppv) }
    }
}

unsafe extern "C" fn device_model_name(
    this: *mut ffi::IDeckLink,
    name: *mut *const c_char,
) -> ffi::HRESULT {
    let device = unsafe { &*this.cast::<FakeDevice>() };
    unsafe { give_string(device.state.model_name, name) }
}

unsafe extern "C" fn device_display_name(
    this: *mut ffi::IDeckLink,
    name: *mut *const c_char,
) -> ffi::HRESULT {
    let device = unsafe { &*this.cast::<FakeDevice>() };
    unsafe { give_string(device.state.display_name, name) }
}

static DEVICE_VTBL: ffi::IDeckLinkVtbl = ffi::IDeckLinkVtbl {
    base: ffi::IUnknownVtbl {
        QueryInterface: device_query_interface,
        AddRef: add_ref,
        Release: release,
    },
    GetModelName: device_model_name,
    GetDisplayName: device_display_name,
};

/// A device; `input` is null for output-only hardware.
pub(super) fn device(
    display_name: Option<&'static CStr>,
    model_name: Option<&'static CStr>,
    input: *mut ffi::IDeckLinkInput,
) -> Box<FakeDevice> {
    Fake::new(
        &DEVICE_VTBL,
        DeviceState {
            display_name,
            model_name,
            input,
            queries: AtomicU32::new(0),
        },
    )
}

// Input

pub(super) struct InputState {
    modes: *mut ffi::IDeckLinkDisplayModeIterator,
    modes_result: ffi::HRESULT,
}

pub(super) type FakeInput = Fake<ffi::IDeckLinkInputVtbl, InputState>;

unsafe extern "C" fn input_display_mode_iterator(
    this: *mut ffi::IDeckLinkInput,
    out: *mut *mut ffi::IDeckLinkDisplayModeIterator,
) -> ffi::HRESULT {
    let input = unsafe { &*this.cast::<FakeInput>() };
    unsafe { give(input.state.modes, out) };
    input.state.modes_result
}

unsafe extern "C" fn input_ok(_this: *mut ffi::IDeckLinkInput) -> ffi::HRESULT {
    ffi::S_OK
}

unsafe extern "C" fn input_does_support(
    _this: *mut ffi::IDeckLinkInput,
    _mode: ffi::BMDDisplayMode,
    _format: ffi::BMDPixelFormat,
    _flags: ffi::BMDVideoInputFlags,
    _result: *mut ffi::BMDDisplayModeSupport,
    _actual: *mut *mut ffi::IDeckLinkDisplayMode,
) -> ffi::HRESULT {
    ffi::E_NOTIMPL
}

unsafe extern "C" fn input_set_preview(
    _this: *mut ffi::IDeckLinkInput,
    _callback: *mut ffi::IDeckLinkScreenPreviewCallback,
) -> ffi::HRESULT {
    ffi::S_OK
}

unsafe extern "C" fn input_enable_video(
    _this: *mut ffi::IDeckLinkInput,
    _mode: ffi::BMDDisplayMode,
    _format: ffi::BMDPixelFormat,
    _flags: ffi::BMDVideoInputFlags,
) -> ffi::HRESULT {
    ffi::S_OK
}

unsafe extern "C" fn input_count(_this: *mut ffi::IDeckLinkInput, count: *mut u32) -> ffi::HRESULT {
    unsafe { *count = 0 };
    ffi::S_OK
}

unsafe extern "C" fn input_set_allocator(
    _this: *mut ffi::IDeckLinkInput,
    _allocator: *mut c_void,
) -> ffi::HRESULT {
    ffi::E_NOTIMPL
}

unsafe extern "C" fn input_enable_audio(
    _this: *mut ffi::IDeckLinkInput,
    _rate: ffi::BMDAudioSampleRate,
    _kind: ffi::BMDAudioSampleType,
    _channels: u32,
) -> ffi::HRESULT {
    ffi::E_NOTIMPL
}

unsafe extern "C" fn input_set_callback(
    _this: *mut ffi::IDeckLinkInput,
    _callback: *mut ffi::IDeckLinkInputCallback,
) -> ffi::HRESULT {
    ffi::S_OK
}

static INPUT_VTBL: ffi::IDeckLinkInputVtbl = ffi::IDeckLinkInputVtbl {
    base: UNKNOWN,
    DoesSupportVideoMode: input_does_support,
    GetDisplayModeIterator: input_display_mode_iterator,
    SetScreenPreviewCallback: input_set_preview,
    EnableVideoInput: input_enable_video,
    DisableVideoInput: input_ok,
    GetAvailableVideoFrameCount: input_count,
    SetVideoInputFrameMemoryAllocator: input_set_allocator,
    EnableAudioInput: input_enable_audio,
    DisableAudioInput: input_ok,
    GetAvailableAudioSampleFrameCount: input_count,
    StartStreams: input_ok,
    StopStreams: input_ok,
    PauseStreams: input_ok,
    FlushStreams: input_ok,
    SetCallback: input_set_callback,
};

/// An input whose `GetDisplayModeIterator` hands out `modes` and returns `result`.
pub(super) fn input(
    modes: *mut ffi::IDeckLinkDisplayModeIterator,
    result: ffi::HRESULT,
) -> Box<FakeInput> {
    Fake::new(
        &INPUT_VTBL,
        InputState {
            modes,
            modes_result: result,
        },
    )
}

// Display mode iterator

pub(super) type FakeModeIterator =
    Fake<ffi::IDeckLinkDisplayModeIteratorVtbl, Queue<ffi::IDeckLinkDisplayMode>>;

unsafe extern "C" fn mode_iterator_next(
    this: *mut ffi::IDeckLinkDisplayModeIterator,
    out: *mut *mut ffi::IDeckLinkDisplayMode,
) -> ffi::HRESULT {
    let iterator = unsafe { &*this.cast::<FakeModeIterator>() };
    unsafe { iterator.state.next(out) }
}

static MODE_ITERATOR_VTBL: ffi::IDeckLinkDisplayModeIteratorVtbl =
    ffi::IDeckLinkDisplayModeIteratorVtbl {
        base: UNKNOWN,
        Next: mode_iterator_next,
    };

pub(super) fn mode_iterator(
    modes: Vec<(ffi::HRESULT, *mut ffi::IDeckLinkDisplayMode)>,
) -> Box<FakeModeIterator> {
    Fake::new(&MODE_ITERATOR_VTBL, Queue::new(modes))
}

// Display mode

pub(super) struct ModeState {
    id: ffi::BMDDisplayMode,
    name: &'static CStr,
    width: c_long,
    height: c_long,
    frame_duration: ffi::BMDTimeValue,
    time_scale: ffi::BMDTimeScale,
}

pub(super) type FakeMode = Fake<ffi::IDeckLinkDisplayModeVtbl, ModeState>;

unsafe fn mode<'a>(this: *mut ffi::IDeckLinkDisplayMode) -> &'a ModeState {
    unsafe { &(*this.cast::<FakeMode>()).state }
}

unsafe extern "C" fn mode_name(
    this: *mut ffi::IDeckLinkDisplayMode,
    name: *mut *const c_char,
) -> ffi::HRESULT {
    unsafe { give_string(Some(mode(this).name), name) }
}

unsafe extern "C" fn mode_id(this: *mut ffi::IDeckLinkDisplayMode) -> ffi::BMDDisplayMode {
    unsafe { mode(this).id }
}

unsafe extern "C" fn mode_width(this: *mut ffi::IDeckLinkDisplayMode) -> c_long {
    unsafe { mode(this).width }
}

unsafe extern "C" fn mode_height(this: *mut ffi::IDeckLinkDisplayMode) -> c_long {
    unsafe { mode(this).height }
}

unsafe extern "C" fn mode_frame_rate(
    this: *mut ffi::IDeckLinkDisplayMode,
    frame_duration: *mut ffi::BMDTimeValue,
    time_scale: *mut ffi::BMDTimeScale,
) -> ffi::HRESULT {
    let mode = unsafe { mode(this) };
    unsafe {
        *frame_duration = mode.frame_duration;
        *time_scale = mode.time_scale;
    }
    ffi::S_OK
}

unsafe extern "C" fn mode_zero(_this: *mut ffi::IDeckLinkDisplayMode) -> u32 {
    0
}

static MODE_VTBL: ffi::IDeckLinkDisplayModeVtbl = ffi::IDeckLinkDisplayModeVtbl {
    base: UNKNOWN,
    GetName: mode_name,
    GetDisplayMode: mode_id,
    GetWidth: mode_width,
    GetHeight: mode_height,
    GetFrameRate: mode_frame_rate,
    GetFieldDominance: mode_zero,
    GetFlags: mode_zero,
};

pub(super) fn display_mode(
    id: ffi::BMDDisplayMode,
    name: &'static CStr,
    width: c_long,
    height: c_long,
    frame_duration: ffi::BMDTimeValue,
    time_scale: ffi::BMDTimeScale,
) -> Box<FakeMode> {
    Fake::new(
        &MODE_VTBL,
        ModeState {
            id,
            name,
            width,
            height,
            frame_duration,
            time_scale,
        },
    )
}
