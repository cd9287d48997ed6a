// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Callback object registered with the driver.
//!
//! The driver keeps raw pointers to the callback and calls AddRef and Release
//! from its own threads. The object therefore lives on the heap with an
//! atomic count starting at one and frees itself when the last reference is
//! released, whether that reference is held by Rust or by the driver.
//!
//! Three interface views share one object. The input callback sits at
//! offset 0 and doubles as the identity returned for IUnknown. The screen
//! preview and device notification views follow it, each with its own
//! vtable whose thunks adjust `this` back to the start of the object.

use std::{
    ffi::c_void,
    fmt,
    mem::offset_of,
    ptr::{self, NonNull},
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Arc,
    },
};

use decklink_sys as ffi;
use log::{debug, trace};
use serde::Serialize;

use crate::{
    com::{self, ComPtr},
    driver::{DetectedSignalFlags, DisplayMode, FormatChangeEvents},
    Error, HResult,
};

/// Interface identifier.
pub type Iid = ffi::REFIID;

/// Interfaces the callback object answers QueryInterface for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The base identity (IUnknown).
    Identity,
    /// Device arrival and removal notifications.
    DeviceNotification,
}

impl Capability {
    pub fn from_iid(iid: &Iid) -> Option<Self> {
        if *iid == ffi::IID_IUnknown {
            Some(Capability::Identity)
        } else if *iid == ffi::IID_IDeckLinkDeviceNotificationCallback {
            Some(Capability::DeviceNotification)
        } else {
            None
        }
    }

    pub fn iid(self) -> Iid {
        match self {
            Capability::Identity => ffi::IID_IUnknown,
            Capability::DeviceNotification => ffi::IID_IDeckLinkDeviceNotificationCallback,
        }
    }
}

/// Snapshot of callback activity. Diagnostic only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallbackStats {
    pub format_changes: u64,
    pub frames_arrived: u64,
    pub preview_frames: u64,
}

/// Event sink shared by every reference to one callback object.
#[derive(Debug)]
pub struct CallbackEvents {
    label: String,
    format_changes: AtomicU64,
    frames_arrived: AtomicU64,
    preview_frames: AtomicU64,
}

impl CallbackEvents {
    pub fn new(label: impl Into<String>) -> Self {
        CallbackEvents {
            label: label.into(),
            format_changes: AtomicU64::new(0),
            frames_arrived: AtomicU64::new(0),
            preview_frames: AtomicU64::new(0),
        }
    }

    /// Label used in log output, normally the device serial.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stats(&self) -> CallbackStats {
        CallbackStats {
            format_changes: self.format_changes.load(Ordering::Relaxed),
            frames_arrived: self.frames_arrived.load(Ordering::Relaxed),
            preview_frames: self.preview_frames.load(Ordering::Relaxed),
        }
    }
}

#[repr(C)]
struct CallbackObject {
    input: ffi::IDeckLinkInputCallback,
    preview: ffi::IDeckLinkScreenPreviewCallback,
    notification: ffi::IDeckLinkDeviceNotificationCallback,
    ref_count: AtomicU32,
    events: Arc<CallbackEvents>,
}

const PREVIEW_OFFSET: usize = offset_of!(CallbackObject, preview);
const NOTIFICATION_OFFSET: usize = offset_of!(CallbackObject, notification);

impl CallbackObject {
    fn add_ref(&self) -> u32 {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// # Safety
    ///
    /// `this` must point to a live object and the caller gives up one reference.
    unsafe fn release(this: *const CallbackObject) -> u32 {
        let previous = unsafe { (*this).ref_count.fetch_sub(1, Ordering::AcqRel) };
        debug_assert!(previous > 0, "callback released more often than referenced");
        if previous == 1 {
            // SAFETY: the count reached zero, nobody else can reach the object.
            drop(unsafe { Box::from_raw(this.cast_mut()) });
        }
        previous.saturating_sub(1)
    }

    /// Adds a reference when `iid` names a supported capability.
    fn query_interface(&self, iid: &Iid) -> Option<Capability> {
        let capability = Capability::from_iid(iid)?;
        self.add_ref();
        Some(capability)
    }

    fn device_notification(&self, arrived: bool, device: *mut ffi::IDeckLink) -> HResult {
        debug!(
            "{}: DeckLink device {:p} {}",
            self.events.label,
            device,
            if arrived { "arrived" } else { "removed" }
        );
        HResult::OK
    }

    fn format_changed(
        &self,
        events: FormatChangeEvents,
        mode: Option<&DisplayMode>,
        flags: DetectedSignalFlags,
    ) -> HResult {
        self.events.format_changes.fetch_add(1, Ordering::Relaxed);
        match mode {
            Some(mode) => debug!(
                "{}: video input format changed to {} (events {:#x}, signal {:#x})",
                self.events.label, mode, events.0, flags.0
            ),
            None => debug!(
                "{}: video input format changed (events {:#x}, signal {:#x})",
                self.events.label, events.0, flags.0
            ),
        }
        HResult::OK
    }

    fn frame_arrived(&self, has_video: bool, has_audio: bool) -> HResult {
        let count = self.events.frames_arrived.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(
            "{}: frame {} arrived (video: {}, audio: {})",
            self.events.label,
            count,
            has_video,
            has_audio
        );
        HResult::OK
    }

    fn draw_frame(&self) -> HResult {
        self.events.preview_frames.fetch_add(1, Ordering::Relaxed);
        trace!("{}: preview frame", self.events.label);
        HResult::OK
    }
}

fn from_input<T>(this: *mut T) -> *const CallbackObject {
    this.cast_const().cast()
}

fn from_preview<T>(this: *mut T) -> *const CallbackObject {
    this.cast_const()
        .cast::<u8>()
        .wrapping_sub(PREVIEW_OFFSET)
        .cast()
}

fn from_notification<T>(this: *mut T) -> *const CallbackObject {
    this.cast_const()
        .cast::<u8>()
        .wrapping_sub(NOTIFICATION_OFFSET)
        .cast()
}

/// Interface pointer handed out for `capability`.
fn view(object: *const CallbackObject, capability: Capability) -> *mut c_void {
    let base = object.cast_mut().cast::<u8>();
    match capability {
        Capability::Identity => base.cast(),
        Capability::DeviceNotification => base.wrapping_add(NOTIFICATION_OFFSET).cast(),
    }
}

/// Inverse of [`view`].
fn object_of(view: *mut c_void, capability: Capability) -> *const CallbackObject {
    match capability {
        Capability::Identity => from_input(view),
        Capability::DeviceNotification => from_notification(view),
    }
}

/// # Safety
///
/// `object` must point to a live callback object.
unsafe fn query_interface_thunk(
    object: *const CallbackObject,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    if ppv.is_null() {
        return ffi::E_POINTER;
    }
    match unsafe { (*object).query_interface(&iid) } {
        Some(capability) => {
            unsafe { *ppv = view(object, capability) };
            ffi::S_OK
        }
        None => {
            unsafe { *ppv = ptr::null_mut() };
            ffi::E_NOINTERFACE
        }
    }
}

unsafe extern "C" fn input_query_interface(
    this: *mut c_void,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    unsafe { query_interface_thunk(from_input(this), iid, ppv) }
}

unsafe extern "C" fn input_add_ref(this: *mut c_void) -> ffi::ULONG {
    unsafe { (*from_input(this)).add_ref() }
}

unsafe extern "C" fn input_release(this: *mut c_void) -> ffi::ULONG {
    unsafe { CallbackObject::release(from_input(this)) }
}

unsafe extern "C" fn preview_query_interface(
    this: *mut c_void,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    unsafe { query_interface_thunk(from_preview(this), iid, ppv) }
}

unsafe extern "C" fn preview_add_ref(this: *mut c_void) -> ffi::ULONG {
    unsafe { (*from_preview(this)).add_ref() }
}

unsafe extern "C" fn preview_release(this: *mut c_void) -> ffi::ULONG {
    unsafe { CallbackObject::release(from_preview(this)) }
}

unsafe extern "C" fn notification_query_interface(
    this: *mut c_void,
    iid: ffi::REFIID,
    ppv: *mut *mut c_void,
) -> ffi::HRESULT {
    unsafe { query_interface_thunk(from_notification(this), iid, ppv) }
}

unsafe extern "C" fn notification_add_ref(this: *mut c_void) -> ffi::ULONG {
    unsafe { (*from_notification(this)).add_ref() }
}

unsafe extern "C" fn notification_release(this: *mut c_void) -> ffi::ULONG {
    unsafe { CallbackObject::release(from_notification(this)) }
}

unsafe extern "C" fn device_arrived(
    this: *mut ffi::IDeckLinkDeviceNotificationCallback,
    device: *mut ffi::IDeckLink,
) -> ffi::HRESULT {
    let object = unsafe { &*from_notification(this) };
    object.device_notification(true, device).0
}

unsafe extern "C" fn device_removed(
    this: *mut ffi::IDeckLinkDeviceNotificationCallback,
    device: *mut ffi::IDeckLink,
) -> ffi::HRESULT {
    let object = unsafe { &*from_notification(this) };
    object.device_notification(false, device).0
}

unsafe extern "C" fn video_input_format_changed(
    this: *mut ffi::IDeckLinkInputCallback,
    events: ffi::BMDVideoInputFormatChangedEvents,
    new_mode: *mut ffi::IDeckLinkDisplayMode,
    flags: ffi::BMDDetectedVideoInputFormatFlags,
) -> ffi::HRESULT {
    let object = unsafe { &*from_input(this) };
    // The mode is borrowed for the duration of the call.
    let mode = unsafe { crate::sdk::display_mode_from_raw(new_mode) };
    object
        .format_changed(
            FormatChangeEvents(events),
            mode.as_ref(),
            DetectedSignalFlags(flags),
        )
        .0
}

unsafe extern "C" fn video_input_frame_arrived(
    this: *mut ffi::IDeckLinkInputCallback,
    video_frame: *mut ffi::IDeckLinkVideoInputFrame,
    audio_packet: *mut ffi::IDeckLinkAudioInputPacket,
) -> ffi::HRESULT {
    let object = unsafe { &*from_input(this) };
    object
        .frame_arrived(!video_frame.is_null(), !audio_packet.is_null())
        .0
}

unsafe extern "C" fn draw_frame(
    this: *mut ffi::IDeckLinkScreenPreviewCallback,
    _frame: *mut ffi::IDeckLinkVideoFrame,
) -> ffi::HRESULT {
    let object = unsafe { &*from_preview(this) };
    object.draw_frame().0
}

// Lifetime is owned by the reference count; the driver never deletes callbacks.
unsafe extern "C" fn input_destructor(_this: *mut ffi::IDeckLinkInputCallback) {}

unsafe extern "C" fn preview_destructor(_this: *mut ffi::IDeckLinkScreenPreviewCallback) {}

unsafe extern "C" fn notification_destructor(
    _this: *mut ffi::IDeckLinkDeviceNotificationCallback,
) {
}

static INPUT_VTBL: ffi::IDeckLinkInputCallbackVtbl = ffi::IDeckLinkInputCallbackVtbl {
    base: ffi::IUnknownVtbl {
        QueryInterface: input_query_interface,
        AddRef: input_add_ref,
        Release: input_release,
    },
    VideoInputFormatChanged: video_input_format_changed,
    VideoInputFrameArrived: video_input_frame_arrived,
    Destructor: input_destructor,
    DeletingDestructor: input_destructor,
};

static PREVIEW_VTBL: ffi::IDeckLinkScreenPreviewCallbackVtbl =
    ffi::IDeckLinkScreenPreviewCallbackVtbl {
        base: ffi::IUnknownVtbl {
            QueryInterface: preview_query_interface,
            AddRef: preview_add_ref,
            Release: preview_release,
        },
        DrawFrame: draw_frame,
        Destructor: preview_destructor,
        DeletingDestructor: preview_destructor,
    };

static NOTIFICATION_VTBL: ffi::IDeckLinkDeviceNotificationCallbackVtbl =
    ffi::IDeckLinkDeviceNotificationCallbackVtbl {
        base: ffi::IUnknownVtbl {
            QueryInterface: notification_query_interface,
            AddRef: notification_add_ref,
            Release: notification_release,
        },
        DeckLinkDeviceArrived: device_arrived,
        DeckLinkDeviceRemoved: device_removed,
        Destructor: notification_destructor,
        DeletingDestructor: notification_destructor,
    };

/// Counted reference to a callback object.
///
/// Clone and Drop go through the object's own AddRef and Release, so Rust
/// references and driver references share one count.
pub struct CallbackRef {
    ptr: ComPtr<ffi::IDeckLinkInputCallback>,
}

impl CallbackRef {
    /// Create a callback object with a count of one, owned by the returned reference.
    pub fn new(events: Arc<CallbackEvents>) -> Self {
        let object = Box::new(CallbackObject {
            input: ffi::IDeckLinkInputCallback {
                lpVtbl: &INPUT_VTBL,
            },
            preview: ffi::IDeckLinkScreenPreviewCallback {
                lpVtbl: &PREVIEW_VTBL,
            },
            notification: ffi::IDeckLinkDeviceNotificationCallback {
                lpVtbl: &NOTIFICATION_VTBL,
            },
            ref_count: AtomicU32::new(1),
            events,
        });
        let raw = NonNull::from(Box::leak(object)).cast::<ffi::IDeckLinkInputCallback>();
        // SAFETY: freshly allocated, the initial reference moves into the ComPtr.
        CallbackRef {
            ptr: unsafe { ComPtr::from_non_null(raw) },
        }
    }

    fn object(&self) -> &CallbackObject {
        // SAFETY: the held reference keeps the object alive.
        unsafe { &*from_input(self.ptr.as_ptr()) }
    }

    pub fn events(&self) -> &Arc<CallbackEvents> {
        &self.object().events
    }

    pub fn stats(&self) -> CallbackStats {
        self.object().events.stats()
    }

    /// Current reference count, including references held by the driver.
    pub fn ref_count(&self) -> u32 {
        self.object().ref_count.load(Ordering::Acquire)
    }

    /// Query by interface identifier. Success yields a new counted reference.
    pub fn query_interface(&self, iid: &Iid) -> Result<CallbackRef, Error> {
        let capability = Capability::from_iid(iid).ok_or(Error::NoInterface)?;
        // SAFETY: the held reference keeps the object alive.
        let view = unsafe { com::query_interface(self.as_unknown(), iid) }
            .map_err(|_| Error::NoInterface)?;
        let identity = object_of(view.as_ptr(), capability).cast_mut();
        // SAFETY: QueryInterface added one reference to this same object.
        let ptr = unsafe { ComPtr::from_raw(identity.cast()) }.ok_or(Error::NullPointer)?;
        Ok(CallbackRef { ptr })
    }

    /// Identity pointer, as returned by QueryInterface for IUnknown.
    pub fn as_unknown(&self) -> *mut c_void {
        self.ptr.as_unknown()
    }

    /// Pointer to register with `IDeckLinkInput::SetCallback`.
    pub fn input_callback_ptr(&self) -> *mut ffi::IDeckLinkInputCallback {
        self.ptr.as_ptr()
    }

    /// Pointer to register with `IDeckLinkInput::SetScreenPreviewCallback`.
    pub fn screen_preview_callback_ptr(&self) -> *mut ffi::IDeckLinkScreenPreviewCallback {
        let object = self.ptr.as_ptr().cast::<CallbackObject>();
        // SAFETY: in bounds of the live object.
        unsafe { ptr::addr_of_mut!((*object).preview) }
    }

    /// Pointer to register with `IDeckLinkDiscovery::InstallDeviceNotifications`.
    pub fn notification_callback_ptr(&self) -> *mut ffi::IDeckLinkDeviceNotificationCallback {
        let object = self.ptr.as_ptr().cast::<CallbackObject>();
        // SAFETY: in bounds of the live object.
        unsafe { ptr::addr_of_mut!((*object).notification) }
    }

    /// Hand the reference to foreign code without releasing it.
    pub fn into_raw(self) -> *mut c_void {
        self.ptr.into_raw().cast()
    }

    /// Take back a reference previously given out by [`CallbackRef::into_raw`]
    /// or [`CallbackRef::query_interface`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null or the identity pointer of a live callback object,
    /// and the caller must own the reference being transferred.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        unsafe { ComPtr::from_raw(ptr.cast()) }.map(|ptr| CallbackRef { ptr })
    }

    /// Input signal changed. Logged and counted; no format change is applied.
    pub fn video_input_format_changed(
        &self,
        events: FormatChangeEvents,
        mode: Option<&DisplayMode>,
        flags: DetectedSignalFlags,
    ) -> HResult {
        self.object().format_changed(events, mode, flags)
    }

    /// A frame arrived. Counted; frame payloads are not delivered.
    pub fn video_input_frame_arrived(&self, has_video: bool, has_audio: bool) -> HResult {
        self.object().frame_arrived(has_video, has_audio)
    }

    /// A preview frame is ready to draw. Counted only.
    pub fn draw_frame(&self) -> HResult {
        self.object().draw_frame()
    }
}

impl Clone for CallbackRef {
    fn clone(&self) -> Self {
        CallbackRef {
            ptr: self.ptr.clone(),
        }
    }
}

impl fmt::Debug for CallbackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRef")
            .field("ptr", &self.ptr)
            .field("label", &self.events().label())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
