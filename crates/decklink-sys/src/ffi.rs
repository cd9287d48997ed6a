// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// COM-style ABI of the DeckLink API (Desktop Video SDK 10.x, Linux).
//
// Every interface is a C++ abstract class deriving from IUnknown; objects are
// laid out as a pointer to a vtable whose first three slots are the IUnknown
// methods, followed by the interface methods in declaration order. The SDK
// declares a protected virtual destructor last in each interface, which adds
// two trailing slots (complete and deleting destructor) under the Itanium ABI.
// Only vtables implemented on the Rust side spell those slots out.

use std::ffi::{c_char, c_long, c_void};

pub type HRESULT = i32;
pub type ULONG = u32;
pub type BMDDisplayMode = u32;
pub type BMDPixelFormat = u32;
pub type BMDVideoInputFlags = u32;
pub type BMDDisplayModeSupport = u32;
pub type BMDFieldDominance = u32;
pub type BMDDisplayModeFlags = u32;
pub type BMDTimeValue = i64;
pub type BMDTimeScale = i64;
pub type BMDVideoInputFormatChangedEvents = u32;
pub type BMDDetectedVideoInputFormatFlags = u32;
pub type BMDAudioSampleRate = u32;
pub type BMDAudioSampleType = u32;
pub type BMDDeckLinkAPIInformationID = u32;

/// Interface identifier, passed by value (`CFUUIDBytes` on Linux).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct REFIID {
    pub bytes: [u8; 16],
}

impl REFIID {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        REFIID { bytes }
    }
}

/// Pack four ASCII characters the way the SDK spells its enum constants
/// (`'BGRA'` is `0x42475241`).
pub const fn bmd_fourcc(code: &[u8; 4]) -> u32 {
    ((code[0] as u32) << 24) | ((code[1] as u32) << 16) | ((code[2] as u32) << 8) | (code[3] as u32)
}

// LinuxCOM.h result codes
pub const S_OK: HRESULT = 0;
pub const S_FALSE: HRESULT = 1;
pub const E_UNEXPECTED: HRESULT = 0x8000_FFFF_u32 as HRESULT;
pub const E_NOTIMPL: HRESULT = 0x8000_0001_u32 as HRESULT;
pub const E_OUTOFMEMORY: HRESULT = 0x8000_0002_u32 as HRESULT;
pub const E_INVALIDARG: HRESULT = 0x8000_0003_u32 as HRESULT;
pub const E_NOINTERFACE: HRESULT = 0x8000_0004_u32 as HRESULT;
pub const E_POINTER: HRESULT = 0x8000_0005_u32 as HRESULT;
pub const E_HANDLE: HRESULT = 0x8000_0006_u32 as HRESULT;
pub const E_ABORT: HRESULT = 0x8000_0007_u32 as HRESULT;
pub const E_FAIL: HRESULT = 0x8000_0008_u32 as HRESULT;
pub const E_ACCESSDENIED: HRESULT = 0x8000_0009_u32 as HRESULT;

/* 00000000-0000-0000-C000-000000000046 */
pub const IID_IUnknown: REFIID = REFIID::from_bytes([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
]);
/* C418FBDD-0587-48ED-8FE5-640F0A14AF91 */
pub const IID_IDeckLink: REFIID = REFIID::from_bytes([
    0xC4, 0x18, 0xFB, 0xDD, 0x05, 0x87, 0x48, 0xED, 0x8F, 0xE5, 0x64, 0x0F, 0x0A, 0x14, 0xAF, 0x91,
]);
/* 50FB36CD-3063-4B73-BDBB-958087F2D8BA */
pub const IID_IDeckLinkIterator: REFIID = REFIID::from_bytes([
    0x50, 0xFB, 0x36, 0xCD, 0x30, 0x63, 0x4B, 0x73, 0xBD, 0xBB, 0x95, 0x80, 0x87, 0xF2, 0xD8, 0xBA,
]);
/* AF22762B-DFAC-4846-AA79-FA8883560995 */
pub const IID_IDeckLinkInput: REFIID = REFIID::from_bytes([
    0xAF, 0x22, 0x76, 0x2B, 0xDF, 0xAC, 0x48, 0x46, 0xAA, 0x79, 0xFA, 0x88, 0x83, 0x56, 0x09, 0x95,
]);
/* DD04E5EC-7415-42AB-AE4A-E80C4DFC044A */
pub const IID_IDeckLinkInputCallback: REFIID = REFIID::from_bytes([
    0xDD, 0x04, 0xE5, 0xEC, 0x74, 0x15, 0x42, 0xAB, 0xAE, 0x4A, 0xE8, 0x0C, 0x4D, 0xFC, 0x04, 0x4A,
]);
/* B1D3F49A-85FE-4C5D-95C8-0B5D5DCCD438 */
pub const IID_IDeckLinkScreenPreviewCallback: REFIID = REFIID::from_bytes([
    0xB1, 0xD3, 0xF4, 0x9A, 0x85, 0xFE, 0x4C, 0x5D, 0x95, 0xC8, 0x0B, 0x5D, 0x5D, 0xCC, 0xD4, 0x38,
]);
/* 4997053B-0ADF-4CC8-AC70-7A50C4BE728F */
pub const IID_IDeckLinkDeviceNotificationCallback: REFIID = REFIID::from_bytes([
    0x49, 0x97, 0x05, 0x3B, 0x0A, 0xDF, 0x4C, 0xC8, 0xAC, 0x70, 0x7A, 0x50, 0xC4, 0xBE, 0x72, 0x8F,
]);
/* 9C88499F-F601-4021-B80B-032E4EB41C35 */
pub const IID_IDeckLinkDisplayModeIterator: REFIID = REFIID::from_bytes([
    0x9C, 0x88, 0x49, 0x9F, 0xF6, 0x01, 0x40, 0x21, 0xB8, 0x0B, 0x03, 0x2E, 0x4E, 0xB4, 0x1C, 0x35,
]);
/* 3EB2C1AB-0A3D-4523-A3AD-F40D7FB14E78 */
pub const IID_IDeckLinkDisplayMode: REFIID = REFIID::from_bytes([
    0x3E, 0xB2, 0xC1, 0xAB, 0x0A, 0x3D, 0x45, 0x23, 0xA3, 0xAD, 0xF4, 0x0D, 0x7F, 0xB1, 0x4E, 0x78,
]);

// BMDPixelFormat
pub const bmdFormat8BitYUV: BMDPixelFormat = bmd_fourcc(b"2vuy");
pub const bmdFormat10BitYUV: BMDPixelFormat = bmd_fourcc(b"v210");
pub const bmdFormat8BitARGB: BMDPixelFormat = 32;
pub const bmdFormat8BitBGRA: BMDPixelFormat = bmd_fourcc(b"BGRA");
pub const bmdFormat10BitRGB: BMDPixelFormat = bmd_fourcc(b"r210");

// BMDDisplayMode (subset)
pub const bmdModeNTSC: BMDDisplayMode = bmd_fourcc(b"ntsc");
pub const bmdModePAL: BMDDisplayMode = bmd_fourcc(b"pal ");
pub const bmdModeHD720p50: BMDDisplayMode = bmd_fourcc(b"hp50");
pub const bmdModeHD720p5994: BMDDisplayMode = bmd_fourcc(b"hp59");
pub const bmdModeHD720p60: BMDDisplayMode = bmd_fourcc(b"hp60");
pub const bmdModeHD1080i50: BMDDisplayMode = bmd_fourcc(b"Hi50");
pub const bmdModeHD1080i5994: BMDDisplayMode = bmd_fourcc(b"Hi59");
pub const bmdModeHD1080p25: BMDDisplayMode = bmd_fourcc(b"Hp25");
pub const bmdModeHD1080p2997: BMDDisplayMode = bmd_fourcc(b"Hp29");
pub const bmdModeHD1080p30: BMDDisplayMode = bmd_fourcc(b"Hp30");
pub const bmdModeHD1080p50: BMDDisplayMode = bmd_fourcc(b"Hp50");
pub const bmdModeHD1080p60: BMDDisplayMode = bmd_fourcc(b"Hp60");
pub const bmdMode4K2160p30: BMDDisplayMode = bmd_fourcc(b"4k30");
pub const bmdModeUnknown: BMDDisplayMode = bmd_fourcc(b"iunk");

// BMDVideoInputFlags
pub const bmdVideoInputFlagDefault: BMDVideoInputFlags = 0;
pub const bmdVideoInputEnableFormatDetection: BMDVideoInputFlags = 1 << 0;
pub const bmdVideoInputDualStream3D: BMDVideoInputFlags = 1 << 1;

// BMDVideoInputFormatChangedEvents
pub const bmdVideoInputDisplayModeChanged: BMDVideoInputFormatChangedEvents = 1 << 0;
pub const bmdVideoInputFieldDominanceChanged: BMDVideoInputFormatChangedEvents = 1 << 1;
pub const bmdVideoInputColorspaceChanged: BMDVideoInputFormatChangedEvents = 1 << 2;

// BMDDetectedVideoInputFormatFlags
pub const bmdDetectedVideoInputYCbCr422: BMDDetectedVideoInputFormatFlags = 1 << 0;
pub const bmdDetectedVideoInputRGB444: BMDDetectedVideoInputFormatFlags = 1 << 1;
pub const bmdDetectedVideoInputDualStream3D: BMDDetectedVideoInputFormatFlags = 1 << 2;

// BMDDeckLinkAPIInformationID
pub const BMDDeckLinkAPIVersion: BMDDeckLinkAPIInformationID = bmd_fourcc(b"vers");

#[repr(C)]
pub struct IUnknownVtbl {
    pub QueryInterface:
        unsafe extern "C" fn(this: *mut c_void, iid: REFIID, ppv: *mut *mut c_void) -> HRESULT,
    pub AddRef: unsafe extern "C" fn(this: *mut c_void) -> ULONG,
    pub Release: unsafe extern "C" fn(this: *mut c_void) -> ULONG,
}

#[repr(C)]
pub struct IUnknown {
    pub lpVtbl: *const IUnknownVtbl,
}

#[repr(C)]
pub struct IDeckLinkIteratorVtbl {
    pub base: IUnknownVtbl,
    pub Next: unsafe extern "C" fn(
        this: *mut IDeckLinkIterator,
        deckLinkInstance: *mut *mut IDeckLink,
    ) -> HRESULT,
}

#[repr(C)]
pub struct IDeckLinkIterator {
    pub lpVtbl: *const IDeckLinkIteratorVtbl,
}

#[repr(C)]
pub struct IDeckLinkVtbl {
    pub base: IUnknownVtbl,
    pub GetModelName:
        unsafe extern "C" fn(this: *mut IDeckLink, modelName: *mut *const c_char) -> HRESULT,
    pub GetDisplayName:
        unsafe extern "C" fn(this: *mut IDeckLink, displayName: *mut *const c_char) -> HRESULT,
}

#[repr(C)]
pub struct IDeckLink {
    pub lpVtbl: *const IDeckLinkVtbl,
}

#[repr(C)]
pub struct IDeckLinkDisplayModeVtbl {
    pub base: IUnknownVtbl,
    pub GetName:
        unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode, name: *mut *const c_char) -> HRESULT,
    pub GetDisplayMode: unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode) -> BMDDisplayMode,
    pub GetWidth: unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode) -> c_long,
    pub GetHeight: unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode) -> c_long,
    pub GetFrameRate: unsafe extern "C" fn(
        this: *mut IDeckLinkDisplayMode,
        frameDuration: *mut BMDTimeValue,
        timeScale: *mut BMDTimeScale,
    ) -> HRESULT,
    pub GetFieldDominance:
        unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode) -> BMDFieldDominance,
    pub GetFlags: unsafe extern "C" fn(this: *mut IDeckLinkDisplayMode) -> BMDDisplayModeFlags,
}

#[repr(C)]
pub struct IDeckLinkDisplayMode {
    pub lpVtbl: *const IDeckLinkDisplayModeVtbl,
}

#[repr(C)]
pub struct IDeckLinkDisplayModeIteratorVtbl {
    pub base: IUnknownVtbl,
    pub Next: unsafe extern "C" fn(
        this: *mut IDeckLinkDisplayModeIterator,
        deckLinkDisplayMode: *mut *mut IDeckLinkDisplayMode,
    ) -> HRESULT,
}

#[repr(C)]
pub struct IDeckLinkDisplayModeIterator {
    pub lpVtbl: *const IDeckLinkDisplayModeIteratorVtbl,
}

#[repr(C)]
pub struct IDeckLinkInputVtbl {
    pub base: IUnknownVtbl,
    pub DoesSupportVideoMode: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        displayMode: BMDDisplayMode,
        pixelFormat: BMDPixelFormat,
        flags: BMDVideoInputFlags,
        result: *mut BMDDisplayModeSupport,
        resultDisplayMode: *mut *mut IDeckLinkDisplayMode,
    ) -> HRESULT,
    pub GetDisplayModeIterator: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        iterator: *mut *mut IDeckLinkDisplayModeIterator,
    ) -> HRESULT,
    pub SetScreenPreviewCallback: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        previewCallback: *mut IDeckLinkScreenPreviewCallback,
    ) -> HRESULT,
    pub EnableVideoInput: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        displayMode: BMDDisplayMode,
        pixelFormat: BMDPixelFormat,
        flags: BMDVideoInputFlags,
    ) -> HRESULT,
    pub DisableVideoInput: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub GetAvailableVideoFrameCount:
        unsafe extern "C" fn(this: *mut IDeckLinkInput, availableFrameCount: *mut u32) -> HRESULT,
    pub SetVideoInputFrameMemoryAllocator:
        unsafe extern "C" fn(this: *mut IDeckLinkInput, theAllocator: *mut c_void) -> HRESULT,
    pub EnableAudioInput: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        sampleRate: BMDAudioSampleRate,
        sampleType: BMDAudioSampleType,
        channelCount: u32,
    ) -> HRESULT,
    pub DisableAudioInput: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub GetAvailableAudioSampleFrameCount: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        availableSampleFrameCount: *mut u32,
    ) -> HRESULT,
    pub StartStreams: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub StopStreams: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub PauseStreams: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub FlushStreams: unsafe extern "C" fn(this: *mut IDeckLinkInput) -> HRESULT,
    pub SetCallback: unsafe extern "C" fn(
        this: *mut IDeckLinkInput,
        theCallback: *mut IDeckLinkInputCallback,
    ) -> HRESULT,
}

#[repr(C)]
pub struct IDeckLinkInput {
    pub lpVtbl: *const IDeckLinkInputVtbl,
}

/// Frames handed to the callbacks. Payload access is not bound.
#[repr(C)]
pub struct IDeckLinkVideoFrame {
    _private: [u8; 0],
}

#[repr(C)]
pub struct IDeckLinkVideoInputFrame {
    _private: [u8; 0],
}

#[repr(C)]
pub struct IDeckLinkAudioInputPacket {
    _private: [u8; 0],
}

#[repr(C)]
pub struct IDeckLinkInputCallbackVtbl {
    pub base: IUnknownVtbl,
    pub VideoInputFormatChanged: unsafe extern "C" fn(
        this: *mut IDeckLinkInputCallback,
        notificationEvents: BMDVideoInputFormatChangedEvents,
        newDisplayMode: *mut IDeckLinkDisplayMode,
        detectedSignalFlags: BMDDetectedVideoInputFormatFlags,
    ) -> HRESULT,
    pub VideoInputFrameArrived: unsafe extern "C" fn(
        this: *mut IDeckLinkInputCallback,
        videoFrame: *mut IDeckLinkVideoInputFrame,
        audioPacket: *mut IDeckLinkAudioInputPacket,
    ) -> HRESULT,
    pub Destructor: unsafe extern "C" fn(this: *mut IDeckLinkInputCallback),
    pub DeletingDestructor: unsafe extern "C" fn(this: *mut IDeckLinkInputCallback),
}

#[repr(C)]
pub struct IDeckLinkInputCallback {
    pub lpVtbl: *const IDeckLinkInputCallbackVtbl,
}

#[repr(C)]
pub struct IDeckLinkScreenPreviewCallbackVtbl {
    pub base: IUnknownVtbl,
    pub DrawFrame: unsafe extern "C" fn(
        this: *mut IDeckLinkScreenPreviewCallback,
        theFrame: *mut IDeckLinkVideoFrame,
    ) -> HRESULT,
    pub Destructor: unsafe extern "C" fn(this: *mut IDeckLinkScreenPreviewCallback),
    pub DeletingDestructor: unsafe extern "C" fn(this: *mut IDeckLinkScreenPreviewCallback),
}

#[repr(C)]
pub struct IDeckLinkScreenPreviewCallback {
    pub lpVtbl: *const IDeckLinkScreenPreviewCallbackVtbl,
}

#[repr(C)]
pub struct IDeckLinkDeviceNotificationCallbackVtbl {
    pub base: IUnknownVtbl,
    pub DeckLinkDeviceArrived: unsafe extern "C" fn(
        this: *mut IDeckLinkDeviceNotificationCallback,
        deckLinkDevice: *mut IDeckLink,
    ) -> HRESULT,
    pub DeckLinkDeviceRemoved: unsafe extern "C" fn(
        this: *mut IDeckLinkDeviceNotificationCallback,
        deckLinkDevice: *mut IDeckLink,
    ) -> HRESULT,
    pub Destructor: unsafe extern "C" fn(this: *mut IDeckLinkDeviceNotificationCallback),
    pub DeletingDestructor: unsafe extern "C" fn(this: *mut IDeckLinkDeviceNotificationCallback),
}

#[repr(C)]
pub struct IDeckLinkDeviceNotificationCallback {
    pub lpVtbl: *const IDeckLinkDeviceNotificationCallbackVtbl,
}

#[repr(C)]
pub struct IDeckLinkAPIInformationVtbl {
    pub base: IUnknownVtbl,
    pub GetFlag: unsafe extern "C" fn(
        this: *mut IDeckLinkAPIInformation,
        cfgID: BMDDeckLinkAPIInformationID,
        value: *mut bool,
    ) -> HRESULT,
    pub GetInt: unsafe extern "C" fn(
        this: *mut IDeckLinkAPIInformation,
        cfgID: BMDDeckLinkAPIInformationID,
        value: *mut i64,
    ) -> HRESULT,
    pub GetFloat: unsafe extern "C" fn(
        this: *mut IDeckLinkAPIInformation,
        cfgID: BMDDeckLinkAPIInformationID,
        value: *mut f64,
    ) -> HRESULT,
    pub GetString: unsafe extern "C" fn(
        this: *mut IDeckLinkAPIInformation,
        cfgID: BMDDeckLinkAPIInformationID,
        value: *mut *const c_char,
    ) -> HRESULT,
}

#[repr(C)]
pub struct IDeckLinkAPIInformation {
    pub lpVtbl: *const IDeckLinkAPIInformationVtbl,
}

/// Entry points exported by the dispatch library.
pub struct DeckLinkLibrary {
    __library: ::libloading::Library,
    pub CreateDeckLinkIteratorInstance:
        Result<unsafe extern "C" fn() -> *mut IDeckLinkIterator, ::libloading::Error>,
    pub CreateDeckLinkAPIInformationInstance:
        Result<unsafe extern "C" fn() -> *mut IDeckLinkAPIInformation, ::libloading::Error>,
}

impl DeckLinkLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = unsafe { ::libloading::Library::new(path.as_ref())? };
        unsafe { Self::from_library(library) }
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let CreateDeckLinkIteratorInstance = unsafe {
            __library
                .get(b"CreateDeckLinkIteratorInstance_0002\0".as_slice())
                .map(|sym| *sym)
        };
        let CreateDeckLinkAPIInformationInstance = unsafe {
            __library
                .get(b"CreateDeckLinkAPIInformationInstance_0001\0".as_slice())
                .map(|sym| *sym)
        };
        Ok(DeckLinkLibrary {
            __library,
            CreateDeckLinkIteratorInstance,
            CreateDeckLinkAPIInformationInstance,
        })
    }
}
