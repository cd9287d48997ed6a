// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Reference-counted interface pointers.
//!
//! Every DeckLink object starts with a vtable pointer whose first three slots
//! are QueryInterface, AddRef and Release. [`ComPtr`] owns exactly one of
//! those references: cloning calls AddRef, dropping calls Release. The raw
//! helpers dispatch the same slots on untyped pointers.

use std::{ffi::c_void, fmt, mem, ptr, ptr::NonNull};

use decklink_sys as ffi;

use crate::HResult;

/// Owning pointer to a COM-style interface.
pub struct ComPtr<T> {
    ptr: NonNull<T>,
}

// DeckLink objects are free-threaded and their reference counts are atomic.
unsafe impl<T> Send for ComPtr<T> {}
unsafe impl<T> Sync for ComPtr<T> {}

impl<T> ComPtr<T> {
    /// Wrap a pointer returned by the driver, taking over its reference.
    ///
    /// Returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live object whose first field is a
    /// pointer to a vtable starting with the IUnknown slots. The caller
    /// transfers one reference to the returned value.
    pub unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| ComPtr { ptr })
    }

    /// # Safety
    ///
    /// Same contract as [`ComPtr::from_raw`].
    pub unsafe fn from_non_null(ptr: NonNull<T>) -> Self {
        ComPtr { ptr }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The pointer viewed as IUnknown.
    pub fn as_unknown(&self) -> *mut c_void {
        self.ptr.as_ptr().cast()
    }

    /// Give up ownership of the reference without releasing it.
    pub fn into_raw(self) -> *mut T {
        let ptr = self.ptr.as_ptr();
        mem::forget(self);
        ptr
    }

    /// Ask the object for another interface. The result holds its own reference.
    pub fn query_interface<U>(&self, iid: &ffi::REFIID) -> Result<ComPtr<U>, HResult> {
        // SAFETY: self holds a reference, so the object is alive.
        let raw = unsafe { query_interface(self.as_unknown(), iid)? };
        // SAFETY: a successful QueryInterface hands out one reference.
        Ok(unsafe { ComPtr::from_non_null(raw.cast()) })
    }
}

impl<T> Clone for ComPtr<T> {
    fn clone(&self) -> Self {
        // SAFETY: self holds a reference, so the object is alive.
        unsafe { add_ref(self.as_unknown()) };
        ComPtr { ptr: self.ptr }
    }
}

impl<T> Drop for ComPtr<T> {
    fn drop(&mut self) {
        // SAFETY: releases the reference this value owns.
        unsafe { release(self.as_unknown()) };
    }
}

impl<T> fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComPtr({:p})", self.ptr)
    }
}

/// Increment the reference count. Returns the new count.
///
/// # Safety
///
/// `this` must point to a live COM-style object.
pub unsafe fn add_ref(this: *mut c_void) -> u32 {
    let unknown = this.cast::<ffi::IUnknown>();
    unsafe { ((*(*unknown).lpVtbl).AddRef)(this) }
}

/// Decrement the reference count. Returns the remaining count; the object may
/// be gone once this returns.
///
/// # Safety
///
/// `this` must point to a live COM-style object and the caller must own the
/// reference being released.
pub unsafe fn release(this: *mut c_void) -> u32 {
    let unknown = this.cast::<ffi::IUnknown>();
    unsafe { ((*(*unknown).lpVtbl).Release)(this) }
}

/// Query for an interface. On success the caller owns one new reference.
///
/// # Safety
///
/// `this` must point to a live COM-style object.
pub unsafe fn query_interface(
    this: *mut c_void,
    iid: &ffi::REFIID,
) -> Result<NonNull<c_void>, HResult> {
    let unknown = this.cast::<ffi::IUnknown>();
    let mut out = ptr::null_mut();
    let result = HResult(unsafe { ((*(*unknown).lpVtbl).QueryInterface)(this, *iid, &mut out) });
    if !result.is_ok() {
        return Err(result);
    }
    NonNull::new(out).ok_or(HResult::POINTER)
}
