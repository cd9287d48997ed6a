// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::driver::Device;

/// Derive the string used to identify a device in listings and match patterns.
///
/// The first non-empty value wins: the display name (which distinguishes
/// several cards of one model), then the model name, then `index` in decimal.
/// `index` is the device's position in driver order, counting devices that
/// were skipped for lacking an input, so it only stays stable while the
/// attached hardware does.
pub fn serial_for(device: &dyn Device, index: usize) -> String {
    if let Some(name) = device.display_name().filter(|name| !name.is_empty()) {
        return name;
    }
    if let Some(name) = device.model_name().filter(|name| !name.is_empty()) {
        return name;
    }
    index.to_string()
}
