// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

/// Pattern that selects any device.
pub const MATCH_ANY: &str = "*";

/// Whether `serial` is selected by `pattern`.
///
/// `"*"` matches everything. Any other pattern matches when it is a
/// case-insensitive substring of the serial, so the empty pattern matches
/// everything too.
pub fn matches(serial: &str, pattern: &str) -> bool {
    if pattern == MATCH_ANY {
        return true;
    }
    serial.to_lowercase().contains(&pattern.to_lowercase())
}
