// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// DeckLink enum values are multi-character literals ('BGRA') with the first
// character in the most significant byte.
#![forbid(unsafe_code)]

use core::{fmt, result::Result};

use serde::{Serialize, Serializer};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, packed)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub const fn from_u32(val: u32) -> FourCC {
        FourCC(val.to_be_bytes())
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(buf: &[u8; 4]) -> FourCC {
        FourCC(*buf)
    }
}

impl From<u32> for FourCC {
    fn from(val: u32) -> FourCC {
        FourCC::from_u32(val)
    }
}

impl From<FourCC> for u32 {
    fn from(val: FourCC) -> Self {
        val.to_u32()
    }
}

impl FourCC {
    /// True when every byte is a printable ASCII character.
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|c| c.is_ascii_graphic() || *c == b' ')
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match core::str::from_utf8(&self.0) {
            Ok(s) if self.is_printable() => f.write_str(s),
            // Some SDK values are plain integers (bmdFormat8BitARGB = 32)
            _ => write!(f, "{:#010x}", self.to_u32()),
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "FourCC({})", self)
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decklink_sys as ffi;

    #[test]
    fn test_matches_sdk_constants() {
        assert_eq!(FourCC(*b"BGRA").to_u32(), ffi::bmdFormat8BitBGRA);
        assert_eq!(FourCC(*b"2vuy").to_u32(), ffi::bmdFormat8BitYUV);
        assert_eq!(FourCC::from(ffi::bmdModeHD1080i50), FourCC(*b"Hi50"));
    }

    #[test]
    fn test_display() {
        assert_eq!(FourCC(*b"Hp30").to_string(), "Hp30");
        assert_eq!(FourCC(*b"pal ").to_string(), "pal ");
        // bmdFormat8BitARGB is the plain integer 32
        assert_eq!(FourCC::from(32u32).to_string(), "0x00000020");
        assert_eq!(format!("{:?}", FourCC(*b"v210")), "FourCC(v210)");
        assert!(!FourCC::from(32u32).is_printable());
    }
}
