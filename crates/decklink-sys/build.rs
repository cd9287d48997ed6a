// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// The DeckLink dispatch library is loaded at runtime via libloading.
// No rustc-link-lib directive needed - hosts without the Desktop Video
// driver can still build and run the non-hardware tests.

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-env-changed=DECKLINK_LIBRARY");
}
