// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Media extraction over a capture session.
//!
//! A [`CaptureExtractor`] opens a session on the device selected by its
//! filename, which is treated as a match pattern. Frames are not delivered
//! yet: the extractor reports no streams and no packets, but its metadata
//! describes the live session.

use std::time::Duration;

use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    discovery::{context, DeviceContext},
    driver::PixelFormat,
    session::{CaptureConfig, CaptureSession},
    Error,
};

/// Parameters for opening an extractor.
#[derive(Debug, Clone, Default)]
pub struct ExtractorParams {
    /// Device match pattern.
    pub filename: String,
    pub config: CaptureConfig,
}

impl ExtractorParams {
    pub fn new(filename: impl Into<String>) -> Self {
        ExtractorParams {
            filename: filename.into(),
            config: CaptureConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }
}

/// Description of one elementary stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMeta {
    pub stream_index: usize,
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// One unit of media read from a stream.
#[derive(Debug, Clone)]
pub struct MediaPacket {
    pub stream_index: usize,
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

/// Source of media packets.
pub trait MediaExtractor {
    fn streams(&self) -> Vec<StreamMeta>;

    fn stream_format(&self, stream_index: usize) -> Option<StreamMeta>;

    /// Next packet, or `None` when nothing is available.
    fn read_next_packet(&mut self) -> Option<MediaPacket>;

    fn meta(&self) -> Value;
}

/// Extractor over a DeckLink capture session.
#[derive(Debug)]
pub struct CaptureExtractor {
    params: ExtractorParams,
    session: CaptureSession,
}

impl CaptureExtractor {
    /// Resolve `params.filename` through `ctx` and open a session on it.
    pub fn new(ctx: &DeviceContext, params: ExtractorParams) -> Result<Self, Error> {
        let session = ctx.open_session(&params.filename, &params.config)?;
        Ok(CaptureExtractor { params, session })
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }
}

impl MediaExtractor for CaptureExtractor {
    fn streams(&self) -> Vec<StreamMeta> {
        Vec::new()
    }

    fn stream_format(&self, _stream_index: usize) -> Option<StreamMeta> {
        None
    }

    fn read_next_packet(&mut self) -> Option<MediaPacket> {
        None
    }

    fn meta(&self) -> Value {
        json!({
            "filename": self.params.filename,
            "serial": self.session.serial(),
            "state": self.session.state(),
            "display_mode": self.session.display_mode(),
            "pixel_format": self.session.pixel_format(),
            "callbacks": self.session.stats(),
        })
    }
}

/// Open an extractor on the installed driver, or `None` if `params` does not
/// name a usable capture device.
pub fn alloc_extractor(params: &ExtractorParams) -> Option<CaptureExtractor> {
    alloc_extractor_with(context(), params)
}

/// Like [`alloc_extractor`] over a specific context.
pub fn alloc_extractor_with(
    ctx: &DeviceContext,
    params: &ExtractorParams,
) -> Option<CaptureExtractor> {
    match CaptureExtractor::new(ctx, params.clone()) {
        Ok(extractor) => Some(extractor),
        Err(err) => {
            debug!("{} is not a DeckLink capture source: {}", params.filename, err);
            None
        }
    }
}
