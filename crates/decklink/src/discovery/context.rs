// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::{fmt, sync::Arc};

use log::debug;

use super::{
    enumerator::{DeviceEnumerator, DEFAULT_MAX_DEVICES},
    matcher::matches,
};
use crate::{
    driver::{DeviceHandle, Driver},
    session::{CaptureConfig, CaptureSession},
    Error,
};

/// Discovery over one driver.
///
/// Holds no device state between calls: every operation enumerates afresh,
/// so devices attached or removed since the last call are picked up.
#[derive(Clone)]
pub struct DeviceContext {
    driver: Arc<dyn Driver>,
    max_devices: usize,
}

impl DeviceContext {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        DeviceContext {
            driver,
            max_devices: DEFAULT_MAX_DEVICES,
        }
    }

    pub fn with_max_devices(mut self, max_devices: usize) -> Self {
        self.max_devices = max_devices;
        self
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Visit each capture-capable device with its serial, in driver order.
    pub fn enumerate<F>(&self, visit: F) -> Result<usize, Error>
    where
        F: FnMut(&DeviceHandle, &str),
    {
        DeviceEnumerator::new(self.driver.as_ref())
            .with_max_devices(self.max_devices)
            .enumerate(visit)
    }

    /// Visit the serial of each capture-capable device.
    pub fn enumerate_names<F>(&self, mut visit: F) -> Result<usize, Error>
    where
        F: FnMut(&str),
    {
        self.enumerate(|_, serial| visit(serial))
    }

    /// Serials of all capture-capable devices.
    pub fn device_names(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        self.enumerate_names(|serial| names.push(serial.to_string()))?;
        Ok(names)
    }

    /// First device whose serial matches `pattern`.
    pub fn resolve(&self, pattern: &str) -> Result<DeviceHandle, Error> {
        self.resolve_with_serial(pattern).map(|(device, _)| device)
    }

    /// First device whose serial matches `pattern`, with that serial.
    ///
    /// Enumeration still runs to the end so every device is examined, but
    /// later matches never replace the first.
    pub fn resolve_with_serial(&self, pattern: &str) -> Result<(DeviceHandle, String), Error> {
        let mut found: Option<(DeviceHandle, String)> = None;
        let mut match_count = 0;
        self.enumerate(|device, serial| {
            if !matches(serial, pattern) {
                return;
            }
            match_count += 1;
            if found.is_none() {
                found = Some((device.clone(), serial.to_string()));
            }
        })?;

        let (device, serial) = found.ok_or_else(|| Error::DeviceNotFound(pattern.to_string()))?;
        if match_count > 1 {
            debug!(
                "{} devices match {}, using the first: {}",
                match_count, pattern, serial
            );
        }
        Ok((device, serial))
    }

    /// Resolve `pattern` and start capturing from the device.
    pub fn open_session(
        &self,
        pattern: &str,
        config: &CaptureConfig,
    ) -> Result<CaptureSession, Error> {
        let (device, serial) = self.resolve_with_serial(pattern)?;
        CaptureSession::open(device, &serial, config)
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("max_devices", &self.max_devices)
            .finish_non_exhaustive()
    }
}
