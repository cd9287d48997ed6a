// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use log::{debug, warn};

use super::serial::serial_for;
use crate::{
    driver::{DeviceHandle, Driver},
    Error,
};

/// Stop enumerating after this many devices.
pub const DEFAULT_MAX_DEVICES: usize = 64;

/// Walks the driver's devices and visits the capture-capable ones.
///
/// # Example
///
/// ```no_run
/// use decklink::{discovery::DeviceEnumerator, sdk::SdkDriver};
///
/// let driver = SdkDriver;
/// let count = DeviceEnumerator::new(&driver).enumerate(|_device, serial| {
///     println!("{}", serial);
/// })?;
/// println!("{} capture devices", count);
/// # Ok::<(), decklink::Error>(())
/// ```
pub struct DeviceEnumerator<'a> {
    driver: &'a dyn Driver,
    max_devices: usize,
}

impl<'a> DeviceEnumerator<'a> {
    pub fn new(driver: &'a dyn Driver) -> Self {
        DeviceEnumerator {
            driver,
            max_devices: DEFAULT_MAX_DEVICES,
        }
    }

    /// Cap the number of driver devices examined, skipped ones included.
    pub fn with_max_devices(mut self, max_devices: usize) -> Self {
        self.max_devices = max_devices;
        self
    }

    /// Visit every device that has a capture input, in driver order.
    ///
    /// Devices without an input are skipped but still advance the index used
    /// for serial fallback. An error from the driver part way through ends
    /// enumeration early; devices already visited stay visited and the count
    /// is returned. Failure to start enumeration at all is an error.
    ///
    /// Returns the number of devices visited.
    pub fn enumerate<F>(&self, mut visit: F) -> Result<usize, Error>
    where
        F: FnMut(&DeviceHandle, &str),
    {
        let mut iterator = self.driver.create_iterator()?;
        let mut visited = 0;
        let mut index = 0;

        loop {
            if index >= self.max_devices {
                warn!("Stopped enumerating after {} devices", self.max_devices);
                break;
            }

            let device = match iterator.next_device() {
                Ok(Some(device)) => device,
                Ok(None) => break,
                Err(err) => {
                    warn!("Enumeration aborted: {}", err);
                    break;
                }
            };

            // The input is only queried here; it is released straight away.
            if device.input().is_none() {
                debug!("Skipping device #{}: no capture input", index);
                index += 1;
                continue;
            }

            let serial = serial_for(device.as_ref(), index);
            debug!("Found capture device #{}: {}", index, serial);
            visit(&device, &serial);
            visited += 1;
            index += 1;
        }

        Ok(visited)
    }
}
