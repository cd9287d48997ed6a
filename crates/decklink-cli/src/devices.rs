// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Capture device listing.

use crate::error::CliError;
use clap::Args as ClapArgs;
use decklink::DeviceContext;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Only list devices whose serial matches this pattern ("*" for all)
    #[arg(default_value = decklink::discovery::MATCH_ANY)]
    pattern: String,

    /// Show model name and mode count for each device
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    devices: Vec<DeviceInfo>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    /// Position in the matching list, not the enumeration index.
    position: usize,
    serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_modes: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_devices: usize,
    matching: usize,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let output = collect(decklink::context(), &args)?;

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print!("{}", format_text(&output));
    }

    Ok(())
}

fn collect(ctx: &DeviceContext, args: &Args) -> Result<DevicesOutput, decklink::Error> {
    let mut devices = Vec::new();
    let total = ctx.enumerate(|device, serial| {
        if !decklink::discovery::matches(serial, &args.pattern) {
            return;
        }
        let (model, display_modes) = if args.verbose {
            let modes = device
                .input()
                .and_then(|input| input.display_modes().ok())
                .map(|modes| modes.len());
            (device.model_name(), modes)
        } else {
            (None, None)
        };
        devices.push(DeviceInfo {
            position: devices.len(),
            serial: serial.to_string(),
            model,
            display_modes,
        });
    })?;

    Ok(DevicesOutput {
        summary: Summary {
            total_devices: total,
            matching: devices.len(),
        },
        devices,
    })
}

// Serials are listed alone: an unnamed device's serial is already its
// enumeration index, and a second number next to it would not match.
fn format_text(output: &DevicesOutput) -> String {
    let mut text = format!(
        "DeckLink Capture Devices ({} found, {} matching)\n\n",
        output.summary.total_devices, output.summary.matching
    );

    for device in &output.devices {
        text.push_str(&format!("  {}\n", device.serial));
        if let Some(model) = &device.model {
            text.push_str(&format!("      Model: {}\n", model));
        }
        if let Some(count) = device.display_modes {
            text.push_str(&format!("      Display modes: {}\n", count));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use decklink::{
        driver::DeviceIterator, Device, DeviceHandle, DisplayMode, Driver, HResult, Input,
        PixelFormat, VideoInputFlags,
    };
    use std::sync::Arc;

    struct Recorder;

    impl Input for Recorder {
        fn display_modes(&self) -> Result<Vec<DisplayMode>, decklink::Error> {
            Ok(Vec::new())
        }

        fn enable_video_input(
            &self,
            _mode: decklink::DisplayModeId,
            _format: PixelFormat,
            _flags: VideoInputFlags,
        ) -> HResult {
            HResult::OK
        }

        fn disable_video_input(&self) -> HResult {
            HResult::OK
        }

        fn set_callback(&self, _callback: Option<&decklink::CallbackRef>) -> HResult {
            HResult::OK
        }

        fn set_screen_preview_callback(
            &self,
            _callback: Option<&decklink::CallbackRef>,
        ) -> HResult {
            HResult::OK
        }

        fn start_streams(&self) -> HResult {
            HResult::OK
        }

        fn stop_streams(&self) -> HResult {
            HResult::OK
        }
    }

    struct Named(Option<&'static str>);

    impl Device for Named {
        fn display_name(&self) -> Option<String> {
            self.0.map(str::to_string)
        }

        fn model_name(&self) -> Option<String> {
            None
        }

        fn input(&self) -> Option<Box<dyn Input>> {
            Some(Box::new(Recorder))
        }
    }

    struct Attached(Vec<Option<&'static str>>);

    impl Driver for Attached {
        fn create_iterator(&self) -> Result<Box<dyn DeviceIterator>, decklink::Error> {
            let devices: Vec<DeviceHandle> = self
                .0
                .iter()
                .map(|&name| Arc::new(Named(name)) as DeviceHandle)
                .collect();
            Ok(Box::new(Devices(devices.into_iter())))
        }
    }

    struct Devices(std::vec::IntoIter<DeviceHandle>);

    impl DeviceIterator for Devices {
        fn next_device(&mut self) -> Result<Option<DeviceHandle>, decklink::Error> {
            Ok(self.0.next())
        }
    }

    fn context() -> DeviceContext {
        DeviceContext::new(Arc::new(Attached(vec![
            Some("DeckLink Duo (1)"),
            Some("DeckLink Duo (2)"),
            None,
        ])))
    }

    fn args(pattern: &str) -> Args {
        Args {
            pattern: pattern.to_string(),
            verbose: false,
        }
    }

    #[test]
    fn test_unnamed_device_listed_by_serial() {
        let output = collect(&context(), &args("2")).unwrap();
        assert_eq!(output.summary.total_devices, 3);
        let listed: Vec<_> = output
            .devices
            .iter()
            .map(|d| (d.position, d.serial.as_str()))
            .collect();
        assert_eq!(listed, vec![(0, "DeckLink Duo (2)"), (1, "2")]);

        let text = format_text(&output);
        assert!(text.contains("\n  2\n"), "{}", text);
        assert!(!text.contains('['), "{}", text);
    }

    #[test]
    fn test_json_uses_position() {
        let output = collect(&context(), &args("*")).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["devices"][2]["serial"], "2");
        assert_eq!(json["devices"][2]["position"], 2);
        assert!(json["devices"][2].get("index").is_none());
        assert_eq!(json["summary"]["matching"], 3);
    }
}
