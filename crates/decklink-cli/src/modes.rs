// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Display mode listing for one device.

use crate::error::CliError;
use clap::Args as ClapArgs;
use decklink::DisplayMode;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Device match pattern ("*" for the first device)
    #[arg(default_value = decklink::discovery::MATCH_ANY)]
    pattern: String,
}

#[derive(Debug, Serialize)]
struct ModesOutput {
    serial: String,
    modes: Vec<DisplayMode>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing modes command: {:?}", args);

    let (device, serial) = decklink::context().resolve_with_serial(&args.pattern)?;
    let input = device
        .input()
        .ok_or(decklink::Error::CapabilityUnsupported("input"))?;
    let modes = input.display_modes()?;

    let output = ModesOutput { serial, modes };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("{} ({} display modes)\n", output.serial, output.modes.len());
        for mode in &output.modes {
            println!(
                "  {}  {:>4}x{:<4}  {:>6.2} fps  {}",
                mode.id,
                mode.width,
                mode.height,
                mode.frame_rate(),
                mode.name.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}
