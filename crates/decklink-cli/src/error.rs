// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// No device matched the requested pattern
    DeviceNotFound(String),
    /// DeckLink driver or library not installed
    DriverUnavailable(String),
    /// Capture could not be configured or started
    CaptureFailed(String),
    /// General error from the DeckLink library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CliError::DriverUnavailable(msg) => write!(f, "Driver unavailable: {}", msg),
            CliError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    fn code(&self) -> u8 {
        match self {
            CliError::InvalidArgs(_) => 2,
            CliError::DeviceNotFound(_) => 3,
            CliError::DriverUnavailable(_) => 4,
            CliError::CaptureFailed(_) => 5,
            CliError::General(_) => 1,
        }
    }
}

/// Map decklink::Error to CliError with appropriate exit codes
impl From<decklink::Error> for CliError {
    fn from(err: decklink::Error) -> Self {
        use decklink::Error;

        match err {
            Error::DeviceNotFound(pattern) => {
                CliError::DeviceNotFound(format!("no capture device matches '{}'", pattern))
            }

            // Loader and driver installation problems
            Error::LibraryNotLoaded(lib_err) => {
                CliError::DriverUnavailable(format!("Failed to load library: {}", lib_err))
            }
            Error::SymbolNotFound(sym) => {
                CliError::DriverUnavailable(format!("Symbol not found: {}", sym))
            }
            Error::DriverUnavailable(msg) => CliError::DriverUnavailable(msg),

            // Session setup failures
            err @ (Error::CapabilityUnsupported(_)
            | Error::NoCompatibleMode
            | Error::StreamStartFailed(_)) => CliError::CaptureFailed(err.to_string()),

            err @ (Error::Driver { .. } | Error::NoInterface) => {
                CliError::General(err.to_string())
            }
            Error::NullPointer => CliError::General("Unexpected null pointer".to_string()),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
