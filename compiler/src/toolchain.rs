//! @ai:module:intent Check that the configured compiler can be invoked
//! @ai:module:layer infrastructure
//! @ai:module:public_api ToolchainValidator, ToolchainStatus
//! @ai:module:stateless true

use serde::Serialize;
use std::process::Command;

/// @ai:intent Result of probing the compiler binary
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainStatus {
    pub binary: String,
    pub available: bool,
    /// First line the compiler printed for `--version`.
    pub version: Option<String>,
}

/// @ai:intent Validates that the compiler is installed
pub struct ToolchainValidator;

impl ToolchainValidator {
    /// @ai:intent Get install hint for a compiler binary
    /// @ai:effects pure
    fn get_install_hint(binary: &str) -> &'static str {
        let name = std::path::Path::new(binary)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(binary);
        match name {
            "sdcc" => "Install SDCC: https://sdcc.sourceforge.net/ (or your package manager's `sdcc`)",
            _ => "Check the [compiler] binary setting in the configuration file",
        }
    }

    /// @ai:intent Run `<binary> --version` and capture the first line of output
    /// @ai:effects io
    fn probe_version(binary: &str) -> Option<String> {
        let output = Command::new(binary).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }

        // SDCC prints its banner to stdout; some builds use stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Some(text.lines().next().unwrap_or_default().trim().to_string())
    }

    /// @ai:intent Probe the compiler binary and return its status
    /// @ai:effects io
    pub fn validate(binary: &str) -> ToolchainStatus {
        let version = Self::probe_version(binary);
        ToolchainStatus {
            binary: binary.to_string(),
            available: version.is_some(),
            version,
        }
    }

    /// @ai:intent Log a warning when the compiler is missing
    /// @ai:effects io
    pub fn log_warnings(status: &ToolchainStatus) {
        if !status.available {
            tracing::warn!(
                "Compiler '{}' not found - compilation is unavailable. {}",
                status.binary,
                Self::get_install_hint(&status.binary)
            );
        }
    }
}
