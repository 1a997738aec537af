//! @ai:module:intent Compiler invocation behind a trait: SDCC subprocess and a fixed-output mock
//! @ai:module:layer infrastructure
//! @ai:module:public_api CompilerBackend, CompileRequest, CompileArtifacts, SdccBackend, MockBackend
//! @ai:module:depends_on config, options

use crate::config::ToolConfig;
use crate::options::CompileOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::process::Command;
use tempfile::TempDir;

/// @ai:intent What to compile: file naming and compiler options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source_name: String,
    pub listing_name: String,
    pub options: CompileOptions,
}

impl CompileRequest {
    /// @ai:intent Build a request from the tool file naming and the options to use
    /// @ai:effects pure
    pub fn new(tool: &ToolConfig, options: CompileOptions) -> Self {
        Self {
            source_name: tool.source_name(),
            listing_name: tool.listing_name(),
            options,
        }
    }
}

/// @ai:intent Raw text the compiler produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileArtifacts {
    pub stdout: String,
    pub stderr: String,
    /// Assembly listing; None when the compiler wrote none.
    pub listing: Option<String>,
}

impl CompileArtifacts {
    pub fn listing_exists(&self) -> bool {
        self.listing.is_some()
    }
}

/// @ai:intent Trait for compiler invocation
pub trait CompilerBackend: Send + Sync {
    /// @ai:intent Compile one source text and collect what the compiler wrote
    /// @ai:pre request.options.validate() is Ok
    fn compile(&self, source: &str, request: &CompileRequest) -> Result<CompileArtifacts>;
}

/// @ai:intent Runs SDCC in a scratch directory
pub struct SdccBackend {
    binary: String,
}

impl SdccBackend {
    /// @ai:intent Create a backend for the given compiler binary
    /// @ai:effects pure
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl CompilerBackend for SdccBackend {
    /// @ai:intent Write the source into a temp dir, run `<binary> -S <options> <file>`, read back the outputs
    /// @ai:post the scratch directory is removed when this returns
    /// @ai:effects fs:write, io
    fn compile(&self, source: &str, request: &CompileRequest) -> Result<CompileArtifacts> {
        request.options.validate()?;

        let temp_dir = TempDir::new().context("Failed to create compile directory")?;
        let src_path = temp_dir.path().join(&request.source_name);
        std::fs::write(&src_path, source)
            .with_context(|| format!("Failed to write {}", src_path.display()))?;

        let args = request.options.to_args();
        tracing::debug!(
            "Running {} -S {} {}",
            self.binary,
            args.join(" "),
            request.source_name
        );

        let output = Command::new(&self.binary)
            .arg("-S")
            .args(&args)
            .arg(&request.source_name)
            .current_dir(temp_dir.path())
            .output()
            .with_context(|| format!("Failed to run compiler '{}'", self.binary))?;

        let listing_path = temp_dir.path().join(&request.listing_name);
        let listing = if listing_path.exists() {
            Some(
                std::fs::read_to_string(&listing_path)
                    .with_context(|| format!("Failed to read {}", listing_path.display()))?,
            )
        } else {
            None
        };

        tracing::debug!(
            "Compiler exited with {} (listing {})",
            output.status,
            if listing.is_some() { "written" } else { "missing" }
        );

        Ok(CompileArtifacts {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            listing,
        })
    }
}

/// @ai:intent Mock backend for testing
pub struct MockBackend {
    artifacts: CompileArtifacts,
}

impl MockBackend {
    /// @ai:intent Create a mock that returns fixed artifacts
    /// @ai:effects pure
    pub fn new(artifacts: CompileArtifacts) -> Self {
        Self { artifacts }
    }

    /// @ai:intent Mock of a successful compile with the given stderr and listing
    pub fn compiled(stderr: &str, listing: &str) -> Self {
        Self::new(CompileArtifacts {
            stdout: String::new(),
            stderr: stderr.to_string(),
            listing: Some(listing.to_string()),
        })
    }

    /// @ai:intent Mock of a failed compile: stderr only, no listing
    pub fn failed(stderr: &str) -> Self {
        Self::new(CompileArtifacts {
            stdout: String::new(),
            stderr: stderr.to_string(),
            listing: None,
        })
    }
}

impl CompilerBackend for MockBackend {
    /// @ai:intent Return mock artifacts
    /// @ai:effects pure
    fn compile(&self, _source: &str, request: &CompileRequest) -> Result<CompileArtifacts> {
        request.options.validate()?;
        Ok(self.artifacts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> CompileRequest {
        CompileRequest::new(&ToolConfig::default(), CompileOptions::default())
    }

    #[test]
    fn test_request_names() {
        let request = request();
        assert_eq!(request.source_name, "source.c");
        assert_eq!(request.listing_name, "source.asm");
    }

    #[test]
    fn test_mock_backend() {
        let backend = MockBackend::compiled("source.c:3: warning 85\n", ";\tsource.c:3\n");
        let artifacts = backend.compile("int x;", &request()).unwrap();
        assert!(artifacts.listing_exists());
        assert_eq!(artifacts.stderr, "source.c:3: warning 85\n");

        let failed = MockBackend::failed("source.c:1: syntax error\n");
        assert!(!failed.compile("int", &request()).unwrap().listing_exists());
    }

    #[test]
    fn test_invalid_options_rejected_before_compiling() {
        let mut request = request();
        request.options.processor = "6502".to_string();

        let backend = SdccBackend::new("nonexistent_compiler_xyz");
        let err = backend.compile("int x;", &request).unwrap_err();
        assert!(err.to_string().contains("Unknown processor"));
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let backend = SdccBackend::new("nonexistent_compiler_xyz");
        let err = backend.compile("int x;", &request()).unwrap_err();
        assert!(err.to_string().contains("nonexistent_compiler_xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_no_listing_when_compiler_writes_none() {
        // `true` accepts any arguments and writes nothing.
        let backend = SdccBackend::new("true");
        let artifacts = backend.compile("int x;", &request()).unwrap();
        assert_eq!(artifacts, CompileArtifacts::default());
    }
}
