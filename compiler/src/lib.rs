//! @ai:module:intent Compile runner for the sectioner: invoke SDCC and overlay its output onto stored sections
//! @ai:module:layer application
//! @ai:module:public_api config, options, toolchain, backend, session, report

pub mod backend;
pub mod config;
pub mod options;
pub mod report;
pub mod session;
pub mod toolchain;

pub use backend::{CompileArtifacts, CompileRequest, CompilerBackend, MockBackend, SdccBackend};
pub use config::CompilerConfig;
pub use options::{dependent_options, CompileOptions, OptionError};
pub use session::{CompileReport, CompileSession};
pub use toolchain::{ToolchainStatus, ToolchainValidator};
