//! @ai:module:intent SDCC command-line option tables and request validation
//! @ai:module:layer domain
//! @ai:module:public_api CompileOptions, OptionError, STANDARDS, OPTIMIZATIONS, PROCESSORS, dependent_options
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language standards accepted after `--std-`.
pub static STANDARDS: &[&str] = &[
    "c89", "sdcc89", "c95", "c99", "sdcc99", "c11", "sdcc11", "c2x", "sdcc2x",
];

/// Optimization switches, passed as `--<name>`.
pub static OPTIMIZATIONS: &[&str] = &[
    "noloopreverse",
    "nolabelopt",
    "no-xinit-opt",
    "nooverlay",
    "no-peep",
    "peep-return",
    "no-peep-return",
    "opt-code-speed",
    "opt-code-size",
    "fomit-frame-pointer",
    "nolospre",
    "nostdlibcall",
];

/// Target processors, passed as `-m<name>`.
pub static PROCESSORS: &[&str] = &[
    "mcs51", "ds390", "ds400", "z80", "z180", "r2k", "r3ka", "sm83", "tlcs90", "ez80_z80", "stm8",
];

static MCS51_OPTIONS: &[&str] = &["model-small", "model-medium", "model-large", "model-huge"];

static DS390_OPTIONS: &[&str] = &[
    "model-flat24",
    "protect-sp-update",
    "stack-10bit",
    "stack-probe",
    "use-accelerator",
];

static Z80_OPTIONS: &[&str] = &[
    "no-std-crt0",
    "callee-saves-bc",
    "reserve-regs-iy",
    "fno-omit-frame-pointer",
];

static SM83_OPTIONS: &[&str] = &["no-std-crt0", "callee-saves-bc"];

static STM8_OPTIONS: &[&str] = &["model-medium", "model-large"];

/// @ai:intent Options that only make sense for one processor family
/// @ai:example ("ds400") -> ["model-flat24", ...]
/// @ai:example ("pic16") -> []
/// @ai:effects pure
pub fn dependent_options(processor: &str) -> &'static [&'static str] {
    match processor {
        "mcs51" => MCS51_OPTIONS,
        "ds390" | "ds400" => DS390_OPTIONS,
        "z80" | "z180" | "r2k" | "r3ka" | "tlcs90" | "ez80_z80" => Z80_OPTIONS,
        "sm83" => SM83_OPTIONS,
        "stm8" => STM8_OPTIONS,
        _ => &[],
    }
}

/// @ai:intent Rejected compile option
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionError {
    #[error("Unknown language standard: {0}")]
    UnknownStandard(String),

    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),

    #[error("Unknown optimization: {0}")]
    UnknownOptimization(String),

    #[error("Option '{option}' is not available for processor '{processor}'")]
    UnsupportedDependent { option: String, processor: String },
}

/// @ai:intent Options of one compiler invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    #[serde(default = "default_standard")]
    pub standard: String,
    #[serde(default = "default_processor")]
    pub processor: String,
    #[serde(default)]
    pub optimizations: Vec<String>,
    #[serde(default)]
    pub dependent: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            standard: default_standard(),
            processor: default_processor(),
            optimizations: Vec::new(),
            dependent: Vec::new(),
        }
    }
}

fn default_standard() -> String {
    "c99".to_string()
}

fn default_processor() -> String {
    "mcs51".to_string()
}

impl CompileOptions {
    /// @ai:intent Check every option against the tables
    /// @ai:post Ok means to_args() yields only known switches
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), OptionError> {
        if !STANDARDS.contains(&self.standard.as_str()) {
            return Err(OptionError::UnknownStandard(self.standard.clone()));
        }
        if !PROCESSORS.contains(&self.processor.as_str()) {
            return Err(OptionError::UnknownProcessor(self.processor.clone()));
        }
        if let Some(unknown) = self
            .optimizations
            .iter()
            .find(|o| !OPTIMIZATIONS.contains(&o.as_str()))
        {
            return Err(OptionError::UnknownOptimization(unknown.clone()));
        }

        let allowed = dependent_options(&self.processor);
        if let Some(unsupported) = self.dependent.iter().find(|o| !allowed.contains(&o.as_str())) {
            return Err(OptionError::UnsupportedDependent {
                option: unsupported.clone(),
                processor: self.processor.clone(),
            });
        }

        Ok(())
    }

    /// @ai:intent Command-line arguments for these options, in compiler order
    /// @ai:example (c99, z80, [no-peep], [no-std-crt0]) -> ["--std-c99", "-mz80", "--no-peep", "--no-std-crt0"]
    /// @ai:effects pure
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--std-{}", self.standard),
            format!("-m{}", self.processor),
        ];
        args.extend(
            self.optimizations
                .iter()
                .chain(&self.dependent)
                .map(|o| format!("--{}", o)),
        );
        args
    }
}
