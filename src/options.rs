use serde::{Deserialize, Serialize};

/// How a missing context is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// A missing (or null/undefined) context falls back to the global context.
    #[default]
    Sloppy,
    /// A missing context stays absent; touching its properties is an error.
    Strict,
}

/// Evaluation knobs. Deserializable so the CLI can take them as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    pub mode: Mode,
    /// Drain the deferred-callback queue once the script body has run.
    pub run_deferred: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { mode: Mode::Sloppy, run_deferred: true }
    }
}
