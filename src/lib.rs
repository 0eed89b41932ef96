pub mod binding;
pub mod callable;
pub mod console;
pub mod demo;
pub mod errors;
pub mod expression;
pub mod functions;
pub mod interpreter;
pub mod options;
mod parser;
pub mod realm;
pub mod resolver;
pub mod scheduler;
pub mod value;

use serde::Serialize;
use tracing::debug;

use errors::Result;
use functions::Registry;
use interpreter::Interpreter;
use options::{EvalOptions, Mode};
use realm::Realm;

pub use callable::{BindingSpec, CallableRef, Function, Invocation};
pub use errors::EvalError;
pub use parser::ParseError;
pub use resolver::{ContextValue, InvocationKind, Resolver};
pub use value::{ObjectRef, Value};

/// What a script printed, and the mode it ran in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub mode: Mode,
    pub lines: Vec<String>,
    /// Deferred callbacks left in the queue (only non-zero when draining is disabled).
    pub pending: usize,
    /// Errors raised by deferred callbacks. A failing callback does not stop the others.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deferred_errors: Vec<String>,
}

/// Runs demonstration scripts against a registry of native functions.
pub struct Evaluator {
    options: EvalOptions,
    registry: Registry,
    globals: Vec<(String, serde_json::Value)>,
}

impl Evaluator {
    pub fn new(registry: Registry) -> Self {
        Self { options: EvalOptions::default(), registry, globals: Vec::new() }
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Seeds a global property from JSON before every run.
    pub fn with_global(mut self, name: impl Into<String>, json: serde_json::Value) -> Self {
        self.globals.push((name.into(), json));
        self
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses and runs `src` in a fresh realm, then drains deferred callbacks
    /// unless disabled. A leading `"use strict"` forces strict mode.
    pub fn run(&self, src: &str) -> Result<Transcript> {
        let program = expression::parse_program(src)?;
        let mode = if program.strict { Mode::Strict } else { self.options.mode };
        debug!(?mode, statements = program.body.len(), "running script");

        let mut realm = Realm::new(mode);
        for (name, json) in &self.globals {
            realm.global().set(name.as_str(), Value::from_json(json));
        }
        Interpreter::new(&self.registry).exec_program(&program, &mut realm)?;
        let mut deferred_errors = Vec::new();
        if self.options.run_deferred {
            let drained = scheduler::run_pending(&mut realm);
            debug!(ran = drained.ran, failed = drained.failures.len(), "drained deferred callbacks");
            deferred_errors = drained.failures.iter().map(ToString::to_string).collect();
        }

        let pending = realm.scheduler().pending();
        Ok(Transcript { mode, lines: realm.into_console().into_lines(), pending, deferred_errors })
    }
}

/// Convenience: run with the built-in registry and default options, returning the logged lines.
pub fn eval(src: &str) -> Result<Vec<String>> {
    let ev = Evaluator::new(Registry::with_builtins());
    Ok(ev.run(src)?.lines)
}
