use itertools::Itertools;
use tracing::info;

use crate::value::Value;

/// Diagnostic output channel: an ordered list of rendered log lines.
#[derive(Debug, Default, Clone)]
pub struct Console {
    lines: Vec<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `args` space-separated, the way `console.log` does, and records the line.
    pub fn log(&mut self, args: &[Value]) {
        let line = args.iter().map(Value::to_string).join(" ");
        info!(target: "console", "{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
