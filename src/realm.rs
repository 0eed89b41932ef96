//! Process-wide state for one evaluation.
//!
//! A realm is created before a script runs and dropped after its deferred
//! callbacks have drained. It owns the global context, which is the only
//! state shared across invocations.

use crate::console::Console;
use crate::functions::builtins::Log;
use crate::callable::CallableRef;
use crate::options::Mode;
use crate::resolver::Resolver;
use crate::scheduler::Scheduler;
use crate::value::{ObjectRef, Value};

pub struct Realm {
    global: ObjectRef,
    resolver: Resolver,
    console: Console,
    scheduler: Scheduler,
}

impl Realm {
    /// Fresh realm whose global object carries `console.log`.
    pub fn new(mode: Mode) -> Self {
        let global = ObjectRef::global();
        let console = ObjectRef::from_pairs([("log", Value::Function(CallableRef::native(Log)))]);
        global.set("console", Value::Object(console));
        Self {
            global,
            resolver: Resolver::new(mode),
            console: Console::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    pub fn mode(&self) -> Mode {
        self.resolver.mode()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn into_console(self) -> Console {
        self.console
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}
