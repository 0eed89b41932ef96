//! Deferred callbacks (`setTimeout`).
//!
//! Callbacks are queued with a delay on a virtual clock and drained after the
//! script body finishes. Draining invokes each callback exactly once with the
//! global context, in either mode: whatever receiver scheduled it is gone by
//! then, so only a bound callback keeps its context. A failing callback does
//! not stop the drain.

use itertools::Itertools;
use tracing::{trace, warn};

use crate::binding;
use crate::callable::CallableRef;
use crate::errors::EvalError;
use crate::realm::Realm;
use crate::resolver::{ContextValue, InvocationKind};
use crate::value::Value;

#[derive(Debug)]
struct Task {
    id: u64,
    due: u64,
    callee: CallableRef,
    args: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    clock: u64,
    next_id: u64,
    queue: Vec<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `callee` to run `delay_ms` after the current virtual time. Returns the task id.
    pub fn schedule(&mut self, callee: CallableRef, delay_ms: u64, args: Vec<Value>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let due = self.clock.saturating_add(delay_ms);
        trace!(id, due, callee = %callee.name(), "scheduled deferred callback");
        self.queue.push(Task { id, due, callee, args });
        id
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Virtual milliseconds elapsed so far.
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Earliest due task; ties run in scheduling order.
    fn pop_next(&mut self) -> Option<Task> {
        let idx = self.queue.iter().position_min_by_key(|t| (t.due, t.id))?;
        let task = self.queue.remove(idx);
        self.clock = self.clock.max(task.due);
        Some(task)
    }
}

/// Outcome of one drain.
#[derive(Debug, Default)]
pub struct Drained {
    /// Callbacks invoked, failed ones included.
    pub ran: usize,
    pub failures: Vec<EvalError>,
}

/// Runs queued callbacks until the queue is empty, including ones scheduled
/// while draining.
pub fn run_pending(realm: &mut Realm) -> Drained {
    let mut drained = Drained::default();
    while let Some(task) = realm.scheduler_mut().pop_next() {
        trace!(id = task.id, at = task.due, "running deferred callback");
        let kind = InvocationKind::ExplicitCall(ContextValue::Global);
        if let Err(err) = binding::invoke(&task.callee, kind, task.args, realm) {
            warn!(id = task.id, callee = %task.callee.name(), %err, "deferred callback failed");
            drained.failures.push(err);
        }
        drained.ran += 1;
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::BindingSpec;
    use crate::options::Mode;
    use crate::value::ObjectRef;
    use pretty_assertions::assert_eq;

    fn recorder(label: &'static str) -> CallableRef {
        CallableRef::from_fn(label, 0, move |inv, realm| {
            let line = Value::from(format!("{label}:{}", inv.this.kind_name()));
            realm.console_mut().log(&[line]);
            Ok(Value::Undefined)
        })
    }

    #[test]
    fn drains_by_due_time_then_insertion() {
        let mut realm = Realm::default();
        realm.scheduler_mut().schedule(recorder("late"), 20, vec![]);
        realm.scheduler_mut().schedule(recorder("first"), 5, vec![]);
        realm.scheduler_mut().schedule(recorder("second"), 5, vec![]);
        assert_eq!(run_pending(&mut realm).ran, 3);
        assert_eq!(
            realm.console().lines(),
            &["first:global".to_string(), "second:global".into(), "late:global".into()]
        );
        assert_eq!(realm.scheduler().now(), 20);
        assert_eq!(realm.scheduler().pending(), 0);
    }

    #[test]
    fn bound_callbacks_keep_their_context() {
        let mut realm = Realm::default();
        let obj = ObjectRef::new();
        let spec = BindingSpec::new(recorder("bound"), ContextValue::Object(obj), vec![]);
        realm.scheduler_mut().schedule(CallableRef::bound(spec), 0, vec![]);
        run_pending(&mut realm);
        assert_eq!(realm.console().lines(), &["bound:object".to_string()]);
    }

    #[test]
    fn callbacks_scheduled_while_draining_also_run() {
        let mut realm = Realm::default();
        let outer = CallableRef::from_fn("outer", 0, |_, realm| {
            realm.scheduler_mut().schedule(recorder("inner"), 10, vec![]);
            Ok(Value::Undefined)
        });
        realm.scheduler_mut().schedule(outer, 10, vec![]);
        assert_eq!(run_pending(&mut realm).ran, 2);
        assert_eq!(realm.scheduler().now(), 20);
    }

    #[test]
    fn unbound_callbacks_see_global_when_strict() {
        let mut realm = Realm::new(Mode::Strict);
        realm.scheduler_mut().schedule(recorder("strict"), 0, vec![]);
        run_pending(&mut realm);
        assert_eq!(realm.console().lines(), &["strict:global".to_string()]);
    }

    #[test]
    fn failing_callback_does_not_stop_the_drain() {
        let mut realm = Realm::default();
        let failing = CallableRef::from_fn("failing", 0, |_, _| Err(EvalError::Runtime("boom".into())));
        realm.scheduler_mut().schedule(failing, 0, vec![]);
        realm.scheduler_mut().schedule(recorder("after"), 5, vec![]);
        let drained = run_pending(&mut realm);
        assert_eq!(drained.ran, 2);
        assert_eq!(drained.failures.len(), 1);
        assert_eq!(realm.console().lines(), &["after:global".to_string()]);
        assert_eq!(realm.scheduler().pending(), 0);
    }
}
