// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::tasks::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Re-triggers that arrived while the same task was still running.
///
/// Semantics:
/// - Only used with [`TriggerWhileRunningBehaviour::Queue`].
/// - Each task has at most one pending follow-up run. Any number of
///   re-triggers during one invocation coalesce into that single entry.
/// - The entry is consumed when the running invocation completes.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, task: &str) -> bool {
        self.pending.contains(task)
    }

    /// Remember a follow-up run for `task`. Returns false when one was
    /// already pending (the trigger coalesced).
    pub fn record_trigger(&mut self, task: &str) -> bool {
        let inserted = self.pending.insert(task.to_string());
        debug!(task = %task, inserted, "queued follow-up run");
        inserted
    }

    /// Consume the pending follow-up for `task`, if any.
    pub fn take(&mut self, task: &str) -> bool {
        self.pending.remove(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_triggers_coalesce() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue);
        assert!(q.record_trigger("styles"));
        assert!(!q.record_trigger("styles"));
        assert!(q.take("styles"));
        assert!(!q.take("styles"));
        assert!(q.is_empty());
    }
}
