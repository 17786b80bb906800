//! Task ordering for list scheduling.
//!
//! Tasks are scheduled by descending rank with ascending task ID breaking
//! ties, so a fixed input always yields the same order.

use std::cmp::Ordering;

use crate::error::{Result, SchedulingError};
use crate::graph::Workflow;
use crate::models::TaskId;

/// Sort key for task prioritisation.
///
/// Implements `Ord` so that sorting ascending yields scheduling order
/// (highest rank first, then lowest ID).
#[derive(Debug, Clone, Copy)]
pub struct RankKey {
    pub rank: f64,
    pub task: TaskId,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .total_cmp(&self.rank)
            .then(self.task.cmp(&other.task))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

/// All task IDs in scheduling priority order.
///
/// Fails with `PreconditionViolated` if any task has not been ranked.
pub fn priority_order(workflow: &Workflow) -> Result<Vec<TaskId>> {
    let mut keys: Vec<RankKey> = Vec::with_capacity(workflow.len());
    for task in workflow.tasks() {
        let rank = task.rank.ok_or_else(|| {
            SchedulingError::PreconditionViolated(format!(
                "Task {} has no rank; rank the workflow before scheduling",
                task.id
            ))
        })?;
        keys.push(RankKey {
            rank,
            task: task.id,
        });
    }

    keys.sort();

    Ok(keys.into_iter().map(|k| k.task).collect())
}

/// Priority list that only releases tasks whose predecessors are committed.
///
/// With positive average runtimes, rank order is already a topological
/// order and tasks come out exactly in priority order. Equal ranks along a
/// zero-cost chain could otherwise release a successor first.
#[derive(Debug, Clone)]
pub struct ReadyList {
    pending: Vec<TaskId>,
    waiting_on: Vec<usize>,
}

impl ReadyList {
    pub fn new(workflow: &Workflow, order: Vec<TaskId>) -> Self {
        let waiting_on = (0..workflow.len())
            .map(|t| workflow.predecessors(t).count())
            .collect();
        Self {
            pending: order,
            waiting_on,
        }
    }

    /// Remove and return the highest-priority ready task.
    pub fn pop_ready(&mut self) -> Option<TaskId> {
        let pos = self
            .pending
            .iter()
            .position(|&task| self.waiting_on[task] == 0)?;
        Some(self.pending.remove(pos))
    }

    /// Record that `task` has been committed, releasing its successors.
    pub fn mark_committed(&mut self, workflow: &Workflow, task: TaskId) {
        for succ in workflow.successors(task) {
            self.waiting_on[succ] = self.waiting_on[succ].saturating_sub(1);
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
