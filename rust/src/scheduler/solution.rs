//! Schedule result: per-machine timelines and the makespan.

use rustc_hash::FxHashMap;

use crate::error::{Result, SchedulingError};
use crate::models::{Allocation, MachineId, TaskId, Time};

use super::timeline::MachineTimeline;

/// A complete or in-progress schedule.
///
/// Mutated only through `add_allocation`, which keeps every timeline
/// overlap-free and the makespan current.
#[derive(Clone, Debug)]
pub struct Solution {
    timelines: Vec<MachineTimeline>,
    by_task: FxHashMap<TaskId, Allocation>,
    /// Tasks in the order they were committed.
    order: Vec<TaskId>,
    makespan: Time,
}

impl Solution {
    pub fn new(machines: usize) -> Self {
        Self {
            timelines: (0..machines).map(MachineTimeline::new).collect(),
            by_task: FxHashMap::default(),
            order: Vec::new(),
            makespan: 0,
        }
    }

    /// Record `task` on `machine` over `[start, finish)`.
    pub fn add_allocation(
        &mut self,
        task: TaskId,
        machine: MachineId,
        start: Time,
        finish: Time,
    ) -> Result<Allocation> {
        if finish < start {
            return Err(SchedulingError::InvalidConfig(format!(
                "Task {} finishes at {} before it starts at {}",
                task, finish, start
            )));
        }
        if self.by_task.contains_key(&task) {
            return Err(SchedulingError::PreconditionViolated(format!(
                "Task {} is already allocated",
                task
            )));
        }
        let timeline = self.timelines.get_mut(machine).ok_or_else(|| {
            SchedulingError::InvalidConfig(format!("Unknown machine {}", machine))
        })?;

        let allocation = Allocation::new(task, machine, start, finish);
        timeline.insert(allocation)?;

        self.by_task.insert(task, allocation);
        self.order.push(task);
        self.makespan = self.makespan.max(finish);
        Ok(allocation)
    }

    /// Allocations on `machine` in start-time order; empty for unknown machines.
    pub fn allocations_for(&self, machine: MachineId) -> &[Allocation] {
        self.timelines
            .get(machine)
            .map(|t| t.allocations())
            .unwrap_or(&[])
    }

    pub fn timeline(&self, machine: MachineId) -> Option<&MachineTimeline> {
        self.timelines.get(machine)
    }

    pub fn timelines(&self) -> &[MachineTimeline] {
        &self.timelines
    }

    /// Maximum finish time over all allocations, 0 if empty.
    pub fn makespan(&self) -> Time {
        self.makespan
    }

    pub fn allocation_of(&self, task: TaskId) -> Option<&Allocation> {
        self.by_task.get(&task)
    }

    /// All allocations in commit order.
    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> + '_ {
        self.order.iter().filter_map(|t| self.by_task.get(t))
    }

    pub fn commit_order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn machine_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn len(&self) -> usize {
        self.by_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }
}
