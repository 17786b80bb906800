//! Per-machine timeline of committed allocations with gap search.

use crate::error::{Result, SchedulingError};
use crate::models::{Allocation, MachineId, Time};

/// An idle interval on a machine. `end == None` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gap {
    pub start: Time,
    pub end: Option<Time>,
}

impl Gap {
    /// Earliest start in this gap for a task that becomes ready at `ready_time`.
    ///
    /// Returns `None` if the task does not fit.
    fn fit(&self, ready_time: Time, duration: Time) -> Option<Time> {
        match self.end {
            Some(end) if ready_time < self.start => {
                (self.start + duration <= end).then_some(self.start)
            }
            Some(end) => (ready_time + duration <= end).then_some(ready_time),
            None => Some(ready_time.max(self.start)),
        }
    }
}

/// Allocations on a single machine, kept sorted by `(start, finish)`.
///
/// Invariant: no two allocations overlap.
#[derive(Clone, Debug)]
pub struct MachineTimeline {
    machine: MachineId,
    allocations: Vec<Allocation>,
}

impl MachineTimeline {
    pub fn new(machine: MachineId) -> Self {
        Self {
            machine,
            allocations: Vec::new(),
        }
    }

    pub fn machine(&self) -> MachineId {
        self.machine
    }

    /// Allocations in start-time order.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Finish time of the last allocation, or 0 if the machine is idle.
    pub fn last_finish(&self) -> Time {
        self.allocations.last().map(|a| a.finish).unwrap_or(0)
    }

    /// Idle intervals in timeline order.
    ///
    /// A leading gap `(0, first.start)` is present only when the first
    /// allocation does not start at 0. Intermediate gaps may have zero width.
    /// The final gap is unbounded.
    pub fn gaps(&self) -> Vec<Gap> {
        let Some(first) = self.allocations.first() else {
            return vec![Gap {
                start: 0,
                end: None,
            }];
        };

        let mut gaps = Vec::with_capacity(self.allocations.len() + 1);
        if first.start != 0 {
            gaps.push(Gap {
                start: 0,
                end: Some(first.start),
            });
        }
        for pair in self.allocations.windows(2) {
            gaps.push(Gap {
                start: pair[0].finish,
                end: Some(pair[1].start),
            });
        }
        gaps.push(Gap {
            start: self.last_finish(),
            end: None,
        });
        gaps
    }

    /// Earliest start time for a task of `duration` that is ready at `ready_time`.
    ///
    /// Gaps are tried in timeline order and the first one that fits wins,
    /// even if a later gap would be tighter.
    pub fn earliest_start(&self, ready_time: Time, duration: Time) -> Time {
        if self.allocations.is_empty() {
            return ready_time;
        }
        self.gaps()
            .iter()
            .find_map(|gap| gap.fit(ready_time, duration))
            .unwrap_or_else(|| ready_time.max(self.last_finish()))
    }

    /// Insert an allocation, keeping start-time order.
    ///
    /// Fails with `TimelineOverlap` if it intersects an existing allocation;
    /// the timeline is left unchanged in that case.
    pub fn insert(&mut self, allocation: Allocation) -> Result<()> {
        if allocation.machine != self.machine {
            return Err(SchedulingError::InvalidConfig(format!(
                "Allocation for task {} targets machine {}, not {}",
                allocation.task, allocation.machine, self.machine
            )));
        }

        let key = (allocation.start, allocation.finish);
        let idx = self
            .allocations
            .partition_point(|a| (a.start, a.finish) < key);

        // Sorted and non-overlapping, so only the neighbours can intersect
        let neighbours = [
            idx.checked_sub(1).and_then(|i| self.allocations.get(i)),
            self.allocations.get(idx),
        ];
        if let Some(existing) = neighbours
            .into_iter()
            .flatten()
            .find(|existing| existing.overlaps(&allocation))
        {
            return Err(SchedulingError::TimelineOverlap {
                machine: self.machine,
                task: allocation.task,
                start: allocation.start,
                finish: allocation.finish,
                existing: existing.task,
            });
        }

        self.allocations.insert(idx, allocation);
        Ok(())
    }
}
