//! Core data types for the scheduling system.

use rustc_hash::FxHashMap;

/// Index of a task in its workflow arena.
pub type TaskId = usize;

/// Index of a machine in its environment, also its tie-break position.
pub type MachineId = usize;

/// Integer time unit used for runtimes, data sizes and schedule times.
pub type Time = u64;

/// A workflow task (DAG node).
#[derive(Clone, Debug)]
pub struct Task {
    pub id: TaskId,
    /// Abstract work units (e.g. FLOPs), converted to runtimes by the environment.
    pub demand: Option<f64>,
    /// Execution duration per machine.
    pub runtime_on: FxHashMap<MachineId, Time>,
    /// Scheduling priority; `None` until ranked.
    pub rank: Option<f64>,
    /// Placement; `None` until scheduled.
    pub allocation: Option<Allocation>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            demand: None,
            runtime_on: FxHashMap::default(),
            rank: None,
            allocation: None,
        }
    }

    pub fn runtime_on(&self, machine: MachineId) -> Option<Time> {
        self.runtime_on.get(&machine).copied()
    }

    /// Mean runtime over `machines`, or `None` if any runtime is missing.
    ///
    /// Runtimes are summed as integers before the division so the result
    /// does not depend on machine order.
    pub fn average_runtime(&self, machines: &[MachineId]) -> Option<f64> {
        if machines.is_empty() {
            return Some(0.0);
        }
        let mut total: Time = 0;
        for machine in machines {
            total += self.runtime_on(*machine)?;
        }
        Some(total as f64 / machines.len() as f64)
    }

    pub fn is_ranked(&self) -> bool {
        self.rank.is_some()
    }

    pub fn assigned_machine(&self) -> Option<MachineId> {
        self.allocation.map(|a| a.machine)
    }

    pub fn start_time(&self) -> Option<Time> {
        self.allocation.map(|a| a.start)
    }

    pub fn finish_time(&self) -> Option<Time> {
        self.allocation.map(|a| a.finish)
    }
}

/// A data dependency between two tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: TaskId,
    pub target: TaskId,
    /// Data volume, used directly as a time-equivalent communication cost.
    /// `None` for a precedence-only edge whose volume was never supplied.
    pub data_size: Option<Time>,
}

/// A compute resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    /// Throughput in demand units per time unit, if known.
    pub flops: Option<f64>,
}

/// A task placed on a machine over `[start, finish)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub task: TaskId,
    pub machine: MachineId,
    pub start: Time,
    pub finish: Time,
}

impl Allocation {
    pub fn new(task: TaskId, machine: MachineId, start: Time, finish: Time) -> Self {
        Self {
            task,
            machine,
            start,
            finish,
        }
    }

    pub fn duration(&self) -> Time {
        self.finish - self.start
    }

    /// Whether the two half-open intervals intersect.
    ///
    /// Touching intervals (`a.finish == b.start`) do not overlap, and a
    /// zero-length allocation only overlaps an interval strictly containing it.
    pub fn overlaps(&self, other: &Allocation) -> bool {
        !(self.finish <= other.start || other.finish <= self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(runtimes: &[Time]) -> Task {
        let mut task = Task::new(0);
        for (machine, runtime) in runtimes.iter().enumerate() {
            task.runtime_on.insert(machine, *runtime);
        }
        task
    }

    #[test]
    fn test_average_runtime() {
        let task = make_task(&[14, 16, 9]);
        assert!((task.average_runtime(&[0, 1, 2]).unwrap() - 13.0).abs() < 1e-9);
        assert!((task.average_runtime(&[0, 2]).unwrap() - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_average_runtime_missing_machine() {
        let task = make_task(&[14, 16]);
        assert_eq!(task.average_runtime(&[0, 1, 2]), None);
    }

    #[test]
    fn test_unscheduled_task_has_no_placement() {
        let task = make_task(&[1]);
        assert!(!task.is_ranked());
        assert_eq!(task.assigned_machine(), None);
        assert_eq!(task.start_time(), None);
        assert_eq!(task.finish_time(), None);
    }

    #[test]
    fn test_allocation_overlap() {
        let a = Allocation::new(0, 0, 0, 10);
        assert!(a.overlaps(&Allocation::new(1, 0, 5, 15)));
        assert!(a.overlaps(&Allocation::new(1, 0, 2, 3)));
        assert!(!a.overlaps(&Allocation::new(1, 0, 10, 12)));
        assert!(!a.overlaps(&Allocation::new(1, 0, 10, 10)));
        assert!(a.overlaps(&Allocation::new(1, 0, 4, 4)));
    }
}
