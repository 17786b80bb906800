//! Error types shared by ranking and scheduling.

use thiserror::Error;

use crate::models::{MachineId, TaskId, Time};

/// Errors that can occur while ranking or scheduling a workflow.
///
/// Every variant is fatal for the run that produced it: no partial ranks or
/// partial schedules are returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// Cycle detected, or an edge refers to a task that does not exist.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    /// A runtime, data size or machine throughput needed for the run is missing.
    #[error("Incomplete attributes: {0}")]
    IncompleteAttributes(String),
    /// `schedule` was called before every task had a rank.
    #[error("Scheduling precondition violated: {0}")]
    PreconditionViolated(String),
    /// An allocation intersects an existing one on the same machine.
    ///
    /// Correct EST computation never produces this; seeing it means the
    /// scheduler has a defect.
    #[error(
        "Timeline overlap on machine {machine}: task {task} [{start}, {finish}) intersects task {existing}"
    )]
    TimelineOverlap {
        machine: MachineId,
        task: TaskId,
        start: Time,
        finish: Time,
        existing: TaskId,
    },
    #[error("Unknown scheduling strategy: {0}")]
    UnknownStrategy(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
