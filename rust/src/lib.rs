//! HEFT and PHEFT list scheduling of workflow DAGs onto heterogeneous machines.
//!
//! A [`Workflow`] is ranked against an [`Environment`] (upward rank or
//! Optimistic Cost Table rank) and then scheduled task by task into
//! per-machine timelines, reusing idle gaps where a task fits.
//!
//! With the `python` feature the same core is exposed as the `shadow.rust`
//! extension module.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

pub mod config;
pub mod environment;
pub mod error;
pub mod graph;
pub mod interner;
pub mod logging;
pub mod models;
pub mod ranking;
pub mod scheduler;
pub mod sorting;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod test_fixtures;

pub use config::{RankStrategy, SchedulingConfig};
pub use environment::Environment;
pub use error::{Result, SchedulingError};
pub use graph::Workflow;
pub use models::{Allocation, Edge, Machine, MachineId, Task, TaskId, Time};
pub use ranking::{
    optimistic_cost_table, rank, rank_with_config, upward_ranks, OptimisticCostTable, Ranking,
};
pub use scheduler::{
    heft, pheft, rank_and_schedule, schedule, Candidate, Gap, ListScheduler, MachineTimeline,
    Solution,
};
pub use sorting::{priority_order, RankKey, ReadyList};
