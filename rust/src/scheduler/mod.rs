//! Insertion-based list scheduling.
//!
//! `core` drives the HEFT / PHEFT selection loop; `timeline` holds the
//! per-machine gap search and `solution` the committed result.

mod core;
mod solution;
mod timeline;

pub use core::{heft, pheft, rank_and_schedule, schedule, Candidate, ListScheduler};
pub use solution::Solution;
pub use timeline::{Gap, MachineTimeline};
