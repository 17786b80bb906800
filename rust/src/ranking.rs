//! Task ranking: HEFT upward rank and the PHEFT Optimistic Cost Table.
//!
//! Both passes walk the workflow in reverse topological order, so every
//! successor's entry exists before it is read and each task (or
//! task/machine pair) is computed exactly once. A cyclic workflow has no
//! topological order and is rejected before any rank is computed.

use crate::config::{RankStrategy, SchedulingConfig};
use crate::environment::Environment;
use crate::error::{Result, SchedulingError};
use crate::graph::Workflow;
use crate::log_debug;
use crate::models::{MachineId, TaskId, Time};

/// Result of a ranking pass.
#[derive(Clone, Debug)]
pub struct Ranking {
    pub strategy: RankStrategy,
    /// Rank per task, indexed by task ID.
    pub ranks: Vec<f64>,
    /// Present for `RankStrategy::Pheft`.
    pub oct: Option<OptimisticCostTable>,
}

/// Optimistic Cost Table: for each task and machine, a lower bound on the
/// remaining path length if the task runs on that machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimisticCostTable {
    machines: usize,
    /// Row-major `task * machines + machine`.
    values: Vec<Time>,
}

impl OptimisticCostTable {
    pub fn get(&self, task: TaskId, machine: MachineId) -> Time {
        self.values[task * self.machines + machine]
    }

    pub fn row(&self, task: TaskId) -> &[Time] {
        &self.values[task * self.machines..(task + 1) * self.machines]
    }

    /// Scalar rank used for ordering: the mean of the task's row.
    pub fn rank(&self, task: TaskId) -> f64 {
        if self.machines == 0 {
            return 0.0;
        }
        let total: Time = self.row(task).iter().sum();
        total as f64 / self.machines as f64
    }

    pub fn ranks(&self) -> Vec<f64> {
        (0..self.num_tasks()).map(|t| self.rank(t)).collect()
    }

    pub fn num_tasks(&self) -> usize {
        if self.machines == 0 {
            0
        } else {
            self.values.len() / self.machines
        }
    }

    pub fn num_machines(&self) -> usize {
        self.machines
    }
}

fn unranked_successor(task: TaskId, succ: TaskId) -> SchedulingError {
    SchedulingError::MalformedGraph(format!(
        "Successor {} of task {} was not ranked before its predecessor",
        succ, task
    ))
}

fn missing_runtime(task: TaskId, machine: MachineId) -> SchedulingError {
    SchedulingError::IncompleteAttributes(format!(
        "Task {} has no runtime on machine {}",
        task, machine
    ))
}

fn missing_data_size(source: TaskId, target: TaskId) -> SchedulingError {
    SchedulingError::IncompleteAttributes(format!(
        "Edge {} -> {} has no data size",
        source, target
    ))
}

/// Compute the HEFT upward rank of every task.
///
/// `rank(t) = avg_runtime(t) + max over successors s of (data_size(t, s) + rank(s))`,
/// with exit tasks ranked by their average runtime alone.
pub fn upward_ranks(workflow: &Workflow, env: &Environment) -> Result<Vec<f64>> {
    let machines = env.ids();
    let order = workflow.topological_order()?;
    let mut ranks: Vec<Option<f64>> = vec![None; workflow.len()];

    for &task in order.iter().rev() {
        let avg = workflow.tasks()[task]
            .average_runtime(&machines)
            .ok_or_else(|| {
                SchedulingError::IncompleteAttributes(format!(
                    "Task {} is missing a runtime for at least one machine",
                    task
                ))
            })?;

        let mut longest = 0.0_f64;
        for edge in workflow.out_edges(task) {
            let succ_rank = ranks[edge.target].ok_or_else(|| unranked_successor(task, edge.target))?;
            let comm = edge
                .data_size
                .ok_or_else(|| missing_data_size(task, edge.target))?;
            longest = longest.max(comm as f64 + succ_rank);
        }

        ranks[task] = Some(avg + longest);
    }

    ranks
        .into_iter()
        .enumerate()
        .map(|(task, rank)| {
            rank.ok_or_else(|| {
                SchedulingError::MalformedGraph(format!("Task {} was never ranked", task))
            })
        })
        .collect()
}

/// Build the Optimistic Cost Table.
///
/// Exit tasks have an all-zero row. Otherwise, for machine `pk`:
/// `OCT[t, pk] = max over successors s of min over machines m of
/// (OCT[s, m] + runtime(s, m) + (data_size(t, s) if m != pk else 0))`.
pub fn optimistic_cost_table(workflow: &Workflow, env: &Environment) -> Result<OptimisticCostTable> {
    let machines = env.len();
    let order = workflow.topological_order()?;
    let mut values: Vec<Option<Time>> = vec![None; workflow.len() * machines];

    for &task in order.iter().rev() {
        for pk in 0..machines {
            let mut max_successor: Time = 0;

            for edge in workflow.out_edges(task) {
                let succ = edge.target;
                let comm = edge.data_size.ok_or_else(|| missing_data_size(task, succ))?;
                let succ_task = &workflow.tasks()[succ];

                let mut min_machine: Option<Time> = None;
                for machine in 0..machines {
                    let succ_oct = values[succ * machines + machine]
                        .ok_or_else(|| unranked_successor(task, succ))?;
                    let runtime = succ_task
                        .runtime_on(machine)
                        .ok_or_else(|| missing_runtime(succ, machine))?;
                    let transfer = if machine != pk { comm } else { 0 };
                    let cost = succ_oct + runtime + transfer;
                    min_machine = Some(min_machine.map_or(cost, |m| m.min(cost)));
                }

                max_successor = max_successor.max(min_machine.unwrap_or(0));
            }

            values[task * machines + pk] = Some(max_successor);
        }
    }

    let values = values
        .into_iter()
        .collect::<Option<Vec<Time>>>()
        .ok_or_else(|| SchedulingError::MalformedGraph("OCT left incomplete".to_string()))?;

    Ok(OptimisticCostTable { machines, values })
}

/// Rank every task with the given strategy and default (silent) config.
pub fn rank(workflow: &mut Workflow, env: &Environment, strategy: RankStrategy) -> Result<Ranking> {
    rank_with_config(workflow, env, &SchedulingConfig::new(strategy))
}

/// Rank every task and store the result on the tasks.
///
/// Any previous ranks and placements are cleared first. On error no task
/// carries a rank.
pub fn rank_with_config(
    workflow: &mut Workflow,
    env: &Environment,
    config: &SchedulingConfig,
) -> Result<Ranking> {
    workflow.reset();

    if env.is_empty() && !workflow.is_empty() {
        return Err(SchedulingError::InvalidConfig(
            "Cannot rank tasks against an empty machine set".to_string(),
        ));
    }
    env.validate(workflow)?;

    let (ranks, oct) = match config.strategy {
        RankStrategy::Heft => (upward_ranks(workflow, env)?, None),
        RankStrategy::Pheft => {
            let table = optimistic_cost_table(workflow, env)?;
            (table.ranks(), Some(table))
        }
    };

    for (task, &value) in workflow.tasks_mut().iter_mut().zip(ranks.iter()) {
        task.rank = Some(value);
        log_debug!(config.verbosity, "  rank[{}] = {:.3}", task.id, value);
    }
    if let Some(table) = &oct {
        for task in 0..table.num_tasks() {
            log_debug!(config.verbosity, "  oct[{}] = {:?}", task, table.row(task));
        }
    }

    Ok(Ranking {
        strategy: config.strategy,
        ranks,
        oct,
    })
}
