//! List scheduler: HEFT and PHEFT machine selection with insertion.

use crate::config::{RankStrategy, SchedulingConfig};
use crate::environment::Environment;
use crate::error::{Result, SchedulingError};
use crate::graph::Workflow;
use crate::models::{MachineId, TaskId, Time};
use crate::ranking::{optimistic_cost_table, rank_with_config, OptimisticCostTable};
use crate::sorting::{priority_order, ReadyList};
use crate::{log_changes, log_checks, log_debug};

use super::solution::Solution;

/// One machine evaluated as a home for a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub machine: MachineId,
    pub start: Time,
    pub finish: Time,
    /// EFT for HEFT, EFT plus the task's OCT entry for PHEFT. Lower wins.
    pub score: Time,
}

/// Insertion-based list scheduler.
///
/// Tasks are taken in rank order; each goes to the machine with the lowest
/// score, first machine in iteration order on ties. Nothing is revisited
/// once committed.
pub struct ListScheduler {
    config: SchedulingConfig,
}

impl ListScheduler {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Schedule a ranked workflow.
    ///
    /// Existing placements are discarded first. On error every task is
    /// left without an allocation.
    pub fn schedule(&self, workflow: &mut Workflow, env: &Environment) -> Result<Solution> {
        let result = self.schedule_inner(workflow, env);
        if result.is_err() {
            workflow.clear_allocations();
        }
        result
    }

    fn schedule_inner(&self, workflow: &mut Workflow, env: &Environment) -> Result<Solution> {
        let verbosity = self.config.verbosity;

        if env.is_empty() && !workflow.is_empty() {
            return Err(SchedulingError::InvalidConfig(
                "Cannot schedule tasks onto an empty machine set".to_string(),
            ));
        }
        env.validate(workflow)?;
        workflow.clear_allocations();

        let order = priority_order(workflow)?;
        let oct = match self.config.strategy {
            RankStrategy::Heft => None,
            RankStrategy::Pheft => Some(optimistic_cost_table(workflow, env)?),
        };

        log_changes!(
            verbosity,
            "Scheduling {} tasks on {} machines ({})",
            workflow.len(),
            env.len(),
            self.config.strategy
        );

        let mut solution = Solution::new(env.len());
        let mut ready = ReadyList::new(workflow, order);

        while let Some(task) = ready.pop_ready() {
            log_checks!(
                verbosity,
                "  Considering task {} (rank={:.3})",
                task,
                workflow.task(task).and_then(|t| t.rank).unwrap_or_default()
            );

            let mut best: Option<Candidate> = None;
            for machine in 0..env.len() {
                let candidate = self.evaluate(workflow, &solution, oct.as_ref(), task, machine)?;
                log_checks!(
                    verbosity,
                    "    {}: EST={} EFT={} score={}",
                    env.name_of(machine).unwrap_or("?"),
                    candidate.start,
                    candidate.finish,
                    candidate.score
                );
                if best.map_or(true, |b| candidate.score < b.score) {
                    best = Some(candidate);
                }
            }

            let chosen = best.ok_or_else(|| {
                SchedulingError::InvalidConfig(format!("No machine available for task {}", task))
            })?;
            let allocation =
                solution.add_allocation(task, chosen.machine, chosen.start, chosen.finish)?;
            if let Some(t) = workflow.task_mut(task) {
                t.allocation = Some(allocation);
            }
            ready.mark_committed(workflow, task);

            log_changes!(
                verbosity,
                "  Scheduled task {} on {} from {} to {}",
                task,
                env.name_of(chosen.machine).unwrap_or("?"),
                chosen.start,
                chosen.finish
            );
        }

        if !ready.is_empty() {
            return Err(SchedulingError::MalformedGraph(format!(
                "{} tasks never became ready",
                ready.remaining()
            )));
        }

        log_changes!(verbosity, "Makespan: {}", solution.makespan());
        Ok(solution)
    }

    /// Earliest placement of `task` on `machine` given the partial schedule.
    pub fn evaluate(
        &self,
        workflow: &Workflow,
        solution: &Solution,
        oct: Option<&OptimisticCostTable>,
        task: TaskId,
        machine: MachineId,
    ) -> Result<Candidate> {
        let duration = workflow
            .task(task)
            .and_then(|t| t.runtime_on(machine))
            .ok_or_else(|| {
                SchedulingError::IncompleteAttributes(format!(
                    "Task {} has no runtime on machine {}",
                    task, machine
                ))
            })?;

        let ready_time = ready_time(workflow, task, machine)?;
        let timeline = solution.timeline(machine).ok_or_else(|| {
            SchedulingError::InvalidConfig(format!("Unknown machine {}", machine))
        })?;
        let start = timeline.earliest_start(ready_time, duration);
        let finish = start + duration;

        log_debug!(
            self.config.verbosity,
            "      task {} on {}: ready={} gaps={:?} -> start={}",
            task,
            machine,
            ready_time,
            timeline.gaps(),
            start
        );

        let score = match oct {
            Some(table) => finish + table.get(task, machine),
            None => finish,
        };

        Ok(Candidate {
            machine,
            start,
            finish,
            score,
        })
    }
}

/// Time at which every input of `task` is available on `machine`.
///
/// Communication cost is paid only for predecessors on other machines.
fn ready_time(workflow: &Workflow, task: TaskId, machine: MachineId) -> Result<Time> {
    let mut ready: Time = 0;
    for edge in workflow.in_edges(task) {
        let placed = workflow
            .task(edge.source)
            .and_then(|p| p.allocation)
            .ok_or_else(|| {
                SchedulingError::PreconditionViolated(format!(
                    "Predecessor {} of task {} is not scheduled",
                    edge.source, task
                ))
            })?;
        let comm = if placed.machine == machine {
            0
        } else {
            workflow.communication_cost(edge.source, task)?
        };
        ready = ready.max(placed.finish + comm);
    }
    Ok(ready)
}

/// Schedule an already-ranked workflow with the given strategy.
pub fn schedule(workflow: &mut Workflow, env: &Environment, strategy: RankStrategy) -> Result<Solution> {
    ListScheduler::new(SchedulingConfig::new(strategy)).schedule(workflow, env)
}

/// Rank with the configured strategy, then schedule with it.
pub fn rank_and_schedule(
    workflow: &mut Workflow,
    env: &Environment,
    config: &SchedulingConfig,
) -> Result<Solution> {
    rank_with_config(workflow, env, config)?;
    ListScheduler::new(config.clone()).schedule(workflow, env)
}

/// Upward-rank ordering with EFT machine selection.
pub fn heft(workflow: &mut Workflow, env: &Environment) -> Result<Solution> {
    rank_and_schedule(workflow, env, &SchedulingConfig::new(RankStrategy::Heft))
}

/// OCT-rank ordering with EFT + OCT machine selection.
pub fn pheft(workflow: &mut Workflow, env: &Environment) -> Result<Solution> {
    rank_and_schedule(workflow, env, &SchedulingConfig::new(RankStrategy::Pheft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank;
    use crate::test_fixtures::{arabnejad_barbosa, random_workflow, topcuoglu};

    fn placements(wf: &Workflow) -> (Vec<MachineId>, Vec<Time>, Vec<Time>) {
        let machines = wf.tasks().iter().map(|t| t.assigned_machine().unwrap()).collect();
        let starts = wf.tasks().iter().map(|t| t.start_time().unwrap()).collect();
        let finishes = wf.tasks().iter().map(|t| t.finish_time().unwrap()).collect();
        (machines, starts, finishes)
    }

    fn assert_valid_schedule(wf: &Workflow, solution: &Solution) {
        assert_eq!(solution.len(), wf.len());

        for timeline in solution.timelines() {
            for pair in timeline.allocations().windows(2) {
                assert!(pair[0].finish <= pair[1].start, "overlap: {:?}", pair);
            }
        }

        for edge in wf.edges() {
            let p = wf.task(edge.source).unwrap().allocation.unwrap();
            let s = wf.task(edge.target).unwrap().allocation.unwrap();
            let comm = if p.machine == s.machine {
                0
            } else {
                edge.data_size.unwrap()
            };
            assert!(
                p.finish + comm <= s.start,
                "edge {} -> {} violated",
                edge.source,
                edge.target
            );
        }

        let max_finish = wf.tasks().iter().filter_map(|t| t.finish_time()).max().unwrap_or(0);
        assert_eq!(solution.makespan(), max_finish);

        for task in wf.tasks() {
            assert_eq!(solution.allocation_of(task.id), task.allocation.as_ref());
        }
    }

    #[test]
    fn test_topcuoglu_heft() {
        let (mut wf, env) = topcuoglu();
        let solution = heft(&mut wf, &env).unwrap();

        assert_eq!(solution.makespan(), 80);
        assert_eq!(solution.commit_order(), &[0, 3, 2, 1, 4, 5, 8, 6, 7, 9]);
        let (machines, starts, finishes) = placements(&wf);
        assert_eq!(machines, vec![2, 0, 2, 1, 2, 1, 2, 0, 1, 1]);
        assert_eq!(starts, vec![0, 27, 9, 18, 28, 26, 38, 57, 56, 73]);
        assert_eq!(finishes, vec![9, 40, 28, 26, 38, 42, 49, 62, 68, 80]);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_arabnejad_barbosa_heft() {
        let (mut wf, env) = arabnejad_barbosa();
        let solution = heft(&mut wf, &env).unwrap();

        assert_eq!(solution.makespan(), 133);
        let (machines, starts, finishes) = placements(&wf);
        assert_eq!(machines, vec![1, 0, 1, 2, 1, 2, 1, 0, 2, 0]);
        assert_eq!(starts, vec![0, 38, 48, 52, 21, 28, 75, 67, 105, 120]);
        assert_eq!(finishes, vec![21, 60, 75, 56, 48, 52, 100, 96, 113, 133]);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_arabnejad_barbosa_pheft() {
        let (mut wf, env) = arabnejad_barbosa();
        let solution = pheft(&mut wf, &env).unwrap();

        assert_eq!(solution.makespan(), 122);
        assert_eq!(solution.commit_order(), &[0, 3, 5, 1, 2, 4, 7, 6, 8, 9]);
        let (machines, starts, finishes) = placements(&wf);
        assert_eq!(machines, vec![0, 0, 0, 0, 2, 1, 0, 1, 2, 1]);
        assert_eq!(starts, vec![0, 29, 51, 22, 35, 29, 83, 54, 81, 106]);
        assert_eq!(finishes, vec![22, 51, 83, 29, 70, 46, 97, 77, 89, 122]);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_topcuoglu_pheft() {
        let (mut wf, env) = topcuoglu();
        let solution = pheft(&mut wf, &env).unwrap();
        assert_eq!(solution.makespan(), 85);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_first_task_heft_takes_fastest_machine() {
        let (mut wf, env) = topcuoglu();
        heft(&mut wf, &env).unwrap();
        // Runtimes of task 0 are [14, 16, 9]
        let first = wf.task(0).unwrap().allocation.unwrap();
        assert_eq!((first.machine, first.start, first.finish), (2, 0, 9));
    }

    #[test]
    fn test_first_task_pheft_minimises_runtime_plus_oct() {
        let (mut wf, env) = arabnejad_barbosa();
        let ranking = rank(&mut wf, &env, RankStrategy::Pheft).unwrap();
        let table = ranking.oct.unwrap();
        let scores: Vec<Time> = (0..env.len())
            .map(|m| wf.task(0).unwrap().runtime_on(m).unwrap() + table.get(0, m))
            .collect();
        assert_eq!(scores, vec![86, 89, 122]);

        schedule(&mut wf, &env, RankStrategy::Pheft).unwrap();
        let first = wf.task(0).unwrap().allocation.unwrap();
        assert_eq!((first.machine, first.start, first.finish), (0, 0, 22));
    }

    #[test]
    fn test_machine_ties_go_to_first_machine() {
        let env = Environment::from_names(["a", "b", "c"]).unwrap();
        let mut wf = Workflow::new();
        wf.add_task_with_runtimes(&[7, 5, 5]);
        heft(&mut wf, &env).unwrap();
        assert_eq!(wf.task(0).unwrap().assigned_machine(), Some(1));
    }

    #[test]
    fn test_gap_reuse() {
        let env = Environment::from_names(["m0", "m1"]).unwrap();
        let mut wf = Workflow::new();
        let a = wf.add_task_with_runtimes(&[1, 50]);
        let b = wf.add_task_with_runtimes(&[50, 5]);
        let c = wf.add_task_with_runtimes(&[20, 4]);
        let d = wf.add_task_with_runtimes(&[10, 6]);
        wf.add_edge(a, b, 20).unwrap();

        let solution = heft(&mut wf, &env).unwrap();

        // b waits for a's data on m1, leaving [0, 21) idle; c and d fill it
        assert_eq!(solution.commit_order(), &[a, b, c, d]);
        let on_m1: Vec<(TaskId, Time, Time)> = solution
            .allocations_for(1)
            .iter()
            .map(|x| (x.task, x.start, x.finish))
            .collect();
        assert_eq!(on_m1, vec![(c, 0, 4), (d, 4, 10), (b, 21, 26)]);
        assert_eq!(solution.makespan(), 26);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_zero_cost_chain_respects_precedence() {
        // Equal ranks would put task 0 first; it depends on task 1
        let env = Environment::from_names(["m0", "m1"]).unwrap();
        let mut wf = Workflow::new();
        wf.add_task_with_runtimes(&[0, 0]);
        wf.add_task_with_runtimes(&[0, 0]);
        wf.add_edge(1, 0, 0).unwrap();

        let solution = heft(&mut wf, &env).unwrap();
        assert_eq!(solution.commit_order(), &[1, 0]);
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_schedule_before_rank() {
        let (mut wf, env) = topcuoglu();
        let err = schedule(&mut wf, &env, RankStrategy::Heft).unwrap_err();
        assert!(matches!(err, SchedulingError::PreconditionViolated(_)));
        assert!(wf.tasks().iter().all(|t| t.allocation.is_none()));
    }

    #[test]
    fn test_failed_run_clears_previous_allocations() {
        let (mut wf, env) = topcuoglu();
        heft(&mut wf, &env).unwrap();
        assert!(wf.task(9).unwrap().allocation.is_some());

        wf.task_mut(4).unwrap().rank = None;
        assert!(schedule(&mut wf, &env, RankStrategy::Heft).is_err());
        assert!(wf.tasks().iter().all(|t| t.allocation.is_none()));
    }

    #[test]
    fn test_missing_runtime_rejected() {
        let (mut wf, env) = topcuoglu();
        rank(&mut wf, &env, RankStrategy::Heft).unwrap();
        let mut bigger = env.clone();
        bigger.add_machine("p4", None).unwrap();
        let err = schedule(&mut wf, &bigger, RankStrategy::Heft).unwrap_err();
        assert!(matches!(err, SchedulingError::IncompleteAttributes(_)));
    }

    #[test]
    fn test_missing_data_size_rejected() {
        let env = Environment::from_names(["m0"]).unwrap();
        let mut wf = Workflow::new();
        wf.add_task_with_runtimes(&[1]);
        wf.add_task_with_runtimes(&[1]);
        wf.add_dependency(0, 1).unwrap();
        let err = heft(&mut wf, &env).unwrap_err();
        assert!(matches!(err, SchedulingError::IncompleteAttributes(_)));
    }

    #[test]
    fn test_empty_workflow() {
        let env = Environment::from_names(["m0"]).unwrap();
        let mut wf = Workflow::new();
        let solution = heft(&mut wf, &env).unwrap();
        assert!(solution.is_empty());
        assert_eq!(solution.makespan(), 0);
    }

    #[test]
    fn test_empty_environment_rejected() {
        let (mut wf, _) = topcuoglu();
        let env = Environment::new();
        assert!(matches!(
            heft(&mut wf, &env),
            Err(SchedulingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_heft_ranks_pheft_selection() {
        // Any complete ranking can drive either selection rule
        let (mut wf, env) = topcuoglu();
        rank(&mut wf, &env, RankStrategy::Heft).unwrap();
        let solution = schedule(&mut wf, &env, RankStrategy::Pheft).unwrap();
        assert_valid_schedule(&wf, &solution);
    }

    #[test]
    fn test_random_workflows_are_valid() {
        for seed in 0..25 {
            for strategy in [RankStrategy::Heft, RankStrategy::Pheft] {
                let (mut wf, env) = random_workflow(seed, 40, 2 + (seed as usize % 3));
                let config = SchedulingConfig::new(strategy);
                let solution = rank_and_schedule(&mut wf, &env, &config).unwrap();
                assert_valid_schedule(&wf, &solution);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        for strategy in [RankStrategy::Heft, RankStrategy::Pheft] {
            let (mut wf, env) = random_workflow(7, 60, 4);
            let config = SchedulingConfig::new(strategy);
            let first = rank_and_schedule(&mut wf, &env, &config).unwrap();
            let first_ranks = wf.ranks();
            let first_allocs: Vec<_> = first.allocations().copied().collect();

            let second = rank_and_schedule(&mut wf, &env, &config).unwrap();
            let second_allocs: Vec<_> = second.allocations().copied().collect();

            assert_eq!(wf.ranks(), first_ranks);
            assert_eq!(first_allocs, second_allocs);
            assert_eq!(first.makespan(), second.makespan());
        }
    }

    #[test]
    fn test_verbose_run_matches_silent_run() {
        let (mut wf, env) = topcuoglu();
        let config = SchedulingConfig::new(RankStrategy::Heft).with_verbosity(3);
        let solution = rank_and_schedule(&mut wf, &env, &config).unwrap();
        assert_eq!(solution.makespan(), 80);
    }
}
