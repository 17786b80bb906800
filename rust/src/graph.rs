//! Workflow graph: an arena of tasks plus adjacency lists of data edges.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::error::{Result, SchedulingError};
use crate::models::{Edge, MachineId, Task, TaskId, Time};

/// A workflow DAG.
///
/// Tasks live in an arena indexed by `TaskId`; edges are stored once and
/// referenced by index from per-task successor and predecessor lists.
#[derive(Clone, Debug, Default)]
pub struct Workflow {
    tasks: Vec<Task>,
    edges: Vec<Edge>,
    /// Outgoing edge indices per task, in insertion order.
    outgoing: Vec<Vec<usize>>,
    /// Incoming edge indices per task, in insertion order.
    incoming: Vec<Vec<usize>>,
    edge_lookup: FxHashMap<(TaskId, TaskId), usize>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(tasks: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(tasks),
            edges: Vec::new(),
            outgoing: Vec::with_capacity(tasks),
            incoming: Vec::with_capacity(tasks),
            edge_lookup: FxHashMap::default(),
        }
    }

    /// Add a task with no runtimes yet.
    pub fn add_task(&mut self) -> TaskId {
        let id = self.tasks.len();
        self.tasks.push(Task::new(id));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Add a task whose runtimes are given in machine order.
    pub fn add_task_with_runtimes(&mut self, runtimes: &[Time]) -> TaskId {
        let id = self.add_task();
        self.tasks[id].runtime_on = runtimes.iter().copied().enumerate().collect();
        id
    }

    /// Add a task described by its work demand; see `Environment::apply_runtimes`.
    pub fn add_task_with_demand(&mut self, demand: f64) -> TaskId {
        let id = self.add_task();
        self.tasks[id].demand = Some(demand);
        id
    }

    pub fn set_runtime(&mut self, task: TaskId, machine: MachineId, runtime: Time) -> Result<()> {
        let task = self
            .tasks
            .get_mut(task)
            .ok_or_else(|| SchedulingError::MalformedGraph(format!("Unknown task {}", task)))?;
        task.runtime_on.insert(machine, runtime);
        Ok(())
    }

    /// Add a data edge whose size is used as the communication cost.
    pub fn add_edge(&mut self, source: TaskId, target: TaskId, data_size: Time) -> Result<()> {
        self.insert_edge(source, target, Some(data_size))
    }

    /// Add a precedence-only edge with no known data size.
    ///
    /// Such a workflow can be built and inspected, but ranking and scheduling
    /// reject it with `IncompleteAttributes`.
    pub fn add_dependency(&mut self, source: TaskId, target: TaskId) -> Result<()> {
        self.insert_edge(source, target, None)
    }

    fn insert_edge(&mut self, source: TaskId, target: TaskId, data_size: Option<Time>) -> Result<()> {
        for endpoint in [source, target] {
            if endpoint >= self.tasks.len() {
                return Err(SchedulingError::MalformedGraph(format!(
                    "Edge {} -> {} references unknown task {}",
                    source, target, endpoint
                )));
            }
        }
        if source == target {
            return Err(SchedulingError::MalformedGraph(format!(
                "Self-loop on task {}",
                source
            )));
        }
        if self.edge_lookup.contains_key(&(source, target)) {
            return Err(SchedulingError::MalformedGraph(format!(
                "Duplicate edge {} -> {}",
                source, target
            )));
        }

        let index = self.edges.len();
        self.edges.push(Edge {
            source,
            target,
            data_size,
        });
        self.outgoing[source].push(index);
        self.incoming[target].push(index);
        self.edge_lookup.insert((source, target), index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, source: TaskId, target: TaskId) -> Option<&Edge> {
        self.edge_lookup.get(&(source, target)).map(|&i| &self.edges[i])
    }

    /// Outgoing edges of `task`, in insertion order.
    pub fn out_edges(&self, task: TaskId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(task)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Incoming edges of `task`, in insertion order.
    pub fn in_edges(&self, task: TaskId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(task)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    pub fn successors(&self, task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.out_edges(task).map(|e| e.target)
    }

    pub fn predecessors(&self, task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.in_edges(task).map(|e| e.source)
    }

    /// Tasks without predecessors, ascending.
    pub fn entry_tasks(&self) -> Vec<TaskId> {
        (0..self.len()).filter(|&t| self.incoming[t].is_empty()).collect()
    }

    /// Tasks without successors, ascending.
    pub fn exit_tasks(&self) -> Vec<TaskId> {
        (0..self.len()).filter(|&t| self.outgoing[t].is_empty()).collect()
    }

    /// Communication cost of the edge `source -> target`.
    pub fn communication_cost(&self, source: TaskId, target: TaskId) -> Result<Time> {
        let edge = self.edge(source, target).ok_or_else(|| {
            SchedulingError::MalformedGraph(format!("No edge {} -> {}", source, target))
        })?;
        edge.data_size.ok_or_else(|| {
            SchedulingError::IncompleteAttributes(format!(
                "Edge {} -> {} has no data size",
                source, target
            ))
        })
    }

    /// Topological order using Kahn's algorithm.
    ///
    /// Entry tasks are seeded in ascending ID order, so the result is
    /// deterministic. Fails with `MalformedGraph` if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        let mut in_degree: Vec<usize> = self.incoming.iter().map(|e| e.len()).collect();

        let mut queue: VecDeque<TaskId> = (0..self.len()).filter(|&t| in_degree[t] == 0).collect();
        let mut order: Vec<TaskId> = Vec::with_capacity(self.len());

        while let Some(task) = queue.pop_front() {
            order.push(task);
            for succ in self.successors(task) {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    queue.push_back(succ);
                }
            }
        }

        if order.len() != self.len() {
            // Any task still holding in-degree sits on or behind a cycle
            let stuck = in_degree.iter().position(|&d| d > 0).unwrap_or_default();
            return Err(SchedulingError::MalformedGraph(format!(
                "Cycle detected: {} of {} tasks unreachable in topological order (first: task {})",
                self.len() - order.len(),
                self.len(),
                stuck
            )));
        }

        Ok(order)
    }

    /// Snapshot of every task's rank.
    pub fn ranks(&self) -> Vec<Option<f64>> {
        self.tasks.iter().map(|t| t.rank).collect()
    }

    /// Forget ranks and placements so the workflow can be run again.
    pub fn reset(&mut self) {
        for task in &mut self.tasks {
            task.rank = None;
            task.allocation = None;
        }
    }

    /// Forget placements, keeping ranks.
    pub fn clear_allocations(&mut self) {
        for task in &mut self.tasks {
            task.allocation = None;
        }
    }
}
