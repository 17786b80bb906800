//! PyO3 bindings exposing the scheduler to the shadow Python tooling.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::SchedulingConfig;
use crate::environment::Environment;
use crate::error::SchedulingError;
use crate::graph::Workflow;
use crate::models::{Allocation, MachineId, TaskId, Time};
use crate::ranking;
use crate::scheduler::{rank_and_schedule, ListScheduler, Solution};

fn to_py_err(err: SchedulingError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A workflow DAG under construction.
#[pyclass(name = "Workflow")]
#[derive(Clone, Debug, Default)]
pub struct PyWorkflow {
    inner: Workflow,
}

#[pymethods]
impl PyWorkflow {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Add a task with runtimes given in machine order; returns its ID.
    fn add_task(&mut self, runtimes: Vec<Time>) -> TaskId {
        self.inner.add_task_with_runtimes(&runtimes)
    }

    fn add_task_with_demand(&mut self, demand: f64) -> TaskId {
        self.inner.add_task_with_demand(demand)
    }

    #[pyo3(signature = (source, target, data_size=None))]
    fn add_edge(&mut self, source: TaskId, target: TaskId, data_size: Option<Time>) -> PyResult<()> {
        match data_size {
            Some(size) => self.inner.add_edge(source, target, size),
            None => self.inner.add_dependency(source, target),
        }
        .map_err(to_py_err)
    }

    fn ranks(&self) -> Vec<Option<f64>> {
        self.inner.ranks()
    }

    fn topological_order(&self) -> PyResult<Vec<TaskId>> {
        self.inner.topological_order().map_err(to_py_err)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Workflow(tasks={}, edges={})",
            self.inner.len(),
            self.inner.edges().len()
        )
    }
}

/// The ordered machine set.
#[pyclass(name = "Environment")]
#[derive(Clone, Debug, Default)]
pub struct PyEnvironment {
    inner: Environment,
}

#[pymethods]
impl PyEnvironment {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    #[pyo3(signature = (name, flops=None))]
    fn add_machine(&mut self, name: &str, flops: Option<f64>) -> PyResult<MachineId> {
        self.inner.add_machine(name, flops).map_err(to_py_err)
    }

    /// Derive runtimes for tasks created with a demand.
    fn apply_runtimes(&self, mut workflow: PyRefMut<'_, PyWorkflow>) -> PyResult<()> {
        self.inner
            .apply_runtimes(&mut workflow.inner)
            .map_err(to_py_err)
    }

    fn machine_names(&self) -> Vec<String> {
        self.inner.machines().iter().map(|m| m.name.clone()).collect()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("Environment(machines={:?})", self.machine_names())
    }
}

/// A task placed on a machine over `[start, finish)`.
#[pyclass(name = "Allocation")]
#[derive(Clone, Debug)]
pub struct PyAllocation {
    #[pyo3(get)]
    pub task: TaskId,
    #[pyo3(get)]
    pub machine: String,
    #[pyo3(get)]
    pub machine_id: MachineId,
    #[pyo3(get)]
    pub start: Time,
    #[pyo3(get)]
    pub finish: Time,
}

#[pymethods]
impl PyAllocation {
    fn __repr__(&self) -> String {
        format!(
            "Allocation(task={}, machine={:?}, start={}, finish={})",
            self.task, self.machine, self.start, self.finish
        )
    }
}

/// A finished schedule.
#[pyclass(name = "Solution")]
#[derive(Clone, Debug)]
pub struct PySolution {
    inner: Solution,
    machine_names: Vec<String>,
}

impl PySolution {
    fn new(inner: Solution, env: &Environment) -> Self {
        let machine_names = env.machines().iter().map(|m| m.name.clone()).collect();
        Self {
            inner,
            machine_names,
        }
    }

    fn wrap(&self, allocation: &Allocation) -> PyAllocation {
        PyAllocation {
            task: allocation.task,
            machine: self
                .machine_names
                .get(allocation.machine)
                .cloned()
                .unwrap_or_default(),
            machine_id: allocation.machine,
            start: allocation.start,
            finish: allocation.finish,
        }
    }
}

#[pymethods]
impl PySolution {
    #[getter]
    fn makespan(&self) -> Time {
        self.inner.makespan()
    }

    /// Allocations on the named machine in start-time order.
    fn allocations_for(&self, machine: &str) -> PyResult<Vec<PyAllocation>> {
        let id = self
            .machine_names
            .iter()
            .position(|n| n == machine)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown machine: {}", machine)))?;
        Ok(self
            .inner
            .allocations_for(id)
            .iter()
            .map(|a| self.wrap(a))
            .collect())
    }

    /// All allocations in commit order.
    fn allocations(&self) -> Vec<PyAllocation> {
        self.inner.allocations().map(|a| self.wrap(a)).collect()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Solution(tasks={}, machines={}, makespan={})",
            self.inner.len(),
            self.inner.machine_count(),
            self.inner.makespan()
        )
    }
}

/// Rank every task; returns the ranks indexed by task ID.
///
/// `strategy` is "heft"/"up" for upward rank or "pheft"/"oct" for OCT rank.
#[pyfunction]
#[pyo3(signature = (workflow, environment, strategy="heft"))]
fn rank(
    mut workflow: PyRefMut<'_, PyWorkflow>,
    environment: PyRef<'_, PyEnvironment>,
    strategy: &str,
) -> PyResult<Vec<f64>> {
    let config = SchedulingConfig::from_strategy_name(strategy).map_err(to_py_err)?;
    let ranking = ranking::rank_with_config(&mut workflow.inner, &environment.inner, &config)
        .map_err(to_py_err)?;
    Ok(ranking.ranks)
}

/// Schedule an already-ranked workflow.
#[pyfunction]
#[pyo3(signature = (workflow, environment, strategy="heft", verbosity=0))]
fn schedule(
    mut workflow: PyRefMut<'_, PyWorkflow>,
    environment: PyRef<'_, PyEnvironment>,
    strategy: &str,
    verbosity: u8,
) -> PyResult<PySolution> {
    let config = SchedulingConfig::from_strategy_name(strategy)
        .map_err(to_py_err)?
        .with_verbosity(verbosity);
    let solution = ListScheduler::new(config)
        .schedule(&mut workflow.inner, &environment.inner)
        .map_err(to_py_err)?;
    Ok(PySolution::new(solution, &environment.inner))
}

fn run(
    workflow: &mut PyWorkflow,
    environment: &PyEnvironment,
    strategy: &str,
    verbosity: u8,
) -> PyResult<PySolution> {
    let config = SchedulingConfig::from_strategy_name(strategy)
        .map_err(to_py_err)?
        .with_verbosity(verbosity);
    let solution =
        rank_and_schedule(&mut workflow.inner, &environment.inner, &config).map_err(to_py_err)?;
    Ok(PySolution::new(solution, &environment.inner))
}

/// Rank by upward rank and schedule by earliest finish time.
#[pyfunction]
#[pyo3(signature = (workflow, environment, verbosity=0))]
fn heft(
    mut workflow: PyRefMut<'_, PyWorkflow>,
    environment: PyRef<'_, PyEnvironment>,
    verbosity: u8,
) -> PyResult<PySolution> {
    run(&mut workflow, &environment, "heft", verbosity)
}

/// Rank by OCT and schedule by earliest finish time plus OCT.
#[pyfunction]
#[pyo3(signature = (workflow, environment, verbosity=0))]
fn pheft(
    mut workflow: PyRefMut<'_, PyWorkflow>,
    environment: PyRef<'_, PyEnvironment>,
    verbosity: u8,
) -> PyResult<PySolution> {
    run(&mut workflow, &environment, "pheft", verbosity)
}

/// The shadow.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data types
    m.add_class::<PyWorkflow>()?;
    m.add_class::<PyEnvironment>()?;
    m.add_class::<PyAllocation>()?;
    m.add_class::<PySolution>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(rank, m)?)?;
    m.add_function(wrap_pyfunction!(schedule, m)?)?;
    m.add_function(wrap_pyfunction!(heft, m)?)?;
    m.add_function(wrap_pyfunction!(pheft, m)?)?;

    Ok(())
}
