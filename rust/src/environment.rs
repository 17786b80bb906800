//! Machine model: the ordered set of machines a workflow is scheduled onto.

use crate::error::{Result, SchedulingError};
use crate::graph::Workflow;
use crate::interner::NameInterner;
use crate::models::{Machine, MachineId, Time};

/// The schedulable resource set.
///
/// Machine order is the insertion order; it is the iteration order used for
/// every tie-break in ranking and machine selection.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    machines: Vec<Machine>,
    names: NameInterner,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an environment of machines with no declared throughput.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        for name in names {
            env.add_machine(name.as_ref(), None)?;
        }
        Ok(env)
    }

    /// Add a machine. Names must be unique; throughput, if given, positive.
    pub fn add_machine(&mut self, name: &str, flops: Option<f64>) -> Result<MachineId> {
        if let Some(f) = flops {
            if !(f.is_finite() && f > 0.0) {
                return Err(SchedulingError::InvalidConfig(format!(
                    "Machine {} has non-positive throughput {}",
                    name, f
                )));
            }
        }
        let (id, is_new) = self.names.intern(name);
        if !is_new {
            return Err(SchedulingError::InvalidConfig(format!(
                "Duplicate machine name: {}",
                name
            )));
        }
        self.machines.push(Machine {
            id,
            name: name.to_string(),
            flops,
        });
        Ok(id)
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Machine IDs in iteration order.
    pub fn ids(&self) -> Vec<MachineId> {
        (0..self.machines.len()).collect()
    }

    pub fn lookup(&self, name: &str) -> Option<MachineId> {
        self.names.get(name)
    }

    pub fn name_of(&self, id: MachineId) -> Option<&str> {
        self.names.resolve(id)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Runtime of `demand` work units on `machine`, rounded half to even.
    pub fn runtime_for(&self, machine: MachineId, demand: f64) -> Result<Time> {
        let m = self.machine(machine).ok_or_else(|| {
            SchedulingError::InvalidConfig(format!("Unknown machine {}", machine))
        })?;
        let flops = m.flops.ok_or_else(|| {
            SchedulingError::IncompleteAttributes(format!(
                "Machine {} has no throughput to derive runtimes from",
                m.name
            ))
        })?;
        if !(demand.is_finite() && demand >= 0.0) {
            return Err(SchedulingError::IncompleteAttributes(format!(
                "Invalid demand {} for machine {}",
                demand, m.name
            )));
        }
        Ok((demand / flops).round_ties_even() as Time)
    }

    /// Fill `runtime_on` for every task that carries a demand.
    ///
    /// Tasks without a demand keep whatever runtimes were set explicitly.
    pub fn apply_runtimes(&self, workflow: &mut Workflow) -> Result<()> {
        for task in workflow.tasks_mut() {
            let Some(demand) = task.demand else {
                continue;
            };
            for machine in 0..self.machines.len() {
                let runtime = self.runtime_for(machine, demand)?;
                task.runtime_on.insert(machine, runtime);
            }
        }
        Ok(())
    }

    /// Check that every task has a runtime on every machine and every edge
    /// has a data size.
    pub fn validate(&self, workflow: &Workflow) -> Result<()> {
        for task in workflow.tasks() {
            for machine in &self.machines {
                if task.runtime_on(machine.id).is_none() {
                    return Err(SchedulingError::IncompleteAttributes(format!(
                        "Task {} has no runtime on machine {}",
                        task.id, machine.name
                    )));
                }
            }
        }
        for edge in workflow.edges() {
            if edge.data_size.is_none() {
                return Err(SchedulingError::IncompleteAttributes(format!(
                    "Edge {} -> {} has no data size",
                    edge.source, edge.target
                )));
            }
        }
        Ok(())
    }
}
