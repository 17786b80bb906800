//! Reference workflows shared by the unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::environment::Environment;
use crate::graph::Workflow;
use crate::models::{TaskId, Time};

/// Computation costs from Topcuoglu, Hariri & Wu (2002), tasks x 3 processors.
pub const TOPCUOGLU_RUNTIMES: [[Time; 3]; 10] = [
    [14, 16, 9],
    [13, 19, 18],
    [11, 13, 19],
    [13, 8, 17],
    [12, 13, 10],
    [13, 16, 9],
    [7, 15, 11],
    [5, 11, 14],
    [18, 12, 20],
    [21, 7, 16],
];

pub const TOPCUOGLU_EDGES: [(TaskId, TaskId, Time); 15] = [
    (0, 1, 18),
    (0, 2, 12),
    (0, 3, 9),
    (0, 4, 11),
    (0, 5, 14),
    (1, 7, 19),
    (1, 8, 16),
    (2, 6, 23),
    (3, 7, 27),
    (3, 8, 23),
    (4, 8, 13),
    (5, 7, 15),
    (6, 9, 17),
    (7, 9, 11),
    (8, 9, 13),
];

/// Computation costs from Arabnejad & Barbosa (2014), tasks x 3 processors.
pub const ARABNEJAD_BARBOSA_RUNTIMES: [[Time; 3]; 10] = [
    [22, 21, 36],
    [22, 18, 18],
    [32, 27, 43],
    [7, 10, 4],
    [29, 27, 35],
    [26, 17, 24],
    [14, 25, 30],
    [29, 23, 36],
    [15, 21, 8],
    [13, 16, 33],
];

pub const ARABNEJAD_BARBOSA_EDGES: [(TaskId, TaskId, Time); 15] = [
    (0, 1, 17),
    (0, 2, 31),
    (0, 3, 29),
    (0, 4, 13),
    (0, 5, 7),
    (1, 7, 3),
    (1, 8, 30),
    (2, 6, 16),
    (3, 7, 11),
    (3, 8, 7),
    (4, 8, 57),
    (5, 7, 5),
    (6, 9, 9),
    (7, 9, 42),
    (8, 9, 7),
];

fn build(runtimes: &[[Time; 3]], edges: &[(TaskId, TaskId, Time)]) -> (Workflow, Environment) {
    let env = Environment::from_names(["p1", "p2", "p3"]).unwrap();
    let mut wf = Workflow::with_capacity(runtimes.len());
    for row in runtimes {
        wf.add_task_with_runtimes(row);
    }
    for &(source, target, size) in edges {
        wf.add_edge(source, target, size).unwrap();
    }
    (wf, env)
}

pub fn topcuoglu() -> (Workflow, Environment) {
    build(&TOPCUOGLU_RUNTIMES, &TOPCUOGLU_EDGES)
}

pub fn arabnejad_barbosa() -> (Workflow, Environment) {
    build(&ARABNEJAD_BARBOSA_RUNTIMES, &ARABNEJAD_BARBOSA_EDGES)
}

/// Ranks truncated toward zero, the way the published tables report them.
pub fn truncated(ranks: &[f64]) -> Vec<i64> {
    ranks.iter().map(|r| r.trunc() as i64).collect()
}

/// Random layered DAG: edges only go from a layer to later layers.
pub fn random_workflow(seed: u64, tasks: usize, machines: usize) -> (Workflow, Environment) {
    let mut rng = StdRng::seed_from_u64(seed);
    let names: Vec<String> = (0..machines).map(|m| format!("m{}", m)).collect();
    let env = Environment::from_names(&names).unwrap();

    let mut wf = Workflow::with_capacity(tasks);
    let mut layer_of: Vec<usize> = Vec::with_capacity(tasks);
    let mut layer = 0;
    for _ in 0..tasks {
        if !layer_of.is_empty() && rng.gen_bool(0.35) {
            layer += 1;
        }
        let runtimes: Vec<Time> = (0..machines).map(|_| rng.gen_range(1..=30)).collect();
        wf.add_task_with_runtimes(&runtimes);
        layer_of.push(layer);
    }

    for target in 0..tasks {
        for source in 0..target {
            if layer_of[source] < layer_of[target] && rng.gen_bool(0.25) {
                wf.add_edge(source, target, rng.gen_range(0..=25)).unwrap();
            }
        }
    }

    (wf, env)
}
