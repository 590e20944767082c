/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Seeded random task-graph generation for tests and demos.
//!
//! Edges only ever point from a lower index to a higher one, so the output
//! is acyclic by construction.  Operating points are generated slowest-first
//! and reversed, giving every task strictly increasing weights and strictly
//! decreasing energies across the point list, which is the monotonicity the
//! voltage assignment heuristic assumes.
//!
//! The same seed always produces the same graph.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::task::{OperatingPoint, TaskGraph};

/// Shape parameters for one generated graph.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorSpec {
    pub tasks: usize,
    /// Operating points per task (≥ 1).
    pub points: usize,
    pub seed: u64,
}

/// Generate a random DAG according to `spec`.
pub fn generate(spec: &GeneratorSpec) -> TaskGraph {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut graph = TaskGraph::new(spec.points.max(1), true);

    for _ in 0..spec.tasks {
        graph.add_task(random_points(&mut rng, spec.points.max(1)));
    }

    // Every non-root task gets at least one earlier parent; a second is
    // added often enough to produce diamonds and multi-parent joins.
    for dst in 1..spec.tasks {
        let primary = rng.gen_range(0..dst);
        graph.add_transfer(primary, dst, rng.gen_range(1..=8));

        if dst > 1 && rng.gen_bool(0.4) {
            let secondary = rng.gen_range(0..dst);
            if secondary != primary {
                graph.add_transfer(secondary, dst, rng.gen_range(1..=8));
            }
        }
    }

    graph
}

/// Operating points for one task, fastest first.
fn random_points(rng: &mut StdRng, count: usize) -> Vec<OperatingPoint> {
    // Build from the slowest end: small weight increments walking down,
    // small energy increments walking up.
    let mut weight = rng.gen_range(1..=6);
    let mut energy = rng.gen_range(1..=4);

    let mut slowest_first = Vec::with_capacity(count);
    slowest_first.push(OperatingPoint { weight, energy });
    for _ in 1..count {
        weight += rng.gen_range(1..=4);
        energy += rng.gen_range(1..=5);
        slowest_first.push(OperatingPoint { weight, energy });
    }

    slowest_first.reverse();
    slowest_first
}

// ── Tests ─────────────────────────────────────────────────────────────────────
