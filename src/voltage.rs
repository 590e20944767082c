/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deadline-driven voltage assignment.
//!
//! Starting from the slowest (cheapest) operating point on every task, the
//! loop repeatedly accelerates the first improvable task on the current
//! critical path until the critical time meets the deadline or no task on
//! the path has a faster point left.
//!
//! The first improvable task in path order is chosen because it is the
//! earliest one: its acceleration propagates into every extension of the
//! critical path, and the rule gives a deterministic tie-break for free.
//!
//! Missing the deadline here is a *soft* outcome; the caller keeps the
//! best-effort assignment and decides what to do with it.

use tracing::{debug, warn};

use crate::cpm::{self, CpmError};
use crate::task::TaskGraph;

/// Result of the voltage assignment loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DvsOutcome {
    /// Critical time of the final policy assignment.
    pub critical_time: i64,
    /// Set when the loop ran out of speed-ups with the critical time still
    /// above the deadline.
    pub deadline_missed: bool,
}

/// Run the assignment loop.
///
/// Expects every policy at the slowest point (the caller resets them) and
/// leaves the graph's CPM fields consistent with the returned assignment.
/// Every iteration strictly decreases the policy sum, so the loop performs
/// at most `tasks × points` CPM recomputes.
pub fn assign_for_deadline(
    graph: &mut TaskGraph,
    roots: &[usize],
    deadline: i64,
) -> Result<DvsOutcome, CpmError> {
    let mut report = cpm::analyze(graph, roots)?;

    while report.critical_time > deadline {
        let speedup = report
            .critical_path
            .iter()
            .copied()
            .find(|&t| graph.tasks[t].can_speed_up());

        let Some(task) = speedup else {
            warn!(
                critical_time = report.critical_time,
                deadline, "no speed-up left on the critical path, deadline infeasible"
            );
            return Ok(DvsOutcome {
                critical_time: report.critical_time,
                deadline_missed: true,
            });
        };

        graph.tasks[task].policy -= 1;
        debug!(
            task,
            policy = graph.tasks[task].policy,
            critical_time = report.critical_time,
            "accelerated critical-path task"
        );

        report = cpm::analyze(graph, roots)?;
    }

    Ok(DvsOutcome {
        critical_time: report.critical_time,
        deadline_missed: false,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::OperatingPoint;
    use crate::topology::root_tasks;

    /// Two-task chain, each task with a fast point (w=2, e=10) and a slow
    /// point (w=5, e=3).
    fn two_speed_chain() -> TaskGraph {
        let mut g = TaskGraph::new(2, true);
        for _ in 0..2 {
            g.add_task(vec![
                OperatingPoint { weight: 2, energy: 10 },
                OperatingPoint { weight: 5, energy: 3 },
            ]);
        }
        g.add_transfer(0, 1, 1);
        g.set_all_policies(1);
        g
    }

    #[test]
    fn meets_deadline_by_accelerating_in_path_order() {
        let mut g = two_speed_chain();
        let roots = root_tasks(&g);

        // Slowest assignment: critical time 10.  Deadline 6 forces two
        // accelerations, first task first.
        let outcome = assign_for_deadline(&mut g, &roots, 6).unwrap();

        assert!(!outcome.deadline_missed);
        assert_eq!(outcome.critical_time, 4);
        assert_eq!(g.policies(), vec![0, 0]);
        assert_eq!(g.total_energy(), 20);
    }

    #[test]
    fn loose_deadline_keeps_the_cheap_assignment() {
        let mut g = two_speed_chain();
        let roots = root_tasks(&g);

        let outcome = assign_for_deadline(&mut g, &roots, 10).unwrap();

        assert!(!outcome.deadline_missed);
        assert_eq!(outcome.critical_time, 10);
        assert_eq!(g.policies(), vec![1, 1]);
        assert_eq!(g.total_energy(), 6);
    }

    #[test]
    fn one_acceleration_suffices_for_intermediate_deadline() {
        let mut g = two_speed_chain();
        let roots = root_tasks(&g);

        // 10 → 7 after the first acceleration; 7 ≤ 7 stops the loop.
        let outcome = assign_for_deadline(&mut g, &roots, 7).unwrap();

        assert!(!outcome.deadline_missed);
        assert_eq!(outcome.critical_time, 7);
        assert_eq!(g.policies(), vec![0, 1]);
    }

    #[test]
    fn infeasible_deadline_reports_and_keeps_best_effort() {
        let mut g = two_speed_chain();
        let roots = root_tasks(&g);

        let outcome = assign_for_deadline(&mut g, &roots, 3).unwrap();

        assert!(outcome.deadline_missed);
        assert_eq!(outcome.critical_time, 4);
        // Both speed-ups spent: the assignment is as fast as it gets.
        assert_eq!(g.policies(), vec![0, 0]);
    }

    #[test]
    fn off_path_tasks_stay_slow() {
        // Heavy chain 0 → 1 plus an independent light task 2.
        let mut g = two_speed_chain();
        g.add_task(vec![
            OperatingPoint { weight: 1, energy: 4 },
            OperatingPoint { weight: 2, energy: 1 },
        ]);
        g.set_all_policies(1);
        let roots = root_tasks(&g);

        let outcome = assign_for_deadline(&mut g, &roots, 7).unwrap();

        assert!(!outcome.deadline_missed);
        // Only the chain was touched.
        assert_eq!(g.tasks[2].policy, 1);
    }

    #[test]
    fn critical_time_never_increases_across_iterations() {
        let mut g = two_speed_chain();
        let roots = root_tasks(&g);

        let mut previous = cpm::analyze(&mut g, &roots).unwrap().critical_time;
        for deadline in [7, 4] {
            let outcome = assign_for_deadline(&mut g, &roots, deadline).unwrap();
            assert!(outcome.critical_time <= previous);
            previous = outcome.critical_time;
        }
    }
}
