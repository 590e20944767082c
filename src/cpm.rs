/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Critical-path-method analysis over the current policy assignment.
//!
//! One call to [`analyze`] fills the `early`/`late` scratch fields of every
//! task reachable from the root set and returns the critical time together
//! with one critical path realising it.
//!
//! # Sign convention
//! `early[t]` is the length of the heaviest chain of weights ending just
//! before `t` starts.  `late` is stored **non-positive**: a sink `s` has
//! `late[s] = -weight(s)`, an interior task has
//! `late[t] = min over children c of late[c] − weight(t)`.  The critical
//! time reported to callers is `-min over roots of late[r]`, a positive
//! number.  Under this convention `-late[t]` is the heaviest tail from `t`
//! through a sink, so `early[t] − late[t] ≤ critical_time` always, with
//! equality exactly on critical tasks, and the slack `delta = late − early`
//! is non-positive with smaller values more urgent.

use thiserror::Error;
use tracing::trace;

use crate::task::TaskGraph;

/// Fatal analysis failure: corrupted CPM state, i.e. a bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpmError {
    /// Path reconstruction found no child satisfying the slack equality.
    #[error("critical-path reconstruction found no matching child below task {task}")]
    InconsistentPath { task: usize },
}

/// Result of one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpmReport {
    /// One heaviest root-to-sink chain, in execution order.
    pub critical_path: Vec<usize>,
    /// Total weight of that chain: the makespan lower bound under the
    /// current policies.
    pub critical_time: i64,
}

/// Recompute `early`/`late` for the whole graph and recover a critical path.
///
/// Previous scratch values are discarded.  `roots` must be the graph's root
/// set (every task is reachable from it on an acyclic graph that passed the
/// topology check).
pub fn analyze(graph: &mut TaskGraph, roots: &[usize]) -> Result<CpmReport, CpmError> {
    graph.reset_cpm();

    if roots.is_empty() {
        return Ok(CpmReport {
            critical_path: Vec::new(),
            critical_time: 0,
        });
    }

    for &root in roots {
        descend(graph, root, 0);
    }

    // The root with the most negative late value opens the critical path.
    let mut critical_root = roots[0];
    let mut min_late = i64::MAX;
    for &root in roots {
        if let Some(late) = graph.tasks[root].late {
            if late < min_late {
                min_late = late;
                critical_root = root;
            }
        }
    }

    let critical_path = reconstruct_path(graph, critical_root)?;
    trace!(
        critical_time = -min_late,
        path_len = critical_path.len(),
        "CPM analysis complete"
    );

    Ok(CpmReport {
        critical_path,
        critical_time: -min_late,
    })
}

/// Downward pass from one root.
///
/// Raises `early` along the way and computes `late` post-order.  A visit
/// that does not raise `early` is pruned: the subtree below was already
/// settled with an equal or larger cumulative weight, and `late` does not
/// depend on `early` at all, so the memoized value stands.
fn descend(graph: &mut TaskGraph, id: usize, parent_cumulative: i64) -> i64 {
    let raised = match graph.tasks[id].early {
        None => {
            graph.tasks[id].early = Some(parent_cumulative);
            true
        }
        Some(early) if parent_cumulative > early => {
            graph.tasks[id].early = Some(parent_cumulative);
            true
        }
        Some(_) => false,
    };

    if !raised {
        if let Some(late) = graph.tasks[id].late {
            return late;
        }
        // late unset with early set only happens mid-first-visit, which a
        // revisit cannot reach on an acyclic graph; fall through and compute.
    }

    let weight = graph.tasks[id].weight();
    let cumulative = graph.tasks[id].early.unwrap_or(parent_cumulative) + weight;

    // Children are collected first: the recursion needs the graph mutably.
    let children: Vec<usize> = graph.tasks[id].targets.iter().map(|t| t.dst).collect();

    // 0 is the neutral element, so a sink ends up with late = -weight.
    let mut min_child_late = 0;
    for child in children {
        min_child_late = min_child_late.min(descend(graph, child, cumulative));
    }

    let candidate = min_child_late - weight;
    let late = match graph.tasks[id].late {
        None => candidate,
        Some(late) => late.min(candidate),
    };
    graph.tasks[id].late = Some(late);
    late
}

/// Walk from the critical root to a sink, at each step taking any child
/// whose `late` equals the current task's `late` plus its weight.
fn reconstruct_path(graph: &TaskGraph, root: usize) -> Result<Vec<usize>, CpmError> {
    let mut path = vec![root];
    let mut current = root;

    loop {
        let task = &graph.tasks[current];
        if task.targets.is_empty() {
            return Ok(path);
        }

        let Some(current_late) = task.late else {
            return Err(CpmError::InconsistentPath { task: current });
        };
        let expected = current_late + task.weight();

        let next = task
            .targets
            .iter()
            .map(|t| t.dst)
            .find(|&child| graph.tasks[child].late == Some(expected));

        match next {
            Some(child) => {
                path.push(child);
                current = child;
            }
            None => return Err(CpmError::InconsistentPath { task: current }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::OperatingPoint;
    use crate::topology::root_tasks;

    fn graph_of(weights: &[i64], edges: &[(usize, usize)]) -> TaskGraph {
        let mut g = TaskGraph::new(1, true);
        for &w in weights {
            g.add_task(vec![OperatingPoint { weight: w, energy: 1 }]);
        }
        for &(src, dst) in edges {
            g.add_transfer(src, dst, 1);
        }
        g
    }

    fn analyze_graph(g: &mut TaskGraph) -> CpmReport {
        let roots = root_tasks(g);
        analyze(g, &roots).unwrap()
    }

    #[test]
    fn single_task_is_its_own_critical_path() {
        let mut g = graph_of(&[5], &[]);
        let report = analyze_graph(&mut g);
        assert_eq!(report.critical_time, 5);
        assert_eq!(report.critical_path, vec![0]);
        assert_eq!(g.tasks[0].early, Some(0));
        assert_eq!(g.tasks[0].late, Some(-5));
    }

    #[test]
    fn chain_accumulates_weights() {
        let mut g = graph_of(&[2, 3, 2], &[(0, 1), (1, 2)]);
        let report = analyze_graph(&mut g);
        assert_eq!(report.critical_time, 7);
        assert_eq!(report.critical_path, vec![0, 1, 2]);
        assert_eq!(g.tasks[0].early, Some(0));
        assert_eq!(g.tasks[1].early, Some(2));
        assert_eq!(g.tasks[2].early, Some(5));
        assert_eq!(g.tasks[2].late, Some(-2));
        assert_eq!(g.tasks[1].late, Some(-5));
        assert_eq!(g.tasks[0].late, Some(-7));
    }

    #[test]
    fn diamond_takes_the_heavier_branch() {
        // 0 → 1 → 3 and 0 → 2 → 3, branch 2 heavier.
        let mut g = graph_of(&[2, 3, 5, 1], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let report = analyze_graph(&mut g);
        assert_eq!(report.critical_time, 2 + 5 + 1);
        assert_eq!(report.critical_path, vec![0, 2, 3]);

        // The lighter branch carries slack.
        assert_eq!(g.tasks[1].early, Some(2));
        assert_eq!(g.tasks[1].late, Some(-4));
        assert_eq!(g.tasks[1].delta(), Some(-6));
        // Critical tasks all share delta = -critical_time.
        for &t in &report.critical_path {
            assert_eq!(g.tasks[t].delta(), Some(-8));
        }
    }

    #[test]
    fn multiple_roots_compete_for_the_critical_path() {
        // Roots 0 (heavy) and 1 (light), both feeding sink 2.
        let mut g = graph_of(&[6, 1, 2], &[(0, 2), (1, 2)]);
        let report = analyze_graph(&mut g);
        assert_eq!(report.critical_time, 8);
        assert_eq!(report.critical_path, vec![0, 2]);
    }

    #[test]
    fn through_path_weight_bounded_by_critical_time() {
        let mut g = graph_of(
            &[3, 4, 2, 5, 1],
            &[(0, 2), (1, 2), (2, 3), (2, 4), (1, 4)],
        );
        let report = analyze_graph(&mut g);
        assert_eq!(report.critical_time, 11);
        assert_eq!(report.critical_path, vec![1, 2, 3]);

        for (i, task) in g.tasks.iter().enumerate() {
            // early − late is the heaviest root-to-sink chain through i.
            let through = task.early.unwrap() - task.late.unwrap();
            assert!(
                through <= report.critical_time,
                "task {i}: through-path weight {through} exceeds the critical time"
            );
            if report.critical_path.contains(&i) {
                assert_eq!(through, report.critical_time);
            } else {
                // In this graph no second critical path exists.
                assert!(through < report.critical_time);
            }
        }
    }

    #[test]
    fn reanalysis_after_policy_change_discards_old_state() {
        let mut g = TaskGraph::new(2, true);
        g.add_task(vec![
            OperatingPoint { weight: 2, energy: 10 },
            OperatingPoint { weight: 5, energy: 3 },
        ]);
        g.add_task(vec![
            OperatingPoint { weight: 2, energy: 10 },
            OperatingPoint { weight: 5, energy: 3 },
        ]);
        g.add_transfer(0, 1, 1);
        g.set_all_policies(1);

        let roots = root_tasks(&g);
        let slow = analyze(&mut g, &roots).unwrap();
        assert_eq!(slow.critical_time, 10);

        g.tasks[0].policy = 0;
        let faster = analyze(&mut g, &roots).unwrap();
        assert_eq!(faster.critical_time, 7);
    }

    #[test]
    fn empty_root_set_yields_empty_report() {
        let mut g = graph_of(&[], &[]);
        let report = analyze(&mut g, &[]).unwrap();
        assert!(report.critical_path.is_empty());
        assert_eq!(report.critical_time, 0);
    }
}
