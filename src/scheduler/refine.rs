/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Plan refinement: diagnose lateness, accelerate the blockers, re-plan.
//!
//! The list scheduler can miss the deadline even when the critical path
//! alone fits, because inter-core transfers and core contention are
//! invisible to the CPM bound.  Refinement closes that gap locally: it
//! finds the earliest task that started after its latest permitted start,
//! walks its chain of tight parents upstream, and accelerates whatever the
//! walk singles out, then schedules again from scratch.
//!
//! Each accepted round strictly decreases the policy sum, so the loop
//! terminates; a configurable round cap bounds it further.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::cpm::{self, CpmError};
use crate::plan::Plan;
use crate::task::TaskGraph;

use super::Scheduler;

/// What the refinement loop settled on.
#[derive(Debug, Clone)]
pub struct RefineOutcome {
    pub plan: Plan,
    /// Set when the plan still misses the deadline and blame attribution
    /// has nothing left to offer.
    pub unimprovable: bool,
    /// Number of accelerate-and-replan rounds applied.
    pub rounds: usize,
}

/// Refine `plan` until it meets `deadline`, nothing is left to improve, or
/// `max_rounds` is exhausted.
///
/// Holds no reference into the old plan across the CPM recompute: each
/// round rebuilds the plan from scratch.
pub fn improve(
    scheduler: &Scheduler,
    graph: &mut TaskGraph,
    roots: &[usize],
    deadline: i64,
    mut plan: Plan,
    max_rounds: usize,
) -> Result<RefineOutcome, CpmError> {
    let mut rounds = 0;

    loop {
        let makespan = plan.makespan();
        if makespan <= deadline {
            return Ok(RefineOutcome {
                plan,
                unimprovable: false,
                rounds,
            });
        }
        if rounds >= max_rounds {
            warn!(rounds, makespan, deadline, "refinement round cap reached");
            return Ok(RefineOutcome {
                plan,
                unimprovable: true,
                rounds,
            });
        }

        let Some(victim) = earliest_late_task(graph, &plan, deadline) else {
            warn!(
                makespan,
                deadline, "plan misses the deadline but no task starts late, accepting"
            );
            return Ok(RefineOutcome {
                plan,
                unimprovable: true,
                rounds,
            });
        };

        let suggestions = blocker_suggestions(graph, &plan, victim);
        if suggestions.is_empty() {
            warn!(
                victim,
                makespan, deadline, "blame attribution found nothing to accelerate"
            );
            return Ok(RefineOutcome {
                plan,
                unimprovable: true,
                rounds,
            });
        }

        debug!(victim, ?suggestions, makespan, "accelerating blockers");
        for &task in &suggestions {
            if graph.tasks[task].can_speed_up() {
                graph.tasks[task].policy -= 1;
            }
        }

        // The old plan is dropped before the recompute; the next one is
        // built against the fresh CPM fields.
        cpm::analyze(graph, roots)?;
        plan = scheduler.place(graph, roots);
        rounds += 1;
    }
}

/// The placed task with the smallest actual start among those that started
/// after their latest permitted start (`deadline + late`); ties fall to the
/// smallest index.  `None` when every task started in time.
fn earliest_late_task(graph: &TaskGraph, plan: &Plan, deadline: i64) -> Option<usize> {
    let mut best: Option<(i64, usize)> = None;

    for (task, assignment) in plan.assignment.iter().enumerate() {
        let Some(assignment) = assignment else {
            continue;
        };
        let Some(late) = graph.tasks[task].late else {
            continue;
        };
        let start = assignment.finish - graph.tasks[task].weight();
        if start > deadline + late {
            let earlier = match best {
                None => true,
                Some((best_start, _)) => start < best_start,
            };
            if earlier {
                best = Some((start, task));
            }
        }
    }

    best.map(|(_, task)| task)
}

/// Upstream blame attribution from `task`.
///
/// A parent is a blocker iff the task starts exactly when that parent's
/// data arrives (`finish + transfer == start`).  The rule at every level is
/// the same: collect the blockers' suggestions; a node whose blockers offer
/// nothing and whose own policy can still drop suggests itself.  The set is
/// deduplicated by construction; diamonds may reach the same ancestor
/// twice.
fn blocker_suggestions(graph: &TaskGraph, plan: &Plan, task: usize) -> BTreeSet<usize> {
    let mut aggregate = BTreeSet::new();

    let Some(assignment) = plan.assignment[task] else {
        return aggregate;
    };
    let start = assignment.finish - graph.tasks[task].weight();

    for &parent in &graph.tasks[task].parents {
        let Some(parent_at) = plan.assignment[parent] else {
            continue;
        };
        let transfer = if parent_at.core == assignment.core {
            0
        } else {
            graph.volume(parent, task).unwrap_or(0)
        };
        if parent_at.finish + transfer == start {
            aggregate.extend(blocker_suggestions(graph, plan, parent));
        }
    }

    if aggregate.is_empty() && graph.tasks[task].can_speed_up() {
        aggregate.insert(task);
    }
    aggregate
}

// ── Tests ─────────────────────────────────────────────────────────────────────
