/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error and shortfall types for the scheduling pipeline.
//!
//! Two layers model the two kinds of failure:
//!
//! * [`ScheduleError`]: fatal; the pipeline aborts and no plan is
//!   returned.
//! * [`Shortfall`]: soft; the pipeline still returns its best-effort plan
//!   and records what it could not achieve.  Callers that need a hard
//!   deadline guarantee check the outcome's shortfall list.

use thiserror::Error;

use crate::cpm::CpmError;
use crate::topology::TopologyError;

// ── Fatal errors ──────────────────────────────────────────────────────────────

/// Top-level failure returned by
/// [`Scheduler::run`](super::Scheduler::run).
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// `run()` was called with a core count of zero.
    #[error("core count must be at least 1")]
    NoCores,

    /// The task graph failed the structural checks.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The CPM engine detected inconsistent internal state: a bug, not an
    /// input problem.
    #[error(transparent)]
    Cpm(#[from] CpmError),
}

// ── Soft shortfalls ───────────────────────────────────────────────────────────

/// A goal the pipeline had to give up on while still producing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    /// The voltage assignment ran out of speed-ups with the critical time
    /// still above the deadline.  Carries both values so the caller can
    /// report exactly how far off the graph is.
    InfeasibleDeadline { critical_time: i64, deadline: i64 },

    /// Refinement found nothing left to blame while the makespan still
    /// exceeds the deadline; the current plan is the final answer.
    Unimprovable { makespan: i64, deadline: i64 },
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shortfall::InfeasibleDeadline {
                critical_time,
                deadline,
            } => write!(
                f,
                "deadline {deadline} is infeasible: the critical path alone needs {critical_time}"
            ),
            Shortfall::Unimprovable { makespan, deadline } => write!(
                f,
                "no further improvement possible: makespan {makespan} exceeds deadline {deadline}"
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_messages_carry_both_values() {
        let s = Shortfall::InfeasibleDeadline {
            critical_time: 9,
            deadline: 4,
        };
        let text = s.to_string();
        assert!(text.contains('9') && text.contains('4'));

        let s = Shortfall::Unimprovable {
            makespan: 12,
            deadline: 8,
        };
        let text = s.to_string();
        assert!(text.contains("12") && text.contains('8'));
    }

    #[test]
    fn topology_error_converts_into_schedule_error() {
        let err: ScheduleError = TopologyError::Cycle.into();
        assert!(matches!(err, ScheduleError::Topology(TopologyError::Cycle)));
    }
}
