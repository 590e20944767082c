//! Slack-priority list scheduling and pipeline orchestration.
//!
//! [`Scheduler`] drives the whole pipeline over one [`TaskGraph`]:
//!
//! 1. Structural checks (root set, acyclicity); fatal on failure.
//! 2. Voltage assignment against the deadline (policies start slowest).
//! 3. List scheduling: ready tasks placed in increasing-slack order onto
//!    the core where they can start earliest, paying transfer volumes
//!    between cores.
//! 4. Refinement: accelerate the tasks to blame for lateness and re-plan.
//!
//! The result is a [`ScheduleOutcome`]: the final [`Plan`], the settled
//! policies, the total energy, and any [`Shortfall`]s the pipeline had to
//! accept.  All per-run state is local to [`Scheduler::run`]; the only
//! mutation that escapes is the `policy` field on each task.
//!
//! # Determinism
//! Identical inputs produce identical plans.  Every choice has a fixed
//! tie-break: ready tasks by list position, cores by index, children by
//! target order.

pub mod error;
pub mod refine;

pub use error::{ScheduleError, Shortfall};

use tracing::{debug, info};

use crate::plan::{Assignment, Plan, ProcessingEvent, TransferEvent};
use crate::task::TaskGraph;
use crate::{topology, voltage};

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Everything the pipeline produces for one run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// Final placement.  Empty (no events) when the graph has no tasks.
    pub plan: Plan,
    /// Settled operating point per task.
    pub policies: Vec<usize>,
    /// Sum of the selected points' energies.
    pub total_energy: i64,
    /// Latest processing finish across all cores.
    pub makespan: i64,
    /// Soft conditions accepted along the way, in the order they occurred.
    pub shortfalls: Vec<Shortfall>,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Pipeline driver for a fixed fabric of identical cores.
#[derive(Debug, Clone)]
pub struct Scheduler {
    cores: usize,
    max_refinement_rounds: usize,
}

impl Scheduler {
    /// Scheduler for `cores` identical cores with the default refinement
    /// cap.
    pub fn new(cores: usize) -> Self {
        Self {
            cores,
            max_refinement_rounds: crate::config::RunConfig::default().max_refinement_rounds,
        }
    }

    /// Scheduler configured from a [`RunConfig`](crate::config::RunConfig).
    pub fn from_config(config: &crate::config::RunConfig) -> Self {
        Self {
            cores: config.cores,
            max_refinement_rounds: config.max_refinement_rounds,
        }
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    // ── Public entry point ────────────────────────────────────────────────────

    /// Run the full pipeline on `graph` against `deadline`.
    ///
    /// On success the graph's policies hold the settled assignment and the
    /// outcome carries the matching plan.  Soft conditions (infeasible
    /// deadline, unimprovable plan) are recorded in
    /// [`ScheduleOutcome::shortfalls`], not raised as errors.
    ///
    /// # Errors
    /// [`ScheduleError::NoCores`] for a zero core count,
    /// [`ScheduleError::Topology`] for a cyclic graph, and
    /// [`ScheduleError::Cpm`] for internal analysis inconsistencies.
    pub fn run(
        &self,
        graph: &mut TaskGraph,
        deadline: i64,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        if self.cores == 0 {
            return Err(ScheduleError::NoCores);
        }

        if graph.is_empty() {
            info!("task graph is empty, nothing to do");
            return Ok(ScheduleOutcome {
                plan: Plan::new(self.cores, 0),
                policies: Vec::new(),
                total_energy: 0,
                makespan: 0,
                shortfalls: Vec::new(),
            });
        }

        let roots = topology::root_tasks(graph);
        topology::check_acyclic(graph, &roots)?;

        info!(
            tasks = graph.len(),
            cores = self.cores,
            deadline,
            "=== scheduling pipeline start ==="
        );

        let mut shortfalls = Vec::new();

        // Stage 2: cheapest-first voltage assignment against the deadline.
        graph.set_all_policies(graph.point_count().saturating_sub(1));
        let dvs = voltage::assign_for_deadline(graph, &roots, deadline)?;
        if dvs.deadline_missed {
            shortfalls.push(Shortfall::InfeasibleDeadline {
                critical_time: dvs.critical_time,
                deadline,
            });
        }

        // Stage 3: placement with inter-core transfers.
        let plan = self.place(graph, &roots);

        // Stage 4: accelerate the blockers while the plan misses the
        // deadline and something is left to accelerate.
        let refined = refine::improve(
            self,
            graph,
            &roots,
            deadline,
            plan,
            self.max_refinement_rounds,
        )?;
        if refined.unimprovable {
            shortfalls.push(Shortfall::Unimprovable {
                makespan: refined.plan.makespan(),
                deadline,
            });
        }

        let makespan = refined.plan.makespan();
        info!(
            makespan,
            total_energy = graph.total_energy(),
            shortfalls = shortfalls.len(),
            "=== scheduling pipeline complete ==="
        );

        Ok(ScheduleOutcome {
            plan: refined.plan,
            policies: graph.policies(),
            total_energy: graph.total_energy(),
            makespan,
            shortfalls,
        })
    }

    // ── List scheduler ────────────────────────────────────────────────────────

    /// Place every task once, most-urgent-first, onto the core offering the
    /// earliest start.  Requires the graph's CPM fields to match its
    /// current policies.
    pub(crate) fn place(&self, graph: &TaskGraph, roots: &[usize]) -> Plan {
        let mut plan = Plan::new(self.cores, graph.len());
        let mut done = vec![false; graph.len()];
        let mut ready: Vec<usize> = roots.to_vec();

        while !ready.is_empty() {
            // Most urgent ready task; list position breaks ties.
            let mut pick = 0;
            for i in 1..ready.len() {
                if delta_of(graph, ready[i]) < delta_of(graph, ready[pick]) {
                    pick = i;
                }
            }
            let task = ready.remove(pick);
            let weight = graph.tasks[task].weight();

            // Core with the earliest conflict-free start; index breaks ties.
            let mut best_core = 0;
            let mut best_start = i64::MAX;
            for core in 0..self.cores {
                let ready_at = self.data_ready_at(graph, &plan, task, core);
                let start = earliest_fit(&plan.cores[core].processing, ready_at, weight);
                if start < best_start {
                    best_start = start;
                    best_core = core;
                }
            }

            // Commit the placement and book one transfer per cross-core
            // parent on the parent's core.
            plan.cores[best_core].processing.push(ProcessingEvent {
                start: best_start,
                duration: weight,
                task,
            });
            plan.assignment[task] = Some(Assignment {
                core: best_core,
                finish: best_start + weight,
            });
            for &parent in &graph.tasks[task].parents {
                let Some(parent_at) = plan.assignment[parent] else {
                    debug_assert!(false, "parent {parent} of task {task} placed out of order");
                    continue;
                };
                if parent_at.core != best_core {
                    plan.cores[parent_at.core].transfers.push(TransferEvent {
                        start: parent_at.finish,
                        duration: graph.volume(parent, task).unwrap_or(0),
                        src: parent,
                        dst: task,
                    });
                }
            }
            debug!(task, core = best_core, start = best_start, weight, "placed");

            // Expand: children whose parents are now all done become ready.
            done[task] = true;
            for edge in &graph.tasks[task].targets {
                let child = edge.dst;
                if done[child] || ready.contains(&child) {
                    continue;
                }
                if graph.tasks[child].parents.iter().all(|&p| done[p]) {
                    ready.push(child);
                }
            }
        }

        plan
    }

    /// Earliest time all of `task`'s inputs can be present on `core`:
    /// same-core parents hand over at their finish, cross-core parents add
    /// their transfer volume.
    fn data_ready_at(&self, graph: &TaskGraph, plan: &Plan, task: usize, core: usize) -> i64 {
        let mut ready = 0;
        for &parent in &graph.tasks[task].parents {
            let Some(parent_at) = plan.assignment[parent] else {
                debug_assert!(false, "parent {parent} of task {task} not yet placed");
                continue;
            };
            let transfer = if parent_at.core == core {
                0
            } else {
                graph.volume(parent, task).unwrap_or(0)
            };
            ready = ready.max(parent_at.finish + transfer);
        }
        ready
    }
}

/// Slack of `task` under the current CPM fields.
fn delta_of(graph: &TaskGraph, task: usize) -> i64 {
    graph.tasks[task].delta().unwrap_or(0)
}

/// Smallest start `≥ from` at which a `weight`-long interval overlaps no
/// placed interval: any conflict pushes the candidate to the conflicting
/// interval's finish, until stable.  Non-preemptive: gaps shorter than
/// `weight` are skipped over.
fn earliest_fit(placed: &[ProcessingEvent], from: i64, weight: i64) -> i64 {
    let mut start = from;
    loop {
        let conflict = placed
            .iter()
            .find(|event| start < event.finish() && event.start < start + weight);
        match conflict {
            Some(event) => start = event.finish(),
            None => return start,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
