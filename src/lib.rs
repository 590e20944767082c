/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Energy-aware, deadline-constrained DAG scheduling for a multi-core
//! fabric.
//!
//! Each task offers several voltage/frequency operating points (execution
//! time vs. energy); edges carry data volumes paid as transfer time when
//! their endpoints land on different cores.  Given a deadline and a core
//! count, the pipeline picks one operating point per task and a placement
//! of every task such that precedences hold, the makespan meets the
//! deadline when possible, and total energy stays low.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── task.rs        – operating points, tasks, the task graph
//! ├── topology.rs    – root set, acyclicity
//! ├── cpm.rs         – early/late analysis, critical path
//! ├── voltage.rs     – deadline-driven operating-point assignment
//! ├── plan.rs        – per-core timelines, placement results
//! ├── scheduler/     – list scheduling, refinement, pipeline entry point
//! ├── format.rs      – task-graph text format (parse + canonical emit)
//! ├── config.rs      – YAML run configuration
//! ├── generator.rs   – seeded random graphs for tests and demos
//! └── gantt.rs       – plain-text timeline rendering
//! ```

pub mod config;
pub mod cpm;
pub mod format;
pub mod gantt;
pub mod generator;
pub mod plan;
pub mod scheduler;
pub mod task;
pub mod topology;
pub mod voltage;

pub use config::RunConfig;
pub use plan::{Assignment, CoreTimeline, Plan, ProcessingEvent, TransferEvent};
pub use scheduler::{ScheduleError, ScheduleOutcome, Scheduler, Shortfall};
pub use task::{OperatingPoint, Task, TaskGraph, Transfer, TransferTo};
pub use topology::TopologyError;
