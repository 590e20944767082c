/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Plain-text rendering of a [`Plan`]: one processing line per core, with
//! the core's outgoing transfers listed underneath.

use std::fmt::Write;

use crate::plan::Plan;

/// Render the per-core timelines.
///
/// ```text
/// makespan 7
/// core 0: [0..2) #0 | [2..5) #1 | [5..7) #2
///         send #0 -> #2 [1..2)
/// core 1: (idle)
/// ```
pub fn render(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "makespan {}", plan.makespan());

    for (id, core) in plan.cores.iter().enumerate() {
        if core.processing.is_empty() {
            let _ = writeln!(out, "core {id}: (idle)");
        } else {
            let lanes: Vec<String> = core
                .processing
                .iter()
                .map(|e| format!("[{}..{}) #{}", e.start, e.finish(), e.task))
                .collect();
            let _ = writeln!(out, "core {id}: {}", lanes.join(" | "));
        }
        for t in &core.transfers {
            let _ = writeln!(
                out,
                "        send #{} -> #{} [{}..{})",
                t.src,
                t.dst,
                t.start,
                t.finish()
            );
        }
    }

    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
