/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structural checks on the task graph: root-set extraction and acyclicity.
//!
//! Both operate purely on the forward `targets` topology; policies and CPM
//! fields play no role here.

use thiserror::Error;

use crate::task::TaskGraph;

/// Fatal topology failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The graph contains a dependency cycle, or has tasks but no root,
    /// which on a finite graph is the same condition.
    #[error("task graph contains a dependency cycle")]
    Cycle,
}

/// Indices of the tasks with no incoming edge, in ascending order.
pub fn root_tasks(graph: &TaskGraph) -> Vec<usize> {
    let mut is_destination = vec![false; graph.len()];
    for transfer in &graph.transfers {
        is_destination[transfer.dst] = true;
    }

    is_destination
        .iter()
        .enumerate()
        .filter(|(_, is_dst)| !**is_dst)
        .map(|(i, _)| i)
        .collect()
}

/// Verify that every walk from the root set terminates.
///
/// Fails when the root set is empty on a non-empty graph, or when a
/// depth-first walk from any root reaches a task already on the current
/// path.  A cycle in a region unreachable from every root is not detected;
/// such a region always empties the root set of its own component, so the
/// whole-graph case of interest is covered by the empty-root rule.
pub fn check_acyclic(graph: &TaskGraph, roots: &[usize]) -> Result<(), TopologyError> {
    if graph.is_empty() {
        return Ok(());
    }
    if roots.is_empty() {
        return Err(TopologyError::Cycle);
    }

    let mut on_path = vec![false; graph.len()];
    for &root in roots {
        if !walk(graph, root, &mut on_path) {
            return Err(TopologyError::Cycle);
        }
    }
    Ok(())
}

/// Depth-first walk; returns `false` on the first back-edge to the current
/// path.
fn walk(graph: &TaskGraph, id: usize, on_path: &mut [bool]) -> bool {
    if on_path[id] {
        return false;
    }
    on_path[id] = true;
    for edge in &graph.tasks[id].targets {
        if !walk(graph, edge.dst, on_path) {
            return false;
        }
    }
    on_path[id] = false;
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
