/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-graph text format: parsing and canonical output.
//!
//! The format is a whitespace-delimited record stream:
//!
//! ```text
//! V 2            operating points per task, must come first
//! I 0            id basis of the records below (0- or 1-based), second
//! T 0 : 2 5 : 10 3    task 0: weights fastest-first, then energies
//! T 1 : 2 5 : 10 3
//! S 0 : 1 : 4         transfer 0 → 1, volume 4
//! ```
//!
//! Separators (`:` above) are single non-alphanumeric characters, consumed
//! and ignored; `T 0> 5 > 3` parses the same.  Task ids must equal the
//! running counter in the declared basis.  Any violation fails the whole
//! parse.
//!
//! [`write_canonical`] re-emits a graph in exactly the layout above; parsing
//! its output yields the original graph (policies and the derived `parents`
//! mirror aside).

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::task::{OperatingPoint, TaskGraph};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Malformed input.  Fatal to the run: the driver reports it and exits
/// non-zero.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected the operating-point count (V) as the first record")]
    MissingPointCount,

    #[error("operating-point count must be positive, found {found}")]
    NonPositivePointCount { found: i64 },

    #[error("expected the indexing basis (I) as the second record")]
    MissingIndexingBasis,

    #[error("indexing basis must be 0 or 1, found {found:?}")]
    BadIndexingBasis { found: char },

    #[error("unexpected record tag {tag:?}")]
    UnknownTag { tag: char },

    #[error("task id {found} does not match the running counter {expected}")]
    TaskIdMismatch { expected: i64, found: i64 },

    #[error("expected a separator character, found {found:?}")]
    BadSeparator { found: char },

    #[error("expected an integer, found {found:?}")]
    ExpectedInteger { found: char },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("{what} must be positive, found {found}")]
    NonPositiveValue { what: &'static str, found: i64 },

    #[error("transfer endpoint {id} is out of range for {task_count} task(s)")]
    EndpointOutOfRange { id: i64, task_count: usize },
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

/// Character-level cursor: integers and single-character tokens separated by
/// arbitrary whitespace.
struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Next non-whitespace character, or `None` at end of input.
    fn next_char(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.next()
    }

    /// Next token as a non-negative integer.
    fn next_int(&mut self) -> Result<i64, ParseError> {
        self.skip_whitespace();
        match self.chars.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some(&c) if !c.is_ascii_digit() => Err(ParseError::ExpectedInteger { found: c }),
            Some(_) => {
                let mut value: i64 = 0;
                while let Some(&c) = self.chars.peek() {
                    let Some(digit) = c.to_digit(10) else { break };
                    // Absurdly long numbers saturate rather than wrap.
                    value = value.saturating_mul(10).saturating_add(i64::from(digit));
                    self.chars.next();
                }
                Ok(value)
            }
        }
    }

    /// Consume one separator character (non-alphanumeric).
    fn next_separator(&mut self) -> Result<(), ParseError> {
        match self.next_char() {
            None => Err(ParseError::UnexpectedEof),
            Some(c) if c.is_alphanumeric() => Err(ParseError::BadSeparator { found: c }),
            Some(_) => Ok(()),
        }
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Parse a complete task-graph description.
pub fn parse_task_graph(input: &str) -> Result<TaskGraph, ParseError> {
    let mut lx = Lexer::new(input);

    // Header: operating-point count, then indexing basis.
    match lx.next_char() {
        Some('V') => {}
        _ => return Err(ParseError::MissingPointCount),
    }
    let point_count = lx.next_int()?;
    if point_count <= 0 {
        return Err(ParseError::NonPositivePointCount { found: point_count });
    }
    let point_count = point_count as usize;

    match lx.next_char() {
        Some('I') => {}
        _ => return Err(ParseError::MissingIndexingBasis),
    }
    let indexing_from_zero = match lx.next_char() {
        Some('0') => true,
        Some('1') => false,
        Some(c) => return Err(ParseError::BadIndexingBasis { found: c }),
        None => return Err(ParseError::UnexpectedEof),
    };

    let mut graph = TaskGraph::new(point_count, indexing_from_zero);
    let mut expected_id: i64 = if indexing_from_zero { 0 } else { 1 };
    // Transfers are buffered so records may reference tasks declared later.
    let mut pending: Vec<(i64, i64, i64)> = Vec::new();

    while let Some(tag) = lx.next_char() {
        match tag {
            'T' => {
                let id = lx.next_int()?;
                if id != expected_id {
                    return Err(ParseError::TaskIdMismatch {
                        expected: expected_id,
                        found: id,
                    });
                }
                expected_id += 1;

                lx.next_separator()?;
                let mut weights = Vec::with_capacity(point_count);
                for _ in 0..point_count {
                    let w = lx.next_int()?;
                    if w <= 0 {
                        return Err(ParseError::NonPositiveValue {
                            what: "weight",
                            found: w,
                        });
                    }
                    weights.push(w);
                }

                lx.next_separator()?;
                let mut points = Vec::with_capacity(point_count);
                for weight in weights {
                    let energy = lx.next_int()?;
                    if energy <= 0 {
                        return Err(ParseError::NonPositiveValue {
                            what: "energy",
                            found: energy,
                        });
                    }
                    points.push(OperatingPoint { weight, energy });
                }
                graph.add_task(points);
            }
            'S' => {
                let from = lx.next_int()?;
                lx.next_separator()?;
                let to = lx.next_int()?;
                lx.next_separator()?;
                let volume = lx.next_int()?;
                pending.push((from, to, volume));
            }
            other => return Err(ParseError::UnknownTag { tag: other }),
        }
    }

    // Resolve buffered transfers against the final task count.
    let task_count = graph.len();
    let offset: i64 = if indexing_from_zero { 0 } else { 1 };
    for (from, to, volume) in pending {
        let src = from - offset;
        let dst = to - offset;
        if src < 0 || src >= task_count as i64 {
            return Err(ParseError::EndpointOutOfRange { id: from, task_count });
        }
        if dst < 0 || dst >= task_count as i64 {
            return Err(ParseError::EndpointOutOfRange { id: to, task_count });
        }
        graph.add_transfer(src as usize, dst as usize, volume);
    }

    Ok(graph)
}

// ── Canonical writer ──────────────────────────────────────────────────────────

/// Emit `graph` in canonical form: `V`, `I`, all `T` records in index
/// order, then all `S` records in insertion order, ids in the recorded
/// basis with `:` as the separator.
pub fn write_canonical(graph: &TaskGraph) -> String {
    let offset: i64 = if graph.indexing_from_zero { 0 } else { 1 };
    let mut out = String::new();

    out.push_str(&format!("V {}\n", graph.point_count()));
    out.push_str(&format!(
        "I {}\n",
        if graph.indexing_from_zero { 0 } else { 1 }
    ));

    for (i, task) in graph.tasks.iter().enumerate() {
        let weights: Vec<String> = task.points.iter().map(|p| p.weight.to_string()).collect();
        let energies: Vec<String> = task.points.iter().map(|p| p.energy.to_string()).collect();
        out.push_str(&format!(
            "T {} : {} : {}\n",
            i as i64 + offset,
            weights.join(" "),
            energies.join(" ")
        ));
    }

    for transfer in &graph.transfers {
        out.push_str(&format!(
            "S {} : {} : {}\n",
            transfer.src as i64 + offset,
            transfer.dst as i64 + offset,
            transfer.volume
        ));
    }

    out
}

// ── File boundary ─────────────────────────────────────────────────────────────

/// Read and parse a task-graph file.
pub fn read_task_graph(path: &Path) -> Result<TaskGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot open task graph file: {}", path.display()))?;

    let graph = parse_task_graph(&content)
        .with_context(|| format!("failed to parse task graph: {}", path.display()))?;

    info!(
        tasks = graph.len(),
        transfers = graph.transfers.len(),
        points = graph.point_count(),
        "task graph loaded from {}",
        path.display()
    );
    Ok(graph)
}

/// Write a task-graph file in canonical form.
pub fn write_task_graph(path: &Path, graph: &TaskGraph) -> Result<()> {
    std::fs::write(path, write_canonical(graph))
        .with_context(|| format!("cannot write task graph file: {}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_parses() {
        let g = parse_task_graph("V 1\nI 0\nT 0: 5 : 3\n").unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.point_count(), 1);
        assert!(g.indexing_from_zero);
        assert_eq!(g.tasks[0].points, vec![OperatingPoint { weight: 5, energy: 3 }]);
        assert!(g.transfers.is_empty());
    }

    #[test]
    fn chain_with_transfers_parses() {
        let input = "V 1\nI 0\nT 0: 2 : 1\nT 1: 3 : 1\nT 2: 2 : 1\nS 0 : 1 : 4\nS 1 : 2 : 4\n";
        let g = parse_task_graph(input).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.transfers.len(), 2);
        assert_eq!(g.volume(0, 1), Some(4));
        assert_eq!(g.volume(1, 2), Some(4));
        assert_eq!(g.tasks[1].parents, vec![0]);
    }

    #[test]
    fn multi_point_task_reads_weights_then_energies() {
        let g = parse_task_graph("V 3\nI 0\nT 0: 2 4 8 : 9 5 1\n").unwrap();
        assert_eq!(
            g.tasks[0].points,
            vec![
                OperatingPoint { weight: 2, energy: 9 },
                OperatingPoint { weight: 4, energy: 5 },
                OperatingPoint { weight: 8, energy: 1 },
            ]
        );
    }

    #[test]
    fn one_based_ids_are_shifted_down() {
        let input = "V 1\nI 1\nT 1: 2 : 1\nT 2: 3 : 1\nS 1 : 2 : 7\n";
        let g = parse_task_graph(input).unwrap();
        assert!(!g.indexing_from_zero);
        assert_eq!(g.volume(0, 1), Some(7));
    }

    #[test]
    fn separator_character_is_free_choice() {
        let g = parse_task_graph("V 1 I 0 T 0> 5 > 3 S 0> 0| 2").unwrap();
        // Self-loop accepted by the parser; topology rejects it later.
        assert_eq!(g.volume(0, 0), Some(2));
    }

    #[test]
    fn transfer_may_precede_its_endpoint_declarations() {
        let input = "V 1\nI 0\nS 0 : 1 : 2\nT 0: 1 : 1\nT 1: 1 : 1\n";
        let g = parse_task_graph(input).unwrap();
        assert_eq!(g.volume(0, 1), Some(2));
    }

    // ── Violations ────────────────────────────────────────────────────────────

    #[test]
    fn missing_v_header_fails() {
        assert_eq!(
            parse_task_graph("I 0\nT 0: 5 : 3\n"),
            Err(ParseError::MissingPointCount)
        );
        assert_eq!(parse_task_graph(""), Err(ParseError::MissingPointCount));
    }

    #[test]
    fn zero_point_count_fails() {
        assert_eq!(
            parse_task_graph("V 0\nI 0\n"),
            Err(ParseError::NonPositivePointCount { found: 0 })
        );
    }

    #[test]
    fn missing_indexing_header_fails() {
        assert_eq!(
            parse_task_graph("V 1\nT 0: 5 : 3\n"),
            Err(ParseError::MissingIndexingBasis)
        );
    }

    #[test]
    fn bad_indexing_basis_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 2\n"),
            Err(ParseError::BadIndexingBasis { found: '2' })
        );
    }

    #[test]
    fn out_of_order_task_id_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nT 1: 5 : 3\n"),
            Err(ParseError::TaskIdMismatch {
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn unknown_record_tag_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nX 0: 5 : 3\n"),
            Err(ParseError::UnknownTag { tag: 'X' })
        );
    }

    #[test]
    fn alphanumeric_separator_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nT 0 9 5 : 3\n"),
            Err(ParseError::BadSeparator { found: '9' })
        );
    }

    #[test]
    fn truncated_record_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nT 0: 5"),
            Err(ParseError::UnexpectedEof)
        );
    }

    #[test]
    fn zero_weight_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nT 0: 0 : 3\n"),
            Err(ParseError::NonPositiveValue {
                what: "weight",
                found: 0
            })
        );
    }

    #[test]
    fn transfer_to_unknown_task_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 0\nT 0: 5 : 3\nS 0 : 4 : 1\n"),
            Err(ParseError::EndpointOutOfRange {
                id: 4,
                task_count: 1
            })
        );
    }

    #[test]
    fn one_based_zero_endpoint_fails() {
        assert_eq!(
            parse_task_graph("V 1\nI 1\nT 1: 5 : 3\nS 0 : 1 : 1\n"),
            Err(ParseError::EndpointOutOfRange {
                id: 0,
                task_count: 1
            })
        );
    }

    // ── Round trip ────────────────────────────────────────────────────────────

    #[test]
    fn canonical_output_reparses_to_the_same_graph() {
        let input = "V 2\nI 0\nT 0> 1 4 > 9 2\nT 1| 2 5 | 8 3\nT 2: 1 3 : 7 2\nS 0 . 1 . 4\nS 0 , 2 , 1\n";
        let first = parse_task_graph(input).unwrap();
        let canonical = write_canonical(&first);
        let second = parse_task_graph(&canonical).unwrap();

        assert_eq!(first.indexing_from_zero, second.indexing_from_zero);
        assert_eq!(first.point_count(), second.point_count());
        assert_eq!(first.transfers, second.transfers);
        for (a, b) in first.tasks.iter().zip(&second.tasks) {
            assert_eq!(a.points, b.points);
            assert_eq!(a.targets, b.targets);
        }
        // Canonical form is a fixed point.
        assert_eq!(canonical, write_canonical(&second));
    }

    #[test]
    fn one_based_graphs_round_trip_in_their_own_basis() {
        let input = "V 1\nI 1\nT 1: 2 : 1\nT 2: 3 : 1\nS 1 : 2 : 7\n";
        let g = parse_task_graph(input).unwrap();
        let canonical = write_canonical(&g);
        assert!(canonical.contains("I 1"));
        assert!(canonical.contains("T 1 :"));
        assert!(canonical.contains("S 1 : 2 : 7"));
        let again = parse_task_graph(&canonical).unwrap();
        assert_eq!(again.volume(0, 1), Some(7));
    }
}
