//! Block processing order.
//!
//! Kahn's algorithm over the graph's forward adjacency: zero in-degree blocks
//! are queued in declaration order and ties break by FIFO arrival. Blocks on
//! a feedback loop never reach zero in-degree; they are appended afterwards
//! in declaration order, and whatever they read from later in the loop is
//! the previous step's value.

use crate::graph::Graph;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Every block index exactly once.
    pub order: Vec<usize>,
    /// The tail of `order` placed by the cycle fallback.
    pub cyclic: Vec<usize>,
}

/// Schedule `graph` with no extra constraints.
pub fn schedule(graph: &Graph) -> Schedule {
    schedule_with(graph, &[])
}

/// Schedule `graph`, additionally ordering each `(before, after)` pair in
/// `extra` as if it were a connection. Extra edges constrain order only;
/// they never show up as block inputs. A pair whose `after` already reaches
/// `before` is skipped, so extra edges never close a loop.
pub fn schedule_with(graph: &Graph, extra: &[(usize, usize)]) -> Schedule {
    let n = graph.len();
    let mut adjacency: Vec<Vec<usize>> = (0..n).map(|i| graph.successors(i).to_vec()).collect();
    for &(from, to) in extra {
        if from >= n || to >= n || from == to || adjacency[from].contains(&to) {
            continue;
        }
        if reaches(&adjacency, to, from) {
            tracing::debug!(from, to, "ordering edge would close a loop, skipped");
            continue;
        }
        adjacency[from].push(to);
    }

    let mut in_degree = vec![0usize; n];
    for targets in &adjacency {
        for &t in targets {
            in_degree[t] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    while let Some(node) = queue.pop_front() {
        order.push(node);
        placed[node] = true;
        for &next in &adjacency[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let cyclic: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
    if !cyclic.is_empty() {
        tracing::debug!(count = cyclic.len(), "feedback loop blocks appended in declaration order");
    }
    order.extend(cyclic.iter().copied());
    Schedule { order, cyclic }
}

/// Whether `target` is reachable from `start` along `adjacency`.
fn reaches(adjacency: &[Vec<usize>], start: usize, target: usize) -> bool {
    let mut seen = vec![false; adjacency.len()];
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if std::mem::replace(&mut seen[node], true) {
            continue;
        }
        stack.extend(adjacency[node].iter().copied().filter(|&next| !seen[next]));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Connection, Model};

    fn graph(n: usize, conns: &[(usize, usize)]) -> Graph {
        Graph::new(Model::new(
            (0..n).map(|i| Block::new(i.to_string(), "Gain", format!("b{i}"))).collect(),
            conns
                .iter()
                .map(|(a, b)| Connection::new(a.to_string(), b.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn chain_is_ordered() {
        let g = graph(4, &[(2, 3), (1, 2), (0, 1)]);
        assert_eq!(schedule(&g).order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn fifo_tie_breaking() {
        // 0 -> 2, 1 -> 3: both sources first, then their targets in arrival order.
        let g = graph(4, &[(0, 2), (1, 3)]);
        assert_eq!(schedule(&g).order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cycle_blocks_appended_once() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        let s = schedule(&g);
        assert_eq!(s.order, vec![0, 1, 2, 3]);
        assert_eq!(s.cyclic, vec![1, 2, 3]);
    }

    #[test]
    fn pure_cycle_terminates() {
        let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let s = schedule(&g);
        assert_eq!(s.order, vec![0, 1, 2]);
    }

    #[test]
    fn extra_edges_constrain_order() {
        let g = graph(3, &[]);
        let s = schedule_with(&g, &[(2, 0)]);
        assert_eq!(s.order, vec![1, 2, 0]);
    }

    #[test]
    fn extra_edge_closing_a_loop_is_ignored() {
        // 2 -> 1 -> 0 over wires; the extra 0 -> 2 would make all three cyclic.
        let g = graph(4, &[(2, 1), (1, 0), (1, 3)]);
        let s = schedule_with(&g, &[(0, 2)]);
        assert_eq!(s.order, vec![2, 1, 0, 3]);
        assert!(s.cyclic.is_empty());
    }

    #[test]
    fn accepted_extra_edges_count_toward_later_checks() {
        let g = graph(2, &[]);
        let s = schedule_with(&g, &[(0, 1), (1, 0)]);
        assert_eq!(s.order, vec![0, 1]);
        assert!(s.cyclic.is_empty());
    }
}
