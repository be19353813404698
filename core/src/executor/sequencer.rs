use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;

use super::graph::ExecutionGraph;

/// A total order over task ids consistent with the dependency partial order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOrder {
    ids: Vec<String>,
}

impl ExecutionOrder {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Linearise the graph with a depth-first, three-color traversal.
///
/// Roots are visited in insertion order and each node's dependencies in
/// declaration order, so the result is deterministic. Dependencies that name
/// ids outside the graph are ignored. Reaching an in-progress node is a cycle
/// and fails immediately with the offending path.
///
/// # Time Complexity
///
/// O(V + E)
pub fn sequence(graph: &ExecutionGraph) -> Result<ExecutionOrder, ExecutorError> {
    let nodes = graph.nodes();
    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut ids = Vec::with_capacity(nodes.len());

    // (node position, index of the next dependency to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..nodes.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (pos, cursor) = *frame;
            let deps = &nodes[pos].dependencies;

            if cursor < deps.len() {
                frame.1 += 1;
                let Some(dep_pos) = graph.position(&deps[cursor]) else {
                    continue;
                };
                match marks[dep_pos] {
                    Mark::Done => {}
                    Mark::InProgress => return Err(cycle_error(graph, &stack, dep_pos)),
                    Mark::Unvisited => {
                        marks[dep_pos] = Mark::InProgress;
                        stack.push((dep_pos, 0));
                    }
                }
            } else {
                marks[pos] = Mark::Done;
                ids.push(nodes[pos].id.clone());
                stack.pop();
            }
        }
    }

    Ok(ExecutionOrder { ids })
}

fn cycle_error(graph: &ExecutionGraph, stack: &[(usize, usize)], reentered: usize) -> ExecutorError {
    let nodes = graph.nodes();
    let start = stack
        .iter()
        .position(|&(pos, _)| pos == reentered)
        .unwrap_or(0);
    let mut cycle: Vec<String> = stack[start..]
        .iter()
        .map(|&(pos, _)| nodes[pos].id.clone())
        .collect();
    cycle.push(nodes[reentered].id.clone());
    ExecutorError::CircularDependency { cycle }
}
