use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::graph::ExecutionGraph;
use super::sequencer::ExecutionOrder;

/// Longest dependency chain of a graph, root first. Reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPath {
    ids: Vec<String>,
}

impl CriticalPath {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Edge count of the chain (`len - 1`), 0 for an empty path.
    pub fn depth(&self) -> usize {
        self.ids.len().saturating_sub(1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }
}

/// Longest path by edge count, computed in execution order.
///
/// depth(n) = 0 without in-graph dependencies, else 1 + max depth of its
/// dependencies. The first dependency reaching that maximum becomes the
/// predecessor, and the first node in `order` with the overall maximum is the
/// end of the path.
pub fn critical_path(graph: &ExecutionGraph, order: &ExecutionOrder) -> CriticalPath {
    let mut depth: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    let mut predecessor: HashMap<&str, &str> = HashMap::new();
    let mut best: Option<(&str, usize)> = None;

    for id in order.iter() {
        let Some(task) = graph.get(id) else {
            continue;
        };

        let mut node_depth = 0;
        let mut pred = None;
        for dep in graph.dependencies_in_graph(task) {
            let Some(&dep_depth) = depth.get(dep) else {
                continue;
            };
            if pred.is_none() || dep_depth + 1 > node_depth {
                node_depth = dep_depth + 1;
                pred = Some(dep);
            }
        }

        depth.insert(task.id.as_str(), node_depth);
        if let Some(p) = pred {
            predecessor.insert(task.id.as_str(), p);
        }
        if best.map_or(true, |(_, d)| node_depth > d) {
            best = Some((task.id.as_str(), node_depth));
        }
    }

    let Some((end, _)) = best else {
        return CriticalPath::default();
    };

    let mut ids = vec![end.to_string()];
    let mut cursor = end;
    while let Some(&prev) = predecessor.get(cursor) {
        ids.push(prev.to_string());
        cursor = prev;
    }
    ids.reverse();

    CriticalPath { ids }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::sequencer::sequence;
    use crate::executor::types::TaskNode;
    use pretty_assertions::assert_eq;

    fn graph(edges: &[(&str, &[&str])]) -> ExecutionGraph {
        ExecutionGraph::from_tasks(
            "g",
            edges.iter().map(|(id, deps)| {
                deps.iter().fold(
                    TaskNode::command(*id, format!("task {id}"), "true"),
                    |n, d| n.depends_on(*d),
                )
            }),
        )
        .unwrap()
    }

    fn path_of(g: &ExecutionGraph) -> CriticalPath {
        let order = sequence(g).unwrap();
        critical_path(g, &order)
    }

    #[test]
    fn fan_out_picks_first_branch() {
        let g = graph(&[("A", &[]), ("B", &["A"]), ("C", &["A"])]);
        let path = path_of(&g);
        assert_eq!(path.ids(), &["A", "B"]);
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn single_node_is_its_own_path() {
        let g = graph(&[("only", &[])]);
        assert_eq!(path_of(&g).ids(), &["only"]);
    }

    #[test]
    fn empty_graph_yields_empty_path() {
        let g = ExecutionGraph::new("g");
        assert!(path_of(&g).is_empty());
    }

    #[test]
    fn longest_chain_wins_over_wide_branch() {
        let g = graph(&[
            ("setup", &[]),
            ("lint", &["setup"]),
            ("compile", &["setup"]),
            ("link", &["compile"]),
            ("package", &["link", "lint"]),
            ("notes", &[]),
        ]);
        let path = path_of(&g);
        assert_eq!(path.ids(), &["setup", "compile", "link", "package"]);
    }

    #[test]
    fn length_is_max_depth_plus_one_and_bounded_by_node_count() {
        let g = graph(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("d", &["a"]),
            ("e", &["d", "c"]),
        ]);
        let path = path_of(&g);
        assert_eq!(path.len(), 4);
        assert!(path.len() <= g.len());
        assert_eq!(path.ids(), &["a", "b", "c", "e"]);
    }
}
