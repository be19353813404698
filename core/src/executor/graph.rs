use std::collections::HashMap;

use crate::error::{ExecutorError, PlannerError};
use crate::executor::types::{TaskNode, TaskStatus};

/// Task dependency graph for one planning cycle.
///
/// Nodes keep their insertion order, which the sequencer uses to break ties.
/// Ids handed out by [`ExecutionGraph::next_id`] are scoped to the graph's
/// namespace, so a recovery graph never aliases its parent.
#[derive(Debug, Clone)]
pub struct ExecutionGraph {
    namespace: String,
    next_seq: u64,

    /// Task nodes in insertion order.
    nodes: Vec<TaskNode>,

    /// task_id -> position in `nodes`
    index: HashMap<String, usize>,
}

impl ExecutionGraph {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_seq: 1,
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Construct a graph from already-identified tasks.
    pub fn from_tasks(
        namespace: impl Into<String>,
        tasks: impl IntoIterator<Item = TaskNode>,
    ) -> Result<Self, PlannerError> {
        let mut graph = Self::new(namespace);
        for task in tasks {
            graph.push(task)?;
        }
        Ok(graph)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Next unused id of the form `{namespace}-{n}`.
    pub fn next_id(&mut self) -> String {
        loop {
            let id = format!("{}-{}", self.namespace, self.next_seq);
            self.next_seq += 1;
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Add a node, enforcing id uniqueness and the node-local invariants.
    pub fn push(&mut self, task: TaskNode) -> Result<&TaskNode, PlannerError> {
        task.validate()?;
        if self.index.contains_key(&task.id) {
            return Err(PlannerError::InvalidTask {
                id: task.id,
                reason: "duplicate task id".to_string(),
            });
        }

        let pos = self.nodes.len();
        self.index.insert(task.id.clone(), pos);
        self.nodes.push(task);
        Ok(&self.nodes[pos])
    }

    pub fn get(&self, id: &str) -> Option<&TaskNode> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskNode> {
        let pos = *self.index.get(id)?;
        self.nodes.get_mut(pos)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    /// Dependencies of `task` that refer to nodes of this graph.
    pub fn dependencies_in_graph<'a>(
        &'a self,
        task: &'a TaskNode,
    ) -> impl Iterator<Item = &'a str> + 'a {
        task.dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| self.contains(dep))
    }

    /// Drop dependencies that point at ids not present in the graph.
    /// Returns the number of edges removed.
    pub fn prune_dangling_dependencies(&mut self) -> usize {
        let index = &self.index;
        let mut removed = 0;
        for node in &mut self.nodes {
            let before = node.dependencies.len();
            let task_id = node.id.clone();
            node.dependencies.retain(|dep| {
                let keep = index.contains_key(dep);
                if !keep {
                    tracing::debug!(task_id = %task_id, dependency = %dep, "dropping dangling dependency");
                }
                keep
            });
            removed += before - node.dependencies.len();
        }
        removed
    }

    pub(crate) fn transition(
        &mut self,
        id: &str,
        next: TaskStatus,
    ) -> Result<(), ExecutorError> {
        let node = self
            .get_mut(id)
            .ok_or_else(|| ExecutorError::TaskNotFound(id.to_string()))?;
        node.transition(next)
    }

    /// Return every node to `Pending`, for re-running a plan from scratch.
    pub fn reset_statuses(&mut self) {
        for node in &mut self.nodes {
            node.status = TaskStatus::Pending;
            node.retry_count = 0;
        }
    }
}
