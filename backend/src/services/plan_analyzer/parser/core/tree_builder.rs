//! Tree builder for plan nodes
//!
//! Recovers parent/child structure purely from indentation with a stack of
//! `(level, node id)` pairs. One left-to-right pass, no re-parenting.

use crate::services::plan_analyzer::models::{PlanNode, ROOT_PARENT_ID};
use crate::services::plan_analyzer::parser::core::{MetricsParser, OperatorMatch};
use crate::services::plan_analyzer::parser::error::{ParseError, ParseResult};
use std::collections::HashSet;

/// Builder for the node arena
pub struct TreeBuilder {
    max_depth: usize,
}

impl TreeBuilder {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Build the parent-linked node list from ordered plan lines
    pub fn build<S: AsRef<str>>(&self, lines: &[S]) -> ParseResult<Vec<PlanNode>> {
        let mut nodes: Vec<PlanNode> = Vec::new();
        let mut stack: Vec<(usize, i32)> = Vec::new();
        let mut next_id: i32 = 0;

        for (line_no, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let trimmed = line.trim();

            let Some(op) = OperatorMatch::parse(trimmed) else {
                // Continuation text belongs to the most recent node
                if let Some(last) = nodes.last_mut() {
                    MetricsParser::apply_detail(last, trimmed);
                }
                continue;
            };

            let metrics = MetricsParser::parse_line(line, &op.operation);

            while stack.last().is_some_and(|(level, _)| *level >= metrics.indent) {
                stack.pop();
            }
            let parent_id = stack.last().map(|(_, id)| *id).unwrap_or(ROOT_PARENT_ID);
            let depth = stack.len();
            if depth >= self.max_depth {
                return Err(ParseError::TooDeep { limit: self.max_depth, line: line_no + 1 });
            }
            stack.push((metrics.indent, next_id));

            nodes.push(PlanNode {
                id: next_id,
                parent_id,
                operation: op.operation,
                operator: op.kind,
                indent: metrics.indent,
                depth,
                cost: metrics.cost,
                time: metrics.time,
                rows: metrics.rows,
                planned_rows: metrics.planned_rows,
                row_counts: metrics.row_counts,
                width: metrics.width,
                object_name: metrics.object_name,
                alias: metrics.alias,
                index_name: metrics.index_name,
                loops: metrics.loops,
                workers: None,
                buffers: None,
                filter: None,
                details: Vec::new(),
                never_executed: metrics.never_executed,
            });
            next_id += 1;
        }

        Ok(nodes)
    }
}

/// Read-only view over a parsed node arena
pub struct PlanTree<'a> {
    nodes: &'a [PlanNode],
}

impl<'a> PlanTree<'a> {
    pub fn new(nodes: &'a [PlanNode]) -> Self {
        Self { nodes }
    }

    pub fn get(&self, id: i32) -> Option<&'a PlanNode> {
        usize::try_from(id).ok().and_then(|idx| self.nodes.get(idx))
    }

    /// Top-level nodes
    pub fn roots(&self) -> impl Iterator<Item = &'a PlanNode> {
        self.nodes.iter().filter(|n| n.is_root())
    }

    /// Direct children, found by scanning parent ids
    pub fn children(&self, id: i32) -> impl Iterator<Item = &'a PlanNode> {
        self.nodes.iter().filter(move |n| n.parent_id == id)
    }

    /// Leaf nodes (nodes with no children)
    pub fn leaves(&self) -> Vec<i32> {
        let parents: HashSet<i32> = self.nodes.iter().map(|n| n.parent_id).collect();
        self.nodes.iter().filter(|n| !parents.contains(&n.id)).map(|n| n.id).collect()
    }

    /// Check the arena invariants: dense ids, parents precede children
    pub fn validate(&self) -> Result<(), String> {
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.id != idx as i32 {
                return Err(format!("Node at position {} has id {}", idx, node.id));
            }
            if node.parent_id != ROOT_PARENT_ID
                && (node.parent_id < 0 || node.parent_id >= node.id)
            {
                return Err(format!(
                    "Node {} references parent {} that does not precede it",
                    node.id, node.parent_id
                ));
            }
        }
        // Parents strictly precede children, so every chain ends at a root
        Ok(())
    }
}
