//! Small directed graphs over string nodes
//!
//! Used to validate mapping relations (namespace renames) before any
//! comparison work starts.

use std::collections::{HashMap, HashSet};

/// Directed graph keyed by node name, preserving insertion order
#[derive(Debug, Clone, Default)]
pub struct NameGraph {
    /// Forward edges: node -> successors in insertion order
    edges: HashMap<String, Vec<String>>,

    /// Nodes in first-seen order
    order: Vec<String>,
}

impl NameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to)` pairs
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.touch(from);
        self.touch(to);
        if let Some(successors) = self.edges.get_mut(from) {
            successors.push(to.to_string());
        }
    }

    fn touch(&mut self, node: &str) {
        if !self.edges.contains_key(node) {
            self.edges.insert(node.to_string(), Vec::new());
            self.order.push(node.to_string());
        }
    }

    pub fn successors(&self, node: &str) -> &[String] {
        self.edges.get(node).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// Find a cycle, returned as the path that closes on its first node
    ///
    /// Depth-first traversal with an explicit recursion stack. A self-loop is
    /// reported as a cycle of length one (`[a, a]`).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut finished: HashSet<&str> = HashSet::new();

        for start in &self.order {
            if finished.contains(start.as_str()) {
                continue;
            }

            // (node, index of next successor to visit)
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            let mut on_stack: HashSet<&str> = HashSet::new();
            on_stack.insert(start.as_str());

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let successors = self.successors(node);

                if next >= successors.len() {
                    stack.pop();
                    on_stack.remove(node);
                    finished.insert(node);
                    continue;
                }

                frame.1 += 1;
                let succ = successors[next].as_str();

                if on_stack.contains(succ) {
                    let pos = stack.iter().position(|(n, _)| *n == succ).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[pos..].iter().map(|(n, _)| n.to_string()).collect();
                    cycle.push(succ.to_string());
                    return Some(cycle);
                }

                if !finished.contains(succ) {
                    on_stack.insert(succ);
                    stack.push((succ, 0));
                }
            }
        }

        None
    }

    /// All nodes reachable from `node` (excluding itself unless on a cycle),
    /// in depth-first pre-order following edge insertion order
    pub fn reachable(&self, node: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        self.visit(node, &mut visited, &mut result);
        result
    }

    fn visit<'a>(&'a self, node: &str, visited: &mut HashSet<&'a str>, result: &mut Vec<String>) {
        for succ in self.successors(node) {
            if visited.insert(succ.as_str()) {
                result.push(succ.clone());
                self.visit(succ, visited, result);
            }
        }
    }
}

/// Convenience wrapper: find a cycle in a list of string edges
pub fn find_cycle<'a, I>(edges: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    NameGraph::from_edges(edges).find_cycle()
}
