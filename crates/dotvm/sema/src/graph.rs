// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Request dependency graph, recorded for incremental-rebuild tooling

use crate::request::AnyRequest;
use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

/// Node in the request graph
#[derive(Debug, Clone)]
pub struct RequestNode {
    pub request: AnyRequest,
}

impl fmt::Display for RequestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.request.zone(), self.request)
    }
}

/// Edge from a caller request to a request it evaluated
#[derive(Debug, Clone, Copy)]
pub struct RequestEdge;

impl fmt::Display for RequestEdge {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// Request graph type alias
pub type RequestDependencyGraph = DiGraph<RequestNode, RequestEdge>;

/// Caller → callee edges between evaluated requests.
///
/// Each caller/callee pair is stored once, however many times it was evaluated.
#[derive(Debug, Default)]
pub struct RequestGraph {
    graph: RequestDependencyGraph,
    indices: HashMap<AnyRequest, NodeIndex>,
}

impl RequestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if not exists, returns its index
    pub fn add_node(&mut self, request: &AnyRequest) -> NodeIndex {
        if let Some(&idx) = self.indices.get(request) {
            return idx;
        }
        let idx = self.graph.add_node(RequestNode { request: request.clone() });
        self.indices.insert(request.clone(), idx);
        idx
    }

    /// Record that `caller` evaluated `callee`
    pub fn record(&mut self, caller: &AnyRequest, callee: &AnyRequest) {
        let u = self.add_node(caller);
        let v = self.add_node(callee);
        self.graph.update_edge(u, v, RequestEdge);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_edge(&self, caller: &AnyRequest, callee: &AnyRequest) -> bool {
        match (self.indices.get(caller), self.indices.get(callee)) {
            (Some(&u), Some(&v)) => self.graph.contains_edge(u, v),
            _ => false,
        }
    }

    /// Requests evaluated by `caller`, in recording order
    pub fn callees(&self, caller: &AnyRequest) -> Vec<AnyRequest> {
        let Some(&idx) = self.indices.get(caller) else {
            return Vec::new();
        };
        let mut callees: Vec<AnyRequest> = self.graph.neighbors_directed(idx, Direction::Outgoing).map(|n| self.graph[n].request.clone()).collect();
        // petgraph walks outgoing edges newest first
        callees.reverse();
        callees
    }

    /// Requests that evaluated `callee`
    pub fn callers(&self, callee: &AnyRequest) -> Vec<AnyRequest> {
        let Some(&idx) = self.indices.get(callee) else {
            return Vec::new();
        };
        let mut callers: Vec<AnyRequest> = self.graph.neighbors_directed(idx, Direction::Incoming).map(|n| self.graph[n].request.clone()).collect();
        callers.reverse();
        callers
    }

    /// Every edge as rendered `(caller, callee)` pairs, in recording order
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(u, v)| (self.graph[u].request.to_string(), self.graph[v].request.to_string()))
            .collect()
    }

    /// Graphviz rendering
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }

    pub fn graph(&self) -> &RequestDependencyGraph {
        &self.graph
    }
}
