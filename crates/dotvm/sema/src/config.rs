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

//! Configuration types for the request evaluator

use serde::{Deserialize, Serialize};

/// Default bound on nested request evaluations
pub const DEFAULT_MAX_REQUEST_DEPTH: usize = 4096;

/// Options recognized when an [`Evaluator`](crate::Evaluator) is constructed.
///
/// Defaults favor observability while the analyses are young: cycles are dumped and
/// request references are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorOptions {
    /// Also write every detected cycle's stack trace to the debug log
    pub debug_dump_cycles: bool,
    /// Build the caller → callee request graph
    pub record_request_references: bool,
    /// Maximum number of simultaneously active requests. Evaluation recurses on the
    /// host stack, so this bounds native stack use.
    pub max_request_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            debug_dump_cycles: true,
            record_request_references: true,
            max_request_depth: DEFAULT_MAX_REQUEST_DEPTH,
        }
    }
}

impl EvaluatorOptions {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the cycle dump
    pub fn with_debug_dump_cycles(mut self, enable: bool) -> Self {
        self.debug_dump_cycles = enable;
        self
    }

    /// Enable or disable recording of request references
    pub fn with_request_references(mut self, enable: bool) -> Self {
        self.record_request_references = enable;
        self
    }

    pub fn with_max_request_depth(mut self, depth: usize) -> Self {
        self.max_request_depth = depth;
        self
    }

    /// Quiet options for production builds: no dump, no graph
    pub fn minimal() -> Self {
        Self::default().with_debug_dump_cycles(false).with_request_references(false)
    }
}
