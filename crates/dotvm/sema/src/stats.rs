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

//! Evaluator statistics

use serde::Serialize;

/// Counters kept by an evaluator over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluatorStats {
    /// Evaluations answered from the cache
    pub cache_hits: u64,
    /// Evaluations not answered from the cache, cycles included
    pub cache_misses: u64,
    /// Computation functions invoked
    pub computations: u64,
    /// Cycle detections, including repeats of a known cycle
    pub cycles_detected: u64,
    /// Cycle diagnostics emitted, one per distinct cycle
    pub diagnostics_emitted: u64,
    /// Cycle traces written to the debug log
    pub cycles_dumped: u64,
    /// Evaluations refused by the depth limit
    pub depth_limit_hits: u64,
    /// Results left uncached because an evaluation beneath them hit the depth limit
    pub results_abandoned: u64,
}

impl EvaluatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of evaluations answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 { 0.0 } else { self.cache_hits as f64 / total as f64 }
    }
}
