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

//! Error types for request evaluation and zone registration

use crate::zone::ZoneId;
use thiserror::Error;

/// Failures an [`Evaluator`](crate::Evaluator) reports to the caller of `evaluate`.
///
/// Both variants are recoverable at the compilation level: the caller substitutes a
/// degraded value and carries on so that independent diagnostics still surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Circular dependency detected while evaluating {request}")]
    CycleDetected { request: String },

    #[error("Request depth limit {limit} exceeded while evaluating {request}")]
    DepthLimitExceeded { request: String, limit: usize },
}

impl EvaluationError {
    /// Whether this failure was produced by cycle detection
    pub fn is_cycle(&self) -> bool {
        matches!(self, EvaluationError::CycleDetected { .. })
    }
}

/// Result type for request evaluation
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors raised by the zone registry.
///
/// These describe programming errors in the compiler itself. Startup code calls
/// [`ZoneRegistry::register`](crate::ZoneRegistry::register), which aborts on any of
/// them; the evaluator treats lookup failures the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Zone {zone} is already registered")]
    ZoneAlreadyRegistered { zone: ZoneId },

    #[error("Request table for zone {zone} is missing kinds: {}", missing.join(", "))]
    IncompleteTable { zone: ZoneId, missing: Vec<&'static str> },

    #[error("No request table registered for zone {zone}")]
    UnregisteredZone { zone: ZoneId },

    #[error("Zone {zone} is registered with a different request type")]
    ZoneTypeMismatch { zone: ZoneId },
}
