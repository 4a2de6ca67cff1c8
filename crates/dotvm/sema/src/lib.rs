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

//! Semantic analysis core of the DotVM compiler
//!
//! Analyses such as import resolution, name resolution and type checking are
//! expressed as requests answered on demand by an [`Evaluator`]. Each analysis
//! subsystem owns a [`ZoneId`], declares its requests as a sum type implementing
//! [`ZoneRequest`], and registers a [`RequestFunctions`] table with the
//! [`ZoneRegistry`] at startup. The evaluator memoizes results, detects requests
//! that depend on themselves, and reports each cycle once as a [`CycleDiagnostic`].
//!
//! ```ignore
//! let mut registry = ZoneRegistry::new();
//! registry.register::<TypeRequest, _>(TypeChecker::new(module));
//!
//! let mut evaluator = Evaluator::new(Arc::new(registry), EvaluatorOptions::default());
//! let ty = evaluator.evaluate_or_else(TypeOf(decl), |_| Type::Unknown);
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod registry;
pub mod request;
pub mod stack;
pub mod stats;
pub mod zone;

pub use cache::CacheState;
pub use config::EvaluatorOptions;
pub use diagnostics::{CycleDiagnostic, DiagnosticSink, RequestDescription};
pub use error::{EvaluationError, EvaluationResult, RegistryError};
pub use evaluator::Evaluator;
pub use graph::RequestGraph;
pub use registry::{RequestFunctions, ZoneRegistry};
pub use request::{AnyRequest, CachePolicy, Request, RequestKind, ZoneRequest};
pub use stats::EvaluatorStats;
pub use zone::ZoneId;
