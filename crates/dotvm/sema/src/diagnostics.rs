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

//! Cycle diagnostics
//!
//! A cycle is described purely from requests that are already on the active stack.
//! Nothing here calls back into the evaluator, so reporting a failure cannot cause
//! another one.

use crate::request::AnyRequest;
use crate::zone::ZoneId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Tracing target of the cycle dump
pub const CYCLE_DUMP_TARGET: &str = "dotvm_sema::cycles";

/// Snapshot of a request for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestDescription {
    pub zone: ZoneId,
    pub kind: &'static str,
    /// `Kind(inputs)`
    pub rendered: String,
}

impl From<&AnyRequest> for RequestDescription {
    fn from(request: &AnyRequest) -> Self {
        Self {
            zone: request.zone(),
            kind: request.kind_name(),
            rendered: request.to_string(),
        }
    }
}

/// `Kind(inputs)`, or `Zone::Kind(inputs)` with `{:#}`
impl fmt::Display for RequestDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}::{}", self.zone, self.rendered)
        } else {
            f.write_str(&self.rendered)
        }
    }
}

/// A dependency cycle, in dependency order.
///
/// The path starts at the first active occurrence of the repeated request, runs to the
/// request that tried to re-enter it, and ends with the repeated request again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleDiagnostic {
    path: Vec<RequestDescription>,
}

impl CycleDiagnostic {
    /// Build from a closed cycle whose last element repeats the first
    pub fn from_cycle(cycle: &[AnyRequest]) -> Self {
        debug_assert!(cycle.len() >= 2 && cycle.first() == cycle.last(), "cycle must be closed");
        Self {
            path: cycle.iter().map(RequestDescription::from).collect(),
        }
    }

    /// Full path including the closing repetition
    pub fn path(&self) -> &[RequestDescription] {
        &self.path
    }

    /// Distinct requests taking part in the cycle
    pub fn requests(&self) -> &[RequestDescription] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    pub fn cycle_length(&self) -> usize {
        self.requests().len()
    }

    /// The request whose re-entry closed the cycle
    pub fn repeated(&self) -> &RequestDescription {
        &self.path[0]
    }

    /// Indented stack trace used by the debug dump
    pub fn render_tree(&self) -> String {
        let mut out = String::from("===CYCLE DETECTED===\n");
        let last = self.path.len() - 1;
        for (depth, request) in self.path.iter().enumerate() {
            out.push(' ');
            out.push_str(&"   ".repeat(depth));
            out.push_str(&format!("`--{request:#}"));
            if depth == last {
                out.push_str(" (cyclic dependency)");
            }
            out.push('\n');
        }
        out
    }
}

/// `TypeOf(5) → SizeOf(5) → TypeOf(5)`
impl fmt::Display for CycleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, request) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" → ")?;
            }
            write!(f, "{request}")?;
        }
        Ok(())
    }
}

/// Receiver of cycle diagnostics, typically the driver's diagnostic engine
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send {
    fn report_cycle(&mut self, diagnostic: &CycleDiagnostic);
}

/// Emits each distinct cycle shape once
#[derive(Default)]
pub(crate) struct CycleReporter {
    /// Reported cycles, bucketed by rendered shape
    seen: HashMap<Vec<(ZoneId, String)>, Vec<Vec<AnyRequest>>>,
    emitted: Vec<CycleDiagnostic>,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl CycleReporter {
    pub(crate) fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = Some(sink);
    }

    /// Record a detected cycle. Returns false if the same shape was already reported.
    pub(crate) fn report(&mut self, cycle: &[AnyRequest], diagnostic: CycleDiagnostic) -> bool {
        let members = cycle_members(cycle);
        let known = self.seen.entry(rendered_shape(members)).or_default();
        if known.iter().any(|seen| is_rotation(seen, members)) {
            return false;
        }
        known.push(members.to_vec());
        if let Some(sink) = self.sink.as_mut() {
            sink.report_cycle(&diagnostic);
        }
        self.emitted.push(diagnostic);
        true
    }

    pub(crate) fn emitted(&self) -> &[CycleDiagnostic] {
        &self.emitted
    }

    pub(crate) fn take_emitted(&mut self) -> Vec<CycleDiagnostic> {
        std::mem::take(&mut self.emitted)
    }
}

/// A closed cycle without its closing repetition
fn cycle_members(cycle: &[AnyRequest]) -> &[AnyRequest] {
    &cycle[..cycle.len().saturating_sub(1)]
}

/// Smallest rotation of the rendered members: A→B→A and B→A→B share a shape.
///
/// Distinct requests may render alike, so equal shapes are only a candidate match.
fn rendered_shape(members: &[AnyRequest]) -> Vec<(ZoneId, String)> {
    let rendered: Vec<(ZoneId, String)> = members.iter().map(|request| (request.zone(), request.to_string())).collect();
    (0..rendered.len())
        .map(|start| rendered[start..].iter().chain(&rendered[..start]).cloned().collect::<Vec<_>>())
        .min()
        .unwrap_or_default()
}

/// Whether `b` is the cycle `a` entered at some member
fn is_rotation(a: &[AnyRequest], b: &[AnyRequest]) -> bool {
    a.len() == b.len() && (a.is_empty() || (0..a.len()).any(|start| a[start..].iter().chain(&a[..start]).eq(b)))
}
