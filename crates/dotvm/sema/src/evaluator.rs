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

//! Demand-driven request evaluator
//!
//! [`Evaluator::evaluate`] answers a request by running the computation registered
//! for its zone, memoizing the result for cacheable kinds, and detecting requests that
//! transitively depend on themselves.
//!
//! Evaluation is synchronous and re-entrant: a computation function receives the
//! evaluator and may evaluate further requests, which complete before control returns
//! to it. Recursion happens on the host stack, so the depth of the request dependency
//! graph is bounded by [`EvaluatorOptions::max_request_depth`].
//!
//! An evaluator owns its cache and active stack exclusively and is not shared across
//! threads. Parallel analyses use one evaluator each over a shared
//! `Arc<ZoneRegistry>`.
//!
//! A request whose re-entry broke a cycle is not poisoned. The repeated occurrence
//! fails with [`EvaluationError::CycleDetected`] and nothing is cached for it; the
//! outer occurrence still completes and is cached normally, and a later evaluation
//! outside the cycle runs as usual.
//!
//! A depth-limit refusal depends on the chain that led to it rather than on the
//! request. Every request active at the time of a refusal still returns its value to
//! its caller, but that value is not cached, so a later evaluation from a shallower
//! point computes the real result.

use crate::cache::{CacheState, RequestCache};
use crate::config::EvaluatorOptions;
use crate::diagnostics::{CYCLE_DUMP_TARGET, CycleDiagnostic, CycleReporter, DiagnosticSink, RequestDescription};
use crate::error::{EvaluationError, EvaluationResult};
use crate::graph::RequestGraph;
use crate::registry::ZoneRegistry;
use crate::request::{AnyRequest, CachePolicy, Request, RequestKind, ZoneRequest};
use crate::stack::ActiveRequestStack;
use crate::stats::EvaluatorStats;
use std::sync::Arc;
use tracing::{debug, debug_span, error, trace, warn};

/// Evaluates requests on demand against a shared zone registry
pub struct Evaluator {
    registry: Arc<ZoneRegistry>,
    options: EvaluatorOptions,
    cache: RequestCache,
    stack: ActiveRequestStack,
    graph: Option<RequestGraph>,
    reporter: CycleReporter,
    stats: EvaluatorStats,
}

impl Evaluator {
    /// Create an evaluator with an empty cache
    pub fn new(registry: Arc<ZoneRegistry>, options: EvaluatorOptions) -> Self {
        let graph = options.record_request_references.then(RequestGraph::new);
        Self {
            registry,
            options,
            cache: RequestCache::new(),
            stack: ActiveRequestStack::new(),
            graph,
            reporter: CycleReporter::default(),
            stats: EvaluatorStats::new(),
        }
    }

    pub fn with_default_options(registry: Arc<ZoneRegistry>) -> Self {
        Self::new(registry, EvaluatorOptions::default())
    }

    /// Evaluate `request`, computing it if needed.
    ///
    /// Failures of the computation itself are part of `Q::Output` and are returned
    /// unchanged. An `Err` means the evaluator refused to run the computation: the
    /// request is already active (a cycle, reported once per distinct cycle) or the
    /// depth limit was reached.
    ///
    /// # Panics
    ///
    /// If the request's zone has no registered table, or the table returns a result of
    /// the wrong shape. Both are compiler bugs.
    pub fn evaluate<Q: Request>(&mut self, request: Q) -> EvaluationResult<Q::Output> {
        let request: Q::Zone = request.into();
        let value = self.evaluate_in_zone(request)?;
        match Q::project(value) {
            Some(output) => Ok(output),
            None => panic!(
                "request table for zone {} returned a result of the wrong shape for {}",
                <Q::Zone as ZoneRequest>::ZONE,
                std::any::type_name::<Q>()
            ),
        }
    }

    /// Evaluate `request`, substituting `fallback(err)` if the evaluator refused it
    pub fn evaluate_or_else<Q, F>(&mut self, request: Q, fallback: F) -> Q::Output
    where
        Q: Request,
        F: FnOnce(EvaluationError) -> Q::Output,
    {
        self.evaluate(request).unwrap_or_else(fallback)
    }

    /// Evaluate `request`, substituting the default output if the evaluator refused it
    pub fn evaluate_or_default<Q>(&mut self, request: Q) -> Q::Output
    where
        Q: Request,
        Q::Output: Default,
    {
        self.evaluate(request).unwrap_or_default()
    }

    fn evaluate_in_zone<Z: ZoneRequest>(&mut self, request: Z) -> EvaluationResult<Z::Value> {
        let policy = request.kind().cache_policy();

        if policy == CachePolicy::Cached {
            if let Some(value) = self.cache.get::<Z::Value>(&request) {
                self.stats.cache_hits += 1;
                trace!(request = ?request, "Cache hit");
                if self.graph.is_some() && !self.stack.is_empty() {
                    self.record_reference(AnyRequest::new(request));
                }
                return Ok(value);
            }
        }
        self.stats.cache_misses += 1;

        let key = AnyRequest::new(request.clone());
        if let Some(start) = self.stack.position(&key) {
            return Err(self.break_cycle(start, &key));
        }
        if policy == CachePolicy::Cached && self.cache.state(&request) == CacheState::InProgress {
            panic!("{key} is marked in progress but is not on the active request stack");
        }

        let limit = self.options.max_request_depth;
        if self.stack.depth() >= limit {
            self.stats.depth_limit_hits += 1;
            self.stack.taint_active();
            error!(request = %key, limit, "Request depth limit exceeded");
            return Err(EvaluationError::DepthLimitExceeded {
                request: key.to_string(),
                limit,
            });
        }

        let functions = match self.registry.lookup::<Z>() {
            Ok(functions) => functions,
            Err(err) => panic!("internal evaluator error while evaluating {key}: {err}"),
        };

        self.stack.push(key.clone());
        if policy == CachePolicy::Cached {
            self.cache.mark_in_progress(key.clone());
        }

        let value = {
            let _span = debug_span!("evaluate", request = %key).entered();
            functions.compute(&request, self)
        };

        let depth_limited = self.stack.pop(&key);
        self.stats.computations += 1;

        if policy == CachePolicy::Cached {
            if depth_limited {
                // The result reflects how deep this chain was, not the request itself
                self.cache.abandon(&key);
                self.stats.results_abandoned += 1;
                debug!(request = %key, "Result depends on a depth-limited evaluation, not cached");
            } else {
                self.cache.complete(&key, value.clone());
            }
        }
        if self.graph.is_some() && !self.stack.is_empty() {
            self.record_reference(key);
        }
        Ok(value)
    }

    /// Report the cycle closed by re-entering the active request at `start`
    fn break_cycle(&mut self, start: usize, repeated: &AnyRequest) -> EvaluationError {
        self.stats.cycles_detected += 1;

        let cycle = self.stack.cycle_from(start);
        let diagnostic = CycleDiagnostic::from_cycle(&cycle);
        if self.options.debug_dump_cycles {
            self.stats.cycles_dumped += 1;
            debug!(target: CYCLE_DUMP_TARGET, "{}", diagnostic.render_tree());
        }

        let rendered = diagnostic.to_string();
        if self.reporter.report(&cycle, diagnostic) {
            self.stats.diagnostics_emitted += 1;
            warn!(cycle = %rendered, "Circular dependency detected");
        }

        EvaluationError::CycleDetected {
            request: repeated.to_string(),
        }
    }

    /// Record an edge from the active request to `callee`
    fn record_reference(&mut self, callee: AnyRequest) {
        if let (Some(graph), Some(caller)) = (self.graph.as_mut(), self.stack.top()) {
            graph.record(caller, &callee);
        }
    }

    /// Cache state of `request`
    pub fn cache_state<Q: Request>(&self, request: &Q) -> CacheState {
        let request: Q::Zone = request.clone().into();
        self.cache.state(&request)
    }

    /// Whether a result for `request` is memoized
    pub fn is_cached<Q: Request>(&self, request: &Q) -> bool {
        self.cache_state(request) == CacheState::Done
    }

    /// Number of memoized results
    pub fn cached_results(&self) -> usize {
        self.cache.done_count()
    }

    /// Number of requests currently being computed
    pub fn active_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Requests currently being computed, oldest first
    pub fn active_requests(&self) -> Vec<RequestDescription> {
        self.stack.iter().map(RequestDescription::from).collect()
    }

    pub fn stats(&self) -> &EvaluatorStats {
        &self.stats
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<ZoneRegistry> {
        &self.registry
    }

    /// Cycle diagnostics emitted so far
    pub fn diagnostics(&self) -> &[CycleDiagnostic] {
        self.reporter.emitted()
    }

    /// Drain emitted cycle diagnostics. Shapes already reported stay suppressed.
    pub fn take_diagnostics(&mut self) -> Vec<CycleDiagnostic> {
        self.reporter.take_emitted()
    }

    /// Forward each new cycle diagnostic to `sink` as it is emitted
    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.reporter.set_sink(sink);
    }

    /// Recorded request references, if enabled
    pub fn dependency_graph(&self) -> Option<&RequestGraph> {
        self.graph.as_ref()
    }
}
