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

//! Requests: immutable descriptions of "compute X given these inputs".
//!
//! Each zone declares a closed sum type of its requests ([`ZoneRequest`]) with one
//! variant per request kind, and a matching sum type of results. Individual query
//! shapes implement [`Request`] to get a typed output out of the zone's result type.
//!
//! The evaluator itself never names a zone's types. It works on [`AnyRequest`], a
//! shared handle that keeps equality and hashing of the concrete request, so a single
//! cache, stack and dependency graph can hold requests from every zone.

use crate::zone::ZoneId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether results of a request kind are memoized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CachePolicy {
    Cached,
    Uncached,
}

/// The closed set of request kinds owned by one zone.
///
/// Implemented by a fieldless enum with one variant per query shape.
pub trait RequestKind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every kind the zone declares. Registration checks tables against this list.
    const ALL: &'static [Self];

    /// Name used in diagnostics, e.g. `TypeOf`
    fn name(self) -> &'static str;

    fn cache_policy(self) -> CachePolicy {
        CachePolicy::Cached
    }
}

/// A zone's request sum type.
///
/// Inputs must be values or stable identifiers of program entities, never handles to
/// mutable state: two equal requests always denote the same computation.
pub trait ZoneRequest: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Owning zone
    const ZONE: ZoneId;

    /// Kind enum of this zone
    type Kind: RequestKind;

    /// Result sum type of this zone
    type Value: Clone + fmt::Debug + Send + Sync + 'static;

    /// Kind of this request
    fn kind(&self) -> Self::Kind;

    /// Write the request's inputs, without the kind name or parentheses.
    fn write_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// A single typed query shape.
///
/// `Into<Self::Zone>` wraps the query in its zone's sum type; [`Request::project`]
/// extracts the typed output from the zone's result.
pub trait Request: Clone + Into<Self::Zone> + Send + Sync + 'static {
    type Zone: ZoneRequest;
    type Output: Clone + fmt::Debug + Send + Sync + 'static;

    /// Extract this query's output from the zone result. `None` means the zone's
    /// computation table returned a result of the wrong shape.
    fn project(value: <Self::Zone as ZoneRequest>::Value) -> Option<Self::Output>;
}

/// Object-safe view of a [`ZoneRequest`], implemented for every zone request type.
pub trait DynRequest: Send + Sync + 'static {
    fn zone_id(&self) -> ZoneId;
    fn kind_name(&self) -> &'static str;
    fn policy(&self) -> CachePolicy;
    fn fmt_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynRequest) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<Z: ZoneRequest> DynRequest for Z {
    fn zone_id(&self) -> ZoneId {
        Z::ZONE
    }

    fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    fn policy(&self) -> CachePolicy {
        self.kind().cache_policy()
    }

    fn fmt_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ZoneRequest::write_inputs(self, f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynRequest) -> bool {
        other.as_any().downcast_ref::<Z>().is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        Hash::hash(self, &mut state);
    }
}

impl<'a> PartialEq for dyn DynRequest + 'a {
    fn eq(&self, other: &Self) -> bool {
        self.zone_id() == other.zone_id() && self.dyn_eq(other)
    }
}

impl<'a> Eq for dyn DynRequest + 'a {}

impl<'a> Hash for dyn DynRequest + 'a {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.zone_id().hash(state);
        self.dyn_hash(state);
    }
}

/// Shared, type-erased request handle.
///
/// Cloning is cheap. Equality and hashing follow the wrapped request, and a borrowed
/// `&dyn DynRequest` hashes identically, so maps keyed by `AnyRequest` can be probed
/// with a concrete request without allocating.
#[derive(Clone)]
pub struct AnyRequest(Arc<dyn DynRequest>);

impl AnyRequest {
    pub fn new<Z: ZoneRequest>(request: Z) -> Self {
        Self(Arc::new(request))
    }

    /// Wrap a typed query in its zone request
    pub fn of<Q: Request>(request: Q) -> Self {
        let request: Q::Zone = request.into();
        Self::new(request)
    }

    pub fn zone(&self) -> ZoneId {
        self.0.zone_id()
    }

    pub fn kind_name(&self) -> &'static str {
        self.0.kind_name()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.0.policy()
    }

    pub fn is_cacheable(&self) -> bool {
        self.cache_policy() == CachePolicy::Cached
    }

    /// Recover the concrete zone request
    pub fn downcast_ref<Z: ZoneRequest>(&self) -> Option<&Z> {
        self.0.as_any().downcast_ref()
    }

    pub fn as_dyn(&self) -> &dyn DynRequest {
        &*self.0
    }
}

impl PartialEq for AnyRequest {
    fn eq(&self, other: &Self) -> bool {
        self.as_dyn() == other.as_dyn()
    }
}

impl Eq for AnyRequest {}

impl Hash for AnyRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(self.as_dyn(), state);
    }
}

impl<'a> Borrow<dyn DynRequest + 'a> for AnyRequest {
    fn borrow(&self) -> &(dyn DynRequest + 'a) {
        &*self.0
    }
}

/// Renders `Kind(inputs)`
impl fmt::Display for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind_name())?;
        self.0.fmt_inputs(f)?;
        f.write_str(")")
    }
}

impl fmt::Debug for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyRequest({}::{})", self.zone(), self)
    }
}
