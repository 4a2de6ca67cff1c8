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

//! Test zones over a small declaration table
//!
//! `TypeChecker` answers `TypeOf` and `SizeOf` for declarations; `NameResolution`
//! answers uncached `Lookup` of exported names and cached `ResolveType`, which crosses
//! into the type checker.

#![allow(dead_code)]

use dotvm_sema::{CachePolicy, EvaluationError, Evaluator, EvaluatorOptions, Request, RequestFunctions, RequestKind, ZoneId, ZoneRegistry, ZoneRequest};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type DeclId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    I32,
    I64,
    Alias(DeclId),
    Struct(Vec<DeclId>),
    /// Type picked from the declaration's size, size taken from its type
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Decl(DeclId),
    Reexport(String),
}

/// Immutable program data the zones read
#[derive(Debug, Default)]
pub struct Module {
    decls: HashMap<DeclId, Decl>,
    symbols: HashMap<String, Symbol>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decl(mut self, id: DeclId, decl: Decl) -> Self {
        self.decls.insert(id, decl);
        self
    }

    pub fn symbol(mut self, name: &str, symbol: Symbol) -> Self {
        self.symbols.insert(name.to_string(), symbol);
        self
    }

    /// Declarations `base..base + len`, each aliasing the next, the last aliasing `base`
    pub fn alias_ring(mut self, base: DeclId, len: u32) -> Self {
        for i in 0..len {
            self.decls.insert(base + i, Decl::Alias(base + (i + 1) % len));
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    I32,
    I64,
    Struct(DeclId),
    /// Deferred declaration whose size could not be determined
    Opaque(DeclId),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    UnknownDecl(DeclId),
    Unsized(DeclId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRequest {
    TypeOf(DeclId),
    SizeOf(DeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    TypeOf,
    SizeOf,
}

impl RequestKind for TypeKind {
    const ALL: &'static [Self] = &[TypeKind::TypeOf, TypeKind::SizeOf];

    fn name(self) -> &'static str {
        match self {
            TypeKind::TypeOf => "TypeOf",
            TypeKind::SizeOf => "SizeOf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    Type(Ty),
    Size(Result<u32, LayoutError>),
}

impl ZoneRequest for TypeRequest {
    const ZONE: ZoneId = ZoneId::TypeChecker;
    type Kind = TypeKind;
    type Value = TypeValue;

    fn kind(&self) -> TypeKind {
        match self {
            TypeRequest::TypeOf(_) => TypeKind::TypeOf,
            TypeRequest::SizeOf(_) => TypeKind::SizeOf,
        }
    }

    fn write_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRequest::TypeOf(decl) | TypeRequest::SizeOf(decl) => write!(f, "{decl}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeOf(pub DeclId);

impl From<TypeOf> for TypeRequest {
    fn from(request: TypeOf) -> Self {
        TypeRequest::TypeOf(request.0)
    }
}

impl Request for TypeOf {
    type Zone = TypeRequest;
    type Output = Ty;

    fn project(value: TypeValue) -> Option<Ty> {
        match value {
            TypeValue::Type(ty) => Some(ty),
            TypeValue::Size(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeOf(pub DeclId);

impl From<SizeOf> for TypeRequest {
    fn from(request: SizeOf) -> Self {
        TypeRequest::SizeOf(request.0)
    }
}

impl Request for SizeOf {
    type Zone = TypeRequest;
    type Output = Result<u32, LayoutError>;

    fn project(value: TypeValue) -> Option<Self::Output> {
        match value {
            TypeValue::Size(size) => Some(size),
            TypeValue::Type(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameRequest {
    Lookup(String),
    ResolveType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Lookup,
    ResolveType,
}

impl RequestKind for NameKind {
    const ALL: &'static [Self] = &[NameKind::Lookup, NameKind::ResolveType];

    fn name(self) -> &'static str {
        match self {
            NameKind::Lookup => "Lookup",
            NameKind::ResolveType => "ResolveType",
        }
    }

    fn cache_policy(self) -> CachePolicy {
        match self {
            NameKind::Lookup => CachePolicy::Uncached,
            NameKind::ResolveType => CachePolicy::Cached,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValue {
    Decl(Option<DeclId>),
    Type(Ty),
}

impl ZoneRequest for NameRequest {
    const ZONE: ZoneId = ZoneId::NameResolution;
    type Kind = NameKind;
    type Value = NameValue;

    fn kind(&self) -> NameKind {
        match self {
            NameRequest::Lookup(_) => NameKind::Lookup,
            NameRequest::ResolveType(_) => NameKind::ResolveType,
        }
    }

    fn write_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRequest::Lookup(name) | NameRequest::ResolveType(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup(pub String);

impl Lookup {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<Lookup> for NameRequest {
    fn from(request: Lookup) -> Self {
        NameRequest::Lookup(request.0)
    }
}

impl Request for Lookup {
    type Zone = NameRequest;
    type Output = Option<DeclId>;

    fn project(value: NameValue) -> Option<Self::Output> {
        match value {
            NameValue::Decl(decl) => Some(decl),
            NameValue::Type(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveType(pub String);

impl From<ResolveType> for NameRequest {
    fn from(request: ResolveType) -> Self {
        NameRequest::ResolveType(request.0)
    }
}

impl Request for ResolveType {
    type Zone = NameRequest;
    type Output = Ty;

    fn project(value: NameValue) -> Option<Ty> {
        match value {
            NameValue::Type(ty) => Some(ty),
            NameValue::Decl(_) => None,
        }
    }
}

/// Invocation counters and refusal log shared by the test tables
#[derive(Debug, Default)]
pub struct CallTracker {
    type_of: AtomicUsize,
    size_of: AtomicUsize,
    lookup: AtomicUsize,
    resolve_type: AtomicUsize,
    refusals: Mutex<Vec<EvaluationError>>,
    stacks_at_refusal: Mutex<Vec<Vec<String>>>,
}

impl CallTracker {
    pub fn type_of_calls(&self) -> usize {
        self.type_of.load(Ordering::SeqCst)
    }

    pub fn size_of_calls(&self) -> usize {
        self.size_of.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup.load(Ordering::SeqCst)
    }

    pub fn resolve_type_calls(&self) -> usize {
        self.resolve_type.load(Ordering::SeqCst)
    }

    /// Failures the evaluator handed back to the test tables
    pub fn refusals(&self) -> Vec<EvaluationError> {
        self.refusals.lock().clone()
    }

    /// Active stack, rendered, at each refusal
    pub fn stacks_at_refusal(&self) -> Vec<Vec<String>> {
        self.stacks_at_refusal.lock().clone()
    }

    fn refused(&self, evaluator: &Evaluator, err: EvaluationError) {
        let stack = evaluator.active_requests().iter().map(|r| r.to_string()).collect();
        self.stacks_at_refusal.lock().push(stack);
        self.refusals.lock().push(err);
    }
}

pub struct TypeChecker {
    module: Arc<Module>,
    tracker: Arc<CallTracker>,
}

impl TypeChecker {
    pub fn new(module: Arc<Module>, tracker: Arc<CallTracker>) -> Self {
        Self { module, tracker }
    }

    fn type_of(&self, evaluator: &mut Evaluator, decl: DeclId) -> Ty {
        match evaluator.evaluate(TypeOf(decl)) {
            Ok(ty) => ty,
            Err(err) => {
                self.tracker.refused(evaluator, err);
                Ty::Unknown
            }
        }
    }

    fn size_of(&self, evaluator: &mut Evaluator, decl: DeclId) -> Result<u32, LayoutError> {
        match evaluator.evaluate(SizeOf(decl)) {
            Ok(size) => size,
            Err(err) => {
                self.tracker.refused(evaluator, err);
                Err(LayoutError::Unsized(decl))
            }
        }
    }
}

impl RequestFunctions<TypeRequest> for TypeChecker {
    fn compute(&self, request: &TypeRequest, evaluator: &mut Evaluator) -> TypeValue {
        match request {
            TypeRequest::TypeOf(decl) => {
                self.tracker.type_of.fetch_add(1, Ordering::SeqCst);
                let ty = match self.module.decls.get(decl) {
                    None => Ty::Unknown,
                    Some(Decl::I32) => Ty::I32,
                    Some(Decl::I64) => Ty::I64,
                    Some(Decl::Alias(target)) => self.type_of(evaluator, *target),
                    Some(Decl::Struct(_)) => Ty::Struct(*decl),
                    Some(Decl::Deferred) => match self.size_of(evaluator, *decl) {
                        Ok(4) => Ty::I32,
                        Ok(8) => Ty::I64,
                        _ => Ty::Opaque(*decl),
                    },
                };
                TypeValue::Type(ty)
            }
            TypeRequest::SizeOf(decl) => {
                self.tracker.size_of.fetch_add(1, Ordering::SeqCst);
                let size: Result<u32, LayoutError> = match self.module.decls.get(decl) {
                    None => Err(LayoutError::UnknownDecl(*decl)),
                    Some(Decl::I32) => Ok(4),
                    Some(Decl::I64) => Ok(8),
                    Some(Decl::Alias(target)) => self.size_of(evaluator, *target),
                    Some(Decl::Struct(fields)) => fields.iter().map(|field| self.size_of(evaluator, *field)).sum(),
                    Some(Decl::Deferred) => match self.type_of(evaluator, *decl) {
                        Ty::I32 => Ok(4),
                        Ty::I64 => Ok(8),
                        _ => Err(LayoutError::Unsized(*decl)),
                    },
                };
                TypeValue::Size(size)
            }
        }
    }
}

pub struct NameResolver {
    module: Arc<Module>,
    tracker: Arc<CallTracker>,
}

impl NameResolver {
    pub fn new(module: Arc<Module>, tracker: Arc<CallTracker>) -> Self {
        Self { module, tracker }
    }
}

impl RequestFunctions<NameRequest> for NameResolver {
    fn compute(&self, request: &NameRequest, evaluator: &mut Evaluator) -> NameValue {
        match request {
            NameRequest::Lookup(name) => {
                self.tracker.lookup.fetch_add(1, Ordering::SeqCst);
                let decl = match self.module.symbols.get(name) {
                    None => None,
                    Some(Symbol::Decl(decl)) => Some(*decl),
                    Some(Symbol::Reexport(target)) => match evaluator.evaluate(Lookup(target.clone())) {
                        Ok(decl) => decl,
                        Err(err) => {
                            self.tracker.refused(evaluator, err);
                            None
                        }
                    },
                };
                NameValue::Decl(decl)
            }
            NameRequest::ResolveType(name) => {
                self.tracker.resolve_type.fetch_add(1, Ordering::SeqCst);
                let ty = match evaluator.evaluate_or_default(Lookup(name.clone())) {
                    Some(decl) => evaluator.evaluate_or_else(TypeOf(decl), |_| Ty::Unknown),
                    None => Ty::Unknown,
                };
                NameValue::Type(ty)
            }
        }
    }
}

/// Registry with both test zones over `module`
pub fn registry(module: Module, tracker: Arc<CallTracker>) -> Arc<ZoneRegistry> {
    let module = Arc::new(module);
    let mut registry = ZoneRegistry::new();
    registry.register::<TypeRequest, _>(TypeChecker::new(module.clone(), tracker.clone()));
    registry.register::<NameRequest, _>(NameResolver::new(module, tracker));
    Arc::new(registry)
}

/// Fresh evaluator over `module` and the tracker observing it
pub fn evaluator(module: Module, options: EvaluatorOptions) -> (Evaluator, Arc<CallTracker>) {
    let tracker = Arc::new(CallTracker::default());
    let registry = registry(module, tracker.clone());
    (Evaluator::new(registry, options), tracker)
}
