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

//! Memo table of request results

use crate::request::{AnyRequest, DynRequest};
use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Observable state of a request in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Absent,
    InProgress,
    Done,
}

enum CacheEntry {
    InProgress,
    Done(Box<dyn Any + Send + Sync>),
}

impl CacheEntry {
    fn state(&self) -> CacheState {
        match self {
            CacheEntry::InProgress => CacheState::InProgress,
            CacheEntry::Done(_) => CacheState::Done,
        }
    }
}

/// Results of cacheable requests.
///
/// Entries move `Absent -> InProgress -> Done`. An in-progress entry whose result must
/// not be memoized is abandoned back to `Absent` instead. Completed entries are never
/// evicted for the lifetime of the owning evaluator. Any other transition means the
/// evaluator's bookkeeping is corrupt and aborts.
#[derive(Default)]
pub struct RequestCache {
    entries: HashMap<AnyRequest, CacheEntry>,
    done: usize,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, request: &dyn DynRequest) -> CacheState {
        self.entries.get(request).map_or(CacheState::Absent, CacheEntry::state)
    }

    /// Cached result of a completed request.
    ///
    /// # Panics
    ///
    /// If the stored result is not a `V`.
    pub fn get<V: Clone + 'static>(&self, request: &dyn DynRequest) -> Option<V> {
        match self.entries.get(request)? {
            CacheEntry::Done(value) => match value.downcast_ref::<V>() {
                Some(value) => Some(value.clone()),
                None => panic!("cached result for {} has unexpected type, expected {}", request.kind_name(), std::any::type_name::<V>()),
            },
            CacheEntry::InProgress => None,
        }
    }

    /// `Absent -> InProgress`
    pub fn mark_in_progress(&mut self, request: AnyRequest) {
        match self.entries.entry(request) {
            Entry::Vacant(entry) => {
                entry.insert(CacheEntry::InProgress);
            }
            Entry::Occupied(entry) => {
                panic!("illegal cache transition for {}: {:?} -> InProgress", entry.key(), entry.get().state());
            }
        }
    }

    /// `InProgress -> Done`
    pub fn complete<V: Send + Sync + 'static>(&mut self, request: &AnyRequest, value: V) {
        match self.entries.get_mut(request) {
            Some(entry) if matches!(entry, CacheEntry::InProgress) => {
                *entry = CacheEntry::Done(Box::new(value));
                self.done += 1;
            }
            Some(entry) => panic!("illegal cache transition for {}: {:?} -> Done", request, entry.state()),
            None => panic!("illegal cache transition for {}: Absent -> Done", request),
        }
    }

    /// `InProgress -> Absent`, dropping a result that must not be memoized
    pub fn abandon(&mut self, request: &AnyRequest) {
        match self.state(request.as_dyn()) {
            CacheState::InProgress => {
                self.entries.remove(request);
            }
            state => panic!("illegal cache transition for {}: {:?} -> Absent", request, state),
        }
    }

    /// Number of entries in any state
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of completed entries
    pub fn done_count(&self) -> usize {
        self.done
    }
}
