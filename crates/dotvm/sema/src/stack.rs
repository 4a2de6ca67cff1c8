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

//! The chain of requests currently being computed

use crate::request::AnyRequest;

/// Requests whose computation is running, oldest first.
///
/// Pushes and pops are strictly nested. A request is never pushed while it is already
/// on the stack; the evaluator reports a cycle instead.
#[derive(Debug, Default)]
pub struct ActiveRequestStack {
    entries: Vec<AnyRequest>,
    /// Entries, counted from the bottom, with a depth-limited evaluation beneath them
    tainted: usize,
}

impl ActiveRequestStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a request
    pub fn push(&mut self, request: AnyRequest) {
        debug_assert!(self.position(&request).is_none(), "{request} is already active");
        self.entries.push(request);
    }

    /// Leave `expected`, which must be the top of the stack. Returns whether an
    /// evaluation beneath it was refused by the depth limit.
    ///
    /// # Panics
    ///
    /// On a stack-discipline violation, since cycle detection is unsound afterwards.
    pub fn pop(&mut self, expected: &AnyRequest) -> bool {
        match self.entries.pop() {
            Some(top) if top == *expected => {
                let depth = self.entries.len();
                let tainted = self.tainted > depth;
                self.tainted = self.tainted.min(depth);
                tainted
            }
            Some(top) => panic!("active request stack corrupted: popped {top}, expected {expected}"),
            None => panic!("active request stack corrupted: popped {expected} from an empty stack"),
        }
    }

    /// Record that an evaluation was refused by the depth limit beneath every active request
    pub fn taint_active(&mut self) {
        self.tainted = self.entries.len();
    }

    /// Index of `request` if it is active
    pub fn position(&self, request: &AnyRequest) -> Option<usize> {
        self.entries.iter().position(|active| active == request)
    }

    pub fn top(&self) -> Option<&AnyRequest> {
        self.entries.last()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyRequest> {
        self.entries.iter()
    }

    /// The cycle closed by re-entering the request at `start`: every active request
    /// from `start` to the top, then the repeated request again.
    pub fn cycle_from(&self, start: usize) -> Vec<AnyRequest> {
        debug_assert!(start < self.entries.len(), "cycle start {start} is not on the stack");
        let mut cycle = self.entries[start..].to_vec();
        cycle.push(self.entries[start].clone());
        cycle
    }
}
