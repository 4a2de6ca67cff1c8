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

//! Zones partition request kinds by the analysis subsystem that owns them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an analysis subsystem that owns a closed set of request kinds.
///
/// The set of zones is fixed at build time, so the registry can keep one slot per
/// zone in a plain array indexed by [`ZoneId::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ZoneId {
    /// Import resolution and linking of binary modules
    Module = 0,
    /// Resolution of names to declarations
    NameResolution = 1,
    /// Type checking of declarations and function bodies
    TypeChecker = 2,
    /// Memory and frame layout
    Layout = 3,
    /// Reserved for evaluator tests
    Testing = 4,
}

impl ZoneId {
    /// Number of zones, and therefore registry slots
    pub const COUNT: usize = 5;

    /// All zones in slot order
    pub const ALL: [ZoneId; Self::COUNT] = [ZoneId::Module, ZoneId::NameResolution, ZoneId::TypeChecker, ZoneId::Layout, ZoneId::Testing];

    /// Registry slot of this zone
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            ZoneId::Module => "Module",
            ZoneId::NameResolution => "NameResolution",
            ZoneId::TypeChecker => "TypeChecker",
            ZoneId::Layout => "Layout",
            ZoneId::Testing => "Testing",
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
