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

//! Zone registry: one slot per zone, each holding that zone's computation table

use crate::error::RegistryError;
use crate::evaluator::Evaluator;
use crate::request::{RequestKind, ZoneRequest};
use crate::zone::ZoneId;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Computation table of one zone.
///
/// `compute` dispatches on the zone's request sum type with a single `match`. It may
/// call back into `evaluator` to evaluate sub-requests from any zone.
pub trait RequestFunctions<Z: ZoneRequest>: Send + Sync {
    /// Whether this table computes `kind`. Registration rejects tables that do not
    /// cover every kind the zone declares.
    fn supports(&self, kind: Z::Kind) -> bool {
        let _ = kind;
        true
    }

    fn compute(&self, request: &Z, evaluator: &mut Evaluator) -> Z::Value;
}

struct ZoneSlot {
    /// `Arc<dyn RequestFunctions<Z>>` for the zone's request type
    table: Box<dyn Any + Send + Sync>,
    request_type: &'static str,
    kinds: Vec<&'static str>,
}

/// Registry of computation tables keyed by zone.
///
/// Populated once at startup and then shared read-only, typically as
/// `Arc<ZoneRegistry>` handed to every [`Evaluator`].
pub struct ZoneRegistry {
    slots: [Option<ZoneSlot>; ZoneId::COUNT],
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneRegistry {
    /// Create a registry with every slot empty
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Install the computation table for `Z::ZONE`.
    ///
    /// Fails if the zone already has a table, or if `table` does not support every
    /// kind in `Z::Kind::ALL`.
    pub fn try_register<Z, T>(&mut self, table: T) -> Result<(), RegistryError>
    where
        Z: ZoneRequest,
        T: RequestFunctions<Z> + 'static,
    {
        let zone = Z::ZONE;
        let slot = &mut self.slots[zone.index()];
        if slot.is_some() {
            return Err(RegistryError::ZoneAlreadyRegistered { zone });
        }

        let missing: Vec<&'static str> = Z::Kind::ALL.iter().filter(|kind| !table.supports(**kind)).map(|kind| kind.name()).collect();
        if !missing.is_empty() {
            return Err(RegistryError::IncompleteTable { zone, missing });
        }

        let table: Arc<dyn RequestFunctions<Z>> = Arc::new(table);
        let kinds: Vec<&'static str> = Z::Kind::ALL.iter().map(|kind| kind.name()).collect();
        debug!("Registered zone {} with {} request kinds", zone, kinds.len());

        *slot = Some(ZoneSlot {
            table: Box::new(table),
            request_type: std::any::type_name::<Z>(),
            kinds,
        });
        Ok(())
    }

    /// Install the computation table for `Z::ZONE`.
    ///
    /// # Panics
    ///
    /// Registration problems are compiler bugs, so any error from
    /// [`ZoneRegistry::try_register`] aborts.
    pub fn register<Z, T>(&mut self, table: T)
    where
        Z: ZoneRequest,
        T: RequestFunctions<Z> + 'static,
    {
        if let Err(err) = self.try_register::<Z, T>(table) {
            panic!("zone registration failed: {err}");
        }
    }

    /// Fetch the computation table for `Z`
    pub fn lookup<Z: ZoneRequest>(&self) -> Result<Arc<dyn RequestFunctions<Z>>, RegistryError> {
        let zone = Z::ZONE;
        let slot = self.slots[zone.index()].as_ref().ok_or(RegistryError::UnregisteredZone { zone })?;
        slot.table
            .downcast_ref::<Arc<dyn RequestFunctions<Z>>>()
            .cloned()
            .ok_or(RegistryError::ZoneTypeMismatch { zone })
    }

    pub fn is_registered(&self, zone: ZoneId) -> bool {
        self.slots[zone.index()].is_some()
    }

    /// Zones with an installed table, in slot order
    pub fn registered_zones(&self) -> Vec<ZoneId> {
        ZoneId::ALL.iter().copied().filter(|zone| self.is_registered(*zone)).collect()
    }

    /// Kind names declared by a registered zone
    pub fn kinds(&self, zone: ZoneId) -> Option<&[&'static str]> {
        self.slots[zone.index()].as_ref().map(|slot| slot.kinds.as_slice())
    }

    /// Rust type name of the request type registered for a zone
    pub fn request_type(&self, zone: ZoneId) -> Option<&'static str> {
        self.slots[zone.index()].as_ref().map(|slot| slot.request_type)
    }
}
