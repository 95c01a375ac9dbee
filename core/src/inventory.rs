//! In-process [`InventoryStore`] backed by an ordered map.
//!
//! Used by the command line front end to load a fleet from disk and by tests.
//! Every trait call takes the lock for the duration of one map operation only.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bmcfleet_common::error::InventoryError;
use bmcfleet_common::fleet::{FleetMember, MemberId, MemberState, MemberStateUpdate};
use bmcfleet_common::inventory::InventoryStore;
use tracing::trace;

#[derive(Debug, Clone)]
struct Entry {
    member: FleetMember,
    state: MemberState,
}

#[derive(Debug, Default)]
pub struct MemoryInventory {
    entries: RwLock<BTreeMap<MemberId, Entry>>,
}

impl MemoryInventory {
    /// Later members with a duplicate id replace earlier ones.
    pub fn new(members: Vec<FleetMember>) -> Self {
        let entries = members
            .into_iter()
            .map(|member| {
                let entry = Entry {
                    member,
                    state: MemberState::default(),
                };
                (entry.member.id, entry)
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn insert(&self, member: FleetMember) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            member.id,
            Entry {
                member,
                state: MemberState::default(),
            },
        );
    }

    pub fn remove(&self, id: MemberId) -> Option<FleetMember> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&id).map(|entry| entry.member)
    }

    /// Last state written for `id`.
    pub fn state(&self, id: MemberId) -> Option<MemberState> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).map(|entry| entry.state.clone())
    }

    /// Every member with its last state, ordered by id.
    pub fn states(&self) -> Vec<(FleetMember, MemberState)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .map(|entry| (entry.member.clone(), entry.state.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InventoryStore for MemoryInventory {
    async fn list_fleet_members(&self) -> Result<Vec<FleetMember>, InventoryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.values().map(|entry| entry.member.clone()).collect())
    }

    async fn find_by_address(&self, address: IpAddr) -> Result<Option<FleetMember>, InventoryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .values()
            .find(|entry| entry.member.address == address)
            .map(|entry| entry.member.clone()))
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<FleetMember>, InventoryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&id).map(|entry| entry.member.clone()))
    }

    async fn update_member_state(
        &self,
        id: MemberId,
        update: MemberStateUpdate,
    ) -> Result<(), InventoryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get_mut(&id).ok_or(InventoryError::NotFound(id))?;
        trace!(member = %id, status = %update.status, "applying state update");
        entry.state.apply(update);
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
