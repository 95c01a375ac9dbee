use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::InventoryError;
use crate::fleet::{FleetMember, MemberId, MemberStateUpdate};

/// Defines the contract for reading and updating the fleet inventory.
///
/// Every method is a free-standing call; implementations must not hold locks or
/// sessions across calls.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_fleet_members(&self) -> Result<Vec<FleetMember>, InventoryError>;

    async fn find_by_address(&self, address: IpAddr) -> Result<Option<FleetMember>, InventoryError>;

    async fn get_member(&self, id: MemberId) -> Result<Option<FleetMember>, InventoryError>;

    async fn update_member_state(
        &self,
        id: MemberId,
        update: MemberStateUpdate,
    ) -> Result<(), InventoryError>;
}
