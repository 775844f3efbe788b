use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::address::Address;
use crate::error::CustodyError;

/// Default delay before a proposed holder update becomes approvable
pub const DEFAULT_SETTINGS_EFFECTIVE_SECS: i64 = 3600;

/// One management key registered on a holder
///
/// `amount` is the key's spending ceiling per operation; `limit_amount` and
/// `approvals_required` describe the sanction this key can grant to pending
/// withdrawals: up to `limit_amount` per withdrawal, with the withdrawal
/// needing `approvals_required` distinct sanctions in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementAddress {
    pub address: Address,
    pub amount: u64,
    pub limit_amount: u64,
    pub approvals_required: u32,
}

/// A proposed replacement for a holder's owner, shutdown address, management
/// set and settings delay, queued until the delay in force has elapsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderUpdatingInfo {
    pub owner_address: Address,
    pub shutdown_address: Address,
    pub management_addresses: Vec<ManagementAddress>,
    pub settings_effective_time: i64,
    pub requested_at: i64,
}

/// A holder record: one custody account with its main address, token symbol
/// and management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderInfo {
    pub main_address: Address,
    pub symbol: String,
    pub owner_address: Address,
    pub shutdown_address: Address,
    pub management_addresses: HashMap<Address, ManagementAddress>,
    pub is_shutdown: bool,
    pub settings_effective_time: i64,
    pub updating_info: Option<HolderUpdatingInfo>,
}

impl HolderInfo {
    pub fn management_address(&self, address: &Address) -> Option<&ManagementAddress> {
        self.management_addresses.get(address)
    }

    /// A pending update becomes approvable once the delay currently in force
    /// has elapsed; the proposed delay only applies to later updates
    pub fn is_update_effective(&self, now: i64) -> bool {
        match &self.updating_info {
            Some(updating) => now >= updating.requested_at + self.settings_effective_time,
            None => false,
        }
    }
}

/// Reject zero and duplicate entries in a proposed management set
pub fn check_distinct_addresses(addresses: &[ManagementAddress]) -> Result<(), CustodyError> {
    let mut seen: HashSet<Address> = HashSet::with_capacity(addresses.len());
    for management in addresses {
        if management.address.is_zero() {
            return Err(CustodyError::precondition("Invalid management address."));
        }
        if !seen.insert(management.address) {
            return Err(CustodyError::conflict("The same management address exists."));
        }
    }
    Ok(())
}

/// Validate a proposed management set
///
/// Beyond per-entry checks, every key that expects approvals must actually be
/// able to collect them: for each entry M, the number of entries whose ceiling
/// covers M's limit_amount must reach M's approvals_required, or a withdrawal
/// sanctioned under M could never complete.
pub fn validate_management_addresses(
    addresses: &[ManagementAddress],
) -> Result<(), CustodyError> {
    check_distinct_addresses(addresses)?;

    for management in addresses {
        let capable = addresses
            .iter()
            .filter(|other| other.amount >= management.limit_amount)
            .count();
        if capable < management.approvals_required as usize {
            return Err(CustodyError::invariant(format!(
                "Invalid management address. Not enough approval addresses for limit amount {}.",
                management.limit_amount
            )));
        }
    }

    Ok(())
}

/// Build the lookup map for a validated management set
pub fn management_map(addresses: &[ManagementAddress]) -> HashMap<Address, ManagementAddress> {
    addresses
        .iter()
        .map(|management| (management.address, management.clone()))
        .collect()
}
