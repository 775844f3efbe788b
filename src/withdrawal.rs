use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::hash::HolderId;

/// Pending withdrawals expire one day after the request was made
pub const WITHDRAW_EXPIRATION_SECS: i64 = 86_400;

/// A pending withdrawal from a holder's main address
///
/// `total_required` and `limit_amount` are snapshots of the requesting key's
/// thresholds at request time; later management changes do not retroactively
/// alter an open request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WithdrawInfo {
    pub holder_id: HolderId,
    pub address: Address,
    pub amount: u64,
    pub total_required: u32,
    pub limit_amount: u64,
    pub approved_addresses: Vec<Address>,
    pub added_time: i64,
}

impl WithdrawInfo {
    /// Expiry is evaluated lazily at approval time, never by a background job
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.added_time >= WITHDRAW_EXPIRATION_SECS
    }

    pub fn has_approved(&self, approver: &Address) -> bool {
        self.approved_addresses.contains(approver)
    }

    pub fn approvals(&self) -> u32 {
        self.approved_addresses.len() as u32
    }
}

/// Outcome of an approval attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawApproval {
    /// The sanction was recorded but the threshold is not yet met
    Approving { approved: u32, required: u32 },
    /// The threshold was met and the funds have been released
    Approved,
    /// The request had passed its expiry window and was removed
    Expired,
}
