use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::address::Address;
use crate::hash::{HolderId, WithdrawId};

/// Events emitted at the commit point of state-changing operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustodyEvent {
    HolderCreated {
        holder_id: HolderId,
        symbol: String,
        owner_address: Address,
    },
    AssetMovedToMainAddress {
        holder_id: HolderId,
        from: Address,
        amount: u64,
    },
    AssetMovedFromMainAddress {
        holder_id: HolderId,
        to: Address,
        amount: u64,
    },
    WithdrawRequested {
        withdraw_id: WithdrawId,
        holder_id: HolderId,
        request_address: Address,
        withdraw_address: Address,
        amount: u64,
    },
    WithdrawReleased {
        withdraw_id: WithdrawId,
        holder_id: HolderId,
        withdraw_address: Address,
        amount: u64,
    },
}

/// Sink for committed events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CustodyEvent);
}

/// Collects events in memory for assertions in tests
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<CustodyEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        InMemoryEventSink::default()
    }

    pub fn events(&self) -> Vec<CustodyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: CustodyEvent) {
        self.events.lock().unwrap().push(event);
    }
}
