use chrono::Utc;
use std::sync::Mutex;

use crate::address::Address;
use crate::error::CustodyError;
use crate::hash::HashDigest;

/// A contract call issued on behalf of a virtual user address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualCall {
    pub from_identity: HashDigest,
    pub target: Address,
    pub method: String,
    pub args: Vec<u8>,
}

/// Seam to the execution environment hosting the engine
///
/// Supplies the ambient facts every operation needs (caller, transaction id,
/// previous block hash, block time) and dispatches outbound calls made under
/// a virtual identity.
pub trait ExecutionContext: Send + Sync {
    /// The address that signed the current call
    fn sender(&self) -> Address;

    /// Unique id of the current transaction
    fn transaction_id(&self) -> HashDigest;

    /// Hash of the block preceding the one being executed
    fn previous_block_hash(&self) -> HashDigest;

    /// Block timestamp in unix seconds
    fn current_time(&self) -> i64;

    /// Dispatch a contract call signed by a virtual identity
    fn call_as_virtual_identity(&self, call: VirtualCall) -> Result<(), CustodyError>;
}

#[derive(Debug)]
struct MockContextState {
    sender: Address,
    now: i64,
    tx_seq: u64,
    previous_block_hash: HashDigest,
    sent_calls: Vec<VirtualCall>,
}

/// Settable execution context for tests
///
/// Each `transaction_id` read bumps an internal counter so consecutive
/// operations in a test run as distinct transactions.
#[derive(Debug)]
pub struct MockExecutionContext {
    state: Mutex<MockContextState>,
}

impl Default for MockExecutionContext {
    fn default() -> Self {
        MockExecutionContext {
            state: Mutex::new(MockContextState {
                sender: Address::default(),
                now: Utc::now().timestamp(),
                tx_seq: 0,
                previous_block_hash: HashDigest::compute(b"genesis"),
                sent_calls: Vec::new(),
            }),
        }
    }
}

impl MockExecutionContext {
    pub fn new() -> Self {
        MockExecutionContext::default()
    }

    pub fn set_sender(&self, sender: Address) {
        self.state.lock().unwrap().sender = sender;
    }

    pub fn set_now(&self, now: i64) {
        self.state.lock().unwrap().now = now;
    }

    pub fn advance_time(&self, seconds: i64) {
        self.state.lock().unwrap().now += seconds;
    }

    pub fn set_previous_block_hash(&self, hash: HashDigest) {
        self.state.lock().unwrap().previous_block_hash = hash;
    }

    pub fn sent_calls(&self) -> Vec<VirtualCall> {
        self.state.lock().unwrap().sent_calls.clone()
    }
}

impl ExecutionContext for MockExecutionContext {
    fn sender(&self) -> Address {
        self.state.lock().unwrap().sender
    }

    fn transaction_id(&self) -> HashDigest {
        let mut state = self.state.lock().unwrap();
        state.tx_seq += 1;
        HashDigest::compute(format!("tx-{}", state.tx_seq).as_bytes())
    }

    fn previous_block_hash(&self) -> HashDigest {
        self.state.lock().unwrap().previous_block_hash
    }

    fn current_time(&self) -> i64 {
        self.state.lock().unwrap().now
    }

    fn call_as_virtual_identity(&self, call: VirtualCall) -> Result<(), CustodyError> {
        self.state.lock().unwrap().sent_calls.push(call);
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_are_unique() {
        let ctx = MockExecutionContext::new();
        let a = ctx.transaction_id();
        let b = ctx.transaction_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_time_control() {
        let ctx = MockExecutionContext::new();
        ctx.set_now(1_000_000);
        assert_eq!(ctx.current_time(), 1_000_000);

        ctx.advance_time(3600);
        assert_eq!(ctx.current_time(), 1_003_600);
    }

    #[test]
    fn test_virtual_calls_recorded() {
        let ctx = MockExecutionContext::new();
        let call = VirtualCall {
            from_identity: HashDigest::compute(b"identity"),
            target: Address::new([1u8; 32]),
            method: "Transfer".to_string(),
            args: vec![1, 2, 3],
        };
        ctx.call_as_virtual_identity(call.clone())
            .expect("mock always accepts");
        assert_eq!(ctx.sent_calls(), vec![call]);
    }
}
