use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::address::Address;
use crate::error::CustodyError;

/// Token metadata as reported by the external ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u32,
}

/// Seam to the external token ledger
///
/// The engine never touches balances directly; every transfer and balance
/// read goes through this trait so the engine stays testable against an
/// in-memory double.
pub trait TokenLedger: Send + Sync {
    /// Look up token metadata; absent symbols surface as NotFound
    fn token_info(&self, symbol: &str) -> Result<TokenInfo, CustodyError>;

    /// Current balance of an address for a symbol
    fn balance(&self, address: &Address, symbol: &str) -> Result<u64, CustodyError>;

    /// Move tokens between addresses; insufficient funds surface as Ledger
    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> Result<(), CustodyError>;
}

#[derive(Debug, Default)]
struct LedgerState {
    tokens: HashMap<String, TokenInfo>,
    balances: HashMap<(Address, String), u64>,
}

/// In-memory ledger double for tests and local simulation
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        InMemoryLedger::default()
    }

    pub fn register_token(&self, symbol: &str, decimals: u32) {
        let mut state = self.state.lock().unwrap();
        state.tokens.insert(
            symbol.to_string(),
            TokenInfo {
                symbol: symbol.to_string(),
                decimals,
            },
        );
    }

    pub fn mint(&self, address: &Address, symbol: &str, amount: u64) {
        let mut state = self.state.lock().unwrap();
        let balance = state
            .balances
            .entry((*address, symbol.to_string()))
            .or_insert(0);
        *balance += amount;
    }
}

impl TokenLedger for InMemoryLedger {
    fn token_info(&self, symbol: &str) -> Result<TokenInfo, CustodyError> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(symbol)
            .cloned()
            .ok_or_else(|| CustodyError::not_found(format!("Token {} not found.", symbol)))
    }

    fn balance(&self, address: &Address, symbol: &str) -> Result<u64, CustodyError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .balances
            .get(&(*address, symbol.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> Result<(), CustodyError> {
        let mut state = self.state.lock().unwrap();
        if !state.tokens.contains_key(symbol) {
            return Err(CustodyError::not_found(format!("Token {} not found.", symbol)));
        }

        let from_key = (*from, symbol.to_string());
        let available = state.balances.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(CustodyError::ledger(format!(
                "Insufficient balance of {}: {} < {}.",
                symbol, available, amount
            )));
        }

        state.balances.insert(from_key, available - amount);
        let to_balance = state
            .balances
            .entry((*to, symbol.to_string()))
            .or_insert(0);
        *to_balance += amount;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    #[test]
    fn test_token_info_lookup() {
        let ledger = InMemoryLedger::new();
        ledger.register_token("ELF", 8);

        let info = ledger.token_info("ELF").expect("registered token");
        assert_eq!(info.symbol, "ELF");
        assert_eq!(info.decimals, 8);

        assert!(matches!(
            ledger.token_info("BTC"),
            Err(CustodyError::NotFound(_))
        ));
    }

    #[test]
    fn test_transfer_moves_balance() {
        let ledger = InMemoryLedger::new();
        ledger.register_token("ELF", 8);
        ledger.mint(&addr(1), "ELF", 1_000);

        ledger
            .transfer(&addr(1), &addr(2), "ELF", 400)
            .expect("sufficient balance");

        assert_eq!(ledger.balance(&addr(1), "ELF").unwrap(), 600);
        assert_eq!(ledger.balance(&addr(2), "ELF").unwrap(), 400);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let ledger = InMemoryLedger::new();
        ledger.register_token("ELF", 8);
        ledger.mint(&addr(1), "ELF", 100);

        let result = ledger.transfer(&addr(1), &addr(2), "ELF", 101);
        assert!(matches!(result, Err(CustodyError::Ledger(_))));

        // Failed transfers leave balances untouched.
        assert_eq!(ledger.balance(&addr(1), "ELF").unwrap(), 100);
        assert_eq!(ledger.balance(&addr(2), "ELF").unwrap(), 0);
    }
}
