use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::error::CustodyError;
use crate::hash::{CategoryHash, HashDigest};

/// Global custody configuration, written exactly once at initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyInfo {
    owner: Address,
    categories: Vec<String>,
}

impl CustodyInfo {
    pub fn new(owner: Address, categories: Vec<String>) -> Result<Self, CustodyError> {
        if owner.is_zero() {
            return Err(CustodyError::precondition("Contract owner cannot be null."));
        }
        Ok(CustodyInfo { owner, categories })
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn set_owner(&mut self, owner: Address) {
        self.owner = owner;
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn add_category(&mut self, category: &str) {
        if !self.has_category(category) {
            self.categories.push(category.to_string());
        }
    }
}

/// A single whitelisted call target: one contract address and the methods
/// virtual users of the category may invoke on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCallWhiteList {
    pub address: Address,
    pub method_names: Vec<String>,
}

impl ContractCallWhiteList {
    pub fn allows(&self, target: &Address, method: &str) -> bool {
        self.address == *target && self.method_names.iter().any(|m| m == method)
    }
}

/// Capability table mapping a category hash to the contract calls its virtual
/// users are permitted to make. A category with no entries cannot be used for
/// address derivation at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhitelistRegistry {
    lists: HashMap<CategoryHash, Vec<ContractCallWhiteList>>,
}

impl WhitelistRegistry {
    pub fn new() -> Self {
        WhitelistRegistry::default()
    }

    /// Hash a category name into its registry key
    pub fn category_hash(category: &str) -> CategoryHash {
        HashDigest::compute(category.as_bytes())
    }

    /// Replace the whitelist entries for a category
    pub fn set_category(&mut self, category: &str, lists: Vec<ContractCallWhiteList>) {
        self.lists
            .insert(Self::category_hash(category), lists);
    }

    /// Append entries to a category, creating it on first use
    pub fn extend_category(&mut self, category: &str, lists: Vec<ContractCallWhiteList>) {
        self.lists
            .entry(Self::category_hash(category))
            .or_default()
            .extend(lists);
    }

    pub fn lists_for(&self, category_hash: &CategoryHash) -> Option<&[ContractCallWhiteList]> {
        self.lists.get(category_hash).map(Vec::as_slice)
    }

    /// A category is usable for derivation only when it carries at least one
    /// whitelist entry
    pub fn is_category_enabled(&self, category_hash: &CategoryHash) -> bool {
        self.lists
            .get(category_hash)
            .map(|lists| !lists.is_empty())
            .unwrap_or(false)
    }

    /// Exact-match capability check: the (target, method) pair must appear in
    /// one of the category's whitelist entries
    pub fn is_call_allowed(
        &self,
        category_hash: &CategoryHash,
        target: &Address,
        method: &str,
    ) -> bool {
        self.lists
            .get(category_hash)
            .map(|lists| lists.iter().any(|list| list.allows(target, method)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn token_contract() -> Address {
        Address::new([0x11; 32])
    }

    fn sample_registry() -> WhitelistRegistry {
        let mut registry = WhitelistRegistry::new();
        registry.set_category(
            "token_lock",
            vec![ContractCallWhiteList {
                address: token_contract(),
                method_names: vec![
                    "Lock".to_string(),
                    "Unlock".to_string(),
                    "Transfer".to_string(),
                ],
            }],
        );
        registry
    }

    #[test]
    fn test_custody_info_rejects_zero_owner() {
        let result = CustodyInfo::new(Address::default(), vec!["token_lock".to_string()]);
        assert!(matches!(result, Err(CustodyError::Precondition(_))));
    }

    #[test]
    fn test_has_category() {
        let info = CustodyInfo::new(Address::new([1u8; 32]), vec!["token_lock".to_string()])
            .expect("valid custody info");
        assert!(info.has_category("token_lock"));
        assert!(!info.has_category("vote"));
    }

    #[test]
    fn test_call_allowed_exact_match() {
        let registry = sample_registry();
        let hash = WhitelistRegistry::category_hash("token_lock");

        assert!(registry.is_call_allowed(&hash, &token_contract(), "Lock"));
        assert!(registry.is_call_allowed(&hash, &token_contract(), "Transfer"));
        assert!(!registry.is_call_allowed(&hash, &token_contract(), "Burn"));
        assert!(!registry.is_call_allowed(&hash, &Address::new([0x22; 32]), "Lock"));
    }

    #[test]
    fn test_unknown_category_denied() {
        let registry = sample_registry();
        let hash = WhitelistRegistry::category_hash("vote");

        assert!(!registry.is_category_enabled(&hash));
        assert!(!registry.is_call_allowed(&hash, &token_contract(), "Lock"));
    }

    #[test]
    fn test_empty_category_disabled() {
        let mut registry = sample_registry();
        registry.set_category("token_lock", vec![]);
        let hash = WhitelistRegistry::category_hash("token_lock");

        assert!(!registry.is_category_enabled(&hash));
        assert!(!registry.is_call_allowed(&hash, &token_contract(), "Lock"));
    }
}
