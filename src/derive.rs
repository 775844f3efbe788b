use crate::address::Address;
use crate::error::CustodyError;
use crate::hash::{CategoryHash, HashDigest, HolderId};
use crate::whitelist::WhitelistRegistry;

/// Compute the virtual identity for a user token under a holder
///
/// The base identity is the hash of the caller-supplied token. When a category
/// is given its hash is folded in with XOR, so the same token yields disjoint
/// identities per category. The holder id is then concatenated in so
/// identities never collide across holders.
pub fn virtual_user_identity(
    registry: &WhitelistRegistry,
    holder_id: &HolderId,
    user_token: &str,
    category: Option<&str>,
) -> Result<HashDigest, CustodyError> {
    let mut identity = HashDigest::compute(user_token.as_bytes());

    if let Some(category) = category {
        let category_hash: CategoryHash = WhitelistRegistry::category_hash(category);
        if !registry.is_category_enabled(&category_hash) {
            return Err(CustodyError::precondition(
                "Category has no contract call whitelist, maybe not initialized.",
            ));
        }
        identity = HashDigest::xor(&identity, &category_hash);
    }

    Ok(HashDigest::concat(holder_id, &identity))
}

/// Convert a user token into its deposit address under a holder
pub fn virtual_user_address(
    registry: &WhitelistRegistry,
    holder_id: &HolderId,
    user_token: &str,
    category: Option<&str>,
) -> Result<Address, CustodyError> {
    let identity = virtual_user_identity(registry, holder_id, user_token, category)?;
    Ok(Address::from_identity(&identity))
}

/// The holder's main address is the address of its own id taken as identity
pub fn main_address(holder_id: &HolderId) -> Address {
    Address::from_identity(holder_id)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::whitelist::ContractCallWhiteList;

    fn registry_with_category(category: &str) -> WhitelistRegistry {
        let mut registry = WhitelistRegistry::new();
        registry.set_category(
            category,
            vec![ContractCallWhiteList {
                address: Address::new([0x11; 32]),
                method_names: vec!["Lock".to_string()],
            }],
        );
        registry
    }

    #[test]
    fn test_virtual_address_deterministic() {
        let registry = WhitelistRegistry::new();
        let holder_id = HashDigest::compute(b"holder-1");

        let a = virtual_user_address(&registry, &holder_id, "user-1", None).expect("derivable");
        let b = virtual_user_address(&registry, &holder_id, "user-1", None).expect("derivable");
        assert_eq!(a, b);
    }

    #[test]
    fn test_virtual_address_varies_by_user_and_holder() {
        let registry = WhitelistRegistry::new();
        let holder_a = HashDigest::compute(b"holder-a");
        let holder_b = HashDigest::compute(b"holder-b");

        let a1 = virtual_user_address(&registry, &holder_a, "user-1", None).expect("derivable");
        let a2 = virtual_user_address(&registry, &holder_a, "user-2", None).expect("derivable");
        let b1 = virtual_user_address(&registry, &holder_b, "user-1", None).expect("derivable");

        assert_ne!(a1, a2);
        assert_ne!(a1, b1);
    }

    #[test]
    fn test_category_changes_address() {
        let registry = registry_with_category("token_lock");
        let holder_id = HashDigest::compute(b"holder-1");

        let plain = virtual_user_address(&registry, &holder_id, "user-1", None).expect("derivable");
        let categorized = virtual_user_address(&registry, &holder_id, "user-1", Some("token_lock"))
            .expect("derivable");
        assert_ne!(plain, categorized);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let registry = WhitelistRegistry::new();
        let holder_id = HashDigest::compute(b"holder-1");

        let result = virtual_user_address(&registry, &holder_id, "user-1", Some("vote"));
        assert!(matches!(result, Err(CustodyError::Precondition(_))));
    }

    #[test]
    fn test_empty_category_rejected() {
        let mut registry = registry_with_category("token_lock");
        registry.set_category("token_lock", vec![]);
        let holder_id = HashDigest::compute(b"holder-1");

        let result = virtual_user_address(&registry, &holder_id, "user-1", Some("token_lock"));
        assert!(matches!(result, Err(CustodyError::Precondition(_))));
    }

    #[test]
    fn test_main_address_distinct_from_user_addresses() {
        let registry = WhitelistRegistry::new();
        let holder_id = HashDigest::compute(b"holder-1");

        let main = main_address(&holder_id);
        let user = virtual_user_address(&registry, &holder_id, "user-1", None).expect("derivable");
        assert_ne!(main, user);
    }
}
