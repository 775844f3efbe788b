use crate::address::Address;
use crate::error::CustodyError;
use crate::holder::{HolderInfo, ManagementAddress};

/// Resolve the caller's management entry on a holder, or fail Unauthorized
pub fn resolve_management_address<'a>(
    holder: &'a HolderInfo,
    sender: &Address,
) -> Result<&'a ManagementAddress, CustodyError> {
    holder.management_address(sender).ok_or_else(|| {
        CustodyError::unauthorized(
            "Sender is not registered as management address in the holder.",
        )
    })
}

/// Check the caller's spending ceiling against the amount being moved
pub fn authorize_move(
    management: &ManagementAddress,
    amount: u64,
) -> Result<(), CustodyError> {
    if management.amount < amount {
        return Err(CustodyError::unauthorized(
            "Current management address can not move this asset.",
        ));
    }
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    fn holder_with_key(amount: u64) -> (HolderInfo, Address) {
        let key = Address::new([5u8; 32]);
        let mut management_addresses = HashMap::new();
        management_addresses.insert(
            key,
            ManagementAddress {
                address: key,
                amount,
                limit_amount: 0,
                approvals_required: 0,
            },
        );
        let holder = HolderInfo {
            main_address: Address::new([9u8; 32]),
            symbol: "ELF".to_string(),
            owner_address: Address::new([1u8; 32]),
            shutdown_address: Address::new([2u8; 32]),
            management_addresses,
            is_shutdown: false,
            settings_effective_time: 3600,
            updating_info: None,
        };
        (holder, key)
    }

    #[test]
    fn test_unregistered_sender_rejected() {
        let (holder, _) = holder_with_key(100);
        let stranger = Address::new([7u8; 32]);
        assert!(matches!(
            resolve_management_address(&holder, &stranger),
            Err(CustodyError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_ceiling_enforced() {
        let (holder, key) = holder_with_key(100);
        let management = resolve_management_address(&holder, &key).expect("registered key");

        assert!(authorize_move(management, 100).is_ok());
        assert!(matches!(
            authorize_move(management, 101),
            Err(CustodyError::Unauthorized(_))
        ));
    }
}
