use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::address::Address;
use crate::context::{ExecutionContext, VirtualCall};
use crate::derive;
use crate::error::CustodyError;
use crate::events::{CustodyEvent, EventSink};
use crate::hash::{CategoryHash, HashDigest, HolderId, WithdrawId};
use crate::holder::{
    check_distinct_addresses, management_map, validate_management_addresses, HolderInfo,
    HolderUpdatingInfo, ManagementAddress, DEFAULT_SETTINGS_EFFECTIVE_SECS,
};
use crate::ledger::TokenLedger;
use crate::permission::{authorize_move, resolve_management_address};
use crate::whitelist::{ContractCallWhiteList, CustodyInfo, WhitelistRegistry};
use crate::withdrawal::{WithdrawApproval, WithdrawInfo};

/// Parameters for creating a holder
#[derive(Debug, Clone)]
pub struct CreateHolder {
    pub symbol: String,
    pub management_addresses: Vec<ManagementAddress>,
    pub owner_address: Address,
    pub shutdown_address: Address,
    pub settings_effective_time: Option<i64>,
}

/// Parameters shared by both asset-movement directions
#[derive(Debug, Clone)]
pub struct AssetMove {
    pub holder_id: HolderId,
    pub user_token: String,
    pub category: Option<String>,
    pub amount: u64,
}

/// Parameters for a pure virtual-address lookup
#[derive(Debug, Clone)]
pub struct VirtualAddressCalculation {
    pub holder_id: HolderId,
    pub user_token: String,
    pub category: Option<String>,
}

/// Parameters for a delegated contract call under a virtual identity
#[derive(Debug, Clone)]
pub struct VirtualTransaction {
    pub holder_id: HolderId,
    pub user_token: String,
    pub category: String,
    pub to: Address,
    pub method_name: String,
    pub args: Vec<u8>,
}

/// Parameters for requesting a withdrawal
#[derive(Debug, Clone)]
pub struct WithdrawRequest {
    pub holder_id: HolderId,
    pub address: Address,
    pub amount: u64,
}

/// Parameters for sanctioning a pending withdrawal
///
/// Amount and destination are repeated so an approver signs off on the exact
/// request they inspected, not whatever the id happens to point at.
#[derive(Debug, Clone)]
pub struct WithdrawApprove {
    pub id: WithdrawId,
    pub address: Address,
    pub amount: u64,
}

/// Parameters for cancelling pending withdrawals
#[derive(Debug, Clone)]
pub struct CancelWithdraws {
    pub holder_id: HolderId,
    pub ids: Vec<WithdrawId>,
}

/// Parameters for proposing a holder settings update
#[derive(Debug, Clone)]
pub struct HolderUpdateRequest {
    pub holder_id: HolderId,
    pub owner_address: Address,
    pub shutdown_address: Address,
    pub management_addresses: Vec<ManagementAddress>,
    pub settings_effective_time: Option<i64>,
}

/// The custody engine: global config, whitelists, holders and pending
/// withdrawals, operated against external ledger/context/event collaborators
///
/// Operations take `&mut self`; the environment serializes calls. Every
/// operation validates completely before it writes, and ledger transfers are
/// issued before the engine's own record mutations so a propagated ledger
/// failure leaves no partial write.
pub struct CustodyEngine {
    config: Option<CustodyInfo>,
    registry: WhitelistRegistry,
    holders: HashMap<HolderId, HolderInfo>,
    withdraws: HashMap<WithdrawId, WithdrawInfo>,
    ledger: Arc<dyn TokenLedger>,
    context: Arc<dyn ExecutionContext>,
    events: Arc<dyn EventSink>,
}

impl CustodyEngine {
    pub fn new(
        ledger: Arc<dyn TokenLedger>,
        context: Arc<dyn ExecutionContext>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        CustodyEngine {
            config: None,
            registry: WhitelistRegistry::new(),
            holders: HashMap::new(),
            withdraws: HashMap::new(),
            ledger,
            context,
            events,
        }
    }

    // ---- global configuration ------------------------------------------

    pub fn initialize(
        &mut self,
        owner: Address,
        category_whitelists: HashMap<String, Vec<ContractCallWhiteList>>,
    ) -> Result<(), CustodyError> {
        if self.config.is_some() {
            return Err(CustodyError::conflict("Already initialized."));
        }

        let categories: Vec<String> = category_whitelists.keys().cloned().collect();
        let config = CustodyInfo::new(owner, categories)?;

        for (category, lists) in category_whitelists {
            self.registry.set_category(&category, lists);
        }
        self.config = Some(config);
        info!("custody engine initialized, owner {}", owner);
        Ok(())
    }

    pub fn add_category_to_call_whitelists(
        &mut self,
        category_whitelists: HashMap<String, Vec<ContractCallWhiteList>>,
    ) -> Result<(), CustodyError> {
        self.require_contract_owner()?;

        let config = self.config.as_mut().unwrap();
        for (category, lists) in category_whitelists {
            config.add_category(&category);
            self.registry.extend_category(&category, lists);
        }
        Ok(())
    }

    pub fn change_contract_owner(&mut self, new_owner: Address) -> Result<(), CustodyError> {
        self.require_contract_owner()?;
        if new_owner.is_zero() {
            return Err(CustodyError::precondition("Contract owner cannot be null."));
        }
        let config = self.config.as_mut().unwrap();
        info!("contract owner changed from {} to {}", config.owner(), new_owner);
        config.set_owner(new_owner);
        Ok(())
    }

    pub fn info(&self) -> Result<&CustodyInfo, CustodyError> {
        self.config
            .as_ref()
            .ok_or_else(|| CustodyError::not_found("Not initialized."))
    }

    pub fn category_hash(&self, category: &str) -> CategoryHash {
        WhitelistRegistry::category_hash(category)
    }

    // ---- holder lifecycle ----------------------------------------------

    pub fn create_holder(
        &mut self,
        input: CreateHolder,
    ) -> Result<(HolderId, Address), CustodyError> {
        if input.symbol.trim().is_empty() {
            return Err(CustodyError::precondition("Symbol required."));
        }
        self.ledger.token_info(&input.symbol)?;

        if input.owner_address.is_zero() {
            return Err(CustodyError::precondition("Owner address required."));
        }
        validate_management_addresses(&input.management_addresses)?;

        let transaction_id = self.context.transaction_id();
        let previous_block_hash = self.context.previous_block_hash();
        let holder_id: HolderId = HashDigest::concat(&transaction_id, &previous_block_hash);
        if self.holders.contains_key(&holder_id) {
            return Err(CustodyError::conflict("Holder already exists."));
        }

        let main_address = derive::main_address(&holder_id);
        let holder = HolderInfo {
            main_address,
            symbol: input.symbol.clone(),
            owner_address: input.owner_address,
            shutdown_address: input.shutdown_address,
            management_addresses: management_map(&input.management_addresses),
            is_shutdown: false,
            settings_effective_time: input
                .settings_effective_time
                .unwrap_or(DEFAULT_SETTINGS_EFFECTIVE_SECS),
            updating_info: None,
        };
        self.holders.insert(holder_id, holder);

        self.events.emit(CustodyEvent::HolderCreated {
            holder_id,
            symbol: input.symbol.clone(),
            owner_address: input.owner_address,
        });
        info!(
            "holder {} created for {} with main address {}",
            holder_id, input.symbol, main_address
        );
        Ok((holder_id, main_address))
    }

    pub fn holder_info(&self, holder_id: &HolderId) -> Result<&HolderInfo, CustodyError> {
        if holder_id.is_zero() {
            return Err(CustodyError::precondition("Holder id required."));
        }
        self.holders
            .get(holder_id)
            .ok_or_else(|| CustodyError::not_found("Holder is not initialized."))
    }

    // ---- virtual addresses ---------------------------------------------

    /// Pure lookup: anyone may compute the deposit address for a user token
    pub fn get_virtual_address(
        &self,
        input: VirtualAddressCalculation,
    ) -> Result<Address, CustodyError> {
        derive::virtual_user_address(
            &self.registry,
            &input.holder_id,
            &input.user_token,
            input.category.as_deref(),
        )
    }

    // ---- asset movement ------------------------------------------------

    pub fn move_asset_to_main_address(&mut self, input: AssetMove) -> Result<(), CustodyError> {
        if input.amount == 0 {
            return Err(CustodyError::precondition("Amount required."));
        }
        let sender = self.context.sender();
        let holder = self.active_holder(&input.holder_id)?;
        resolve_management_address(holder, &sender)?;

        let main_address = holder.main_address;
        let symbol = holder.symbol.clone();
        let from = derive::virtual_user_address(
            &self.registry,
            &input.holder_id,
            &input.user_token,
            input.category.as_deref(),
        )?;

        self.ledger
            .transfer(&from, &main_address, &symbol, input.amount)?;

        self.events.emit(CustodyEvent::AssetMovedToMainAddress {
            holder_id: input.holder_id,
            from,
            amount: input.amount,
        });
        debug!(
            "holder {}: moved {} {} from {} to main address",
            input.holder_id, input.amount, symbol, from
        );
        Ok(())
    }

    pub fn move_asset_from_main_address(&mut self, input: AssetMove) -> Result<(), CustodyError> {
        if input.amount == 0 {
            return Err(CustodyError::precondition("Amount required."));
        }
        let sender = self.context.sender();
        let holder = self.active_holder(&input.holder_id)?;
        let management = resolve_management_address(holder, &sender)?;
        authorize_move(management, input.amount)?;

        let main_address = holder.main_address;
        let symbol = holder.symbol.clone();
        let to = derive::virtual_user_address(
            &self.registry,
            &input.holder_id,
            &input.user_token,
            input.category.as_deref(),
        )?;

        self.ledger
            .transfer(&main_address, &to, &symbol, input.amount)?;

        self.events.emit(CustodyEvent::AssetMovedFromMainAddress {
            holder_id: input.holder_id,
            to,
            amount: input.amount,
        });
        debug!(
            "holder {}: moved {} {} from main address to {}",
            input.holder_id, input.amount, symbol, to
        );
        Ok(())
    }

    pub fn send_transaction_by_user_virtual_address(
        &mut self,
        input: VirtualTransaction,
    ) -> Result<(), CustodyError> {
        let sender = self.context.sender();
        let holder = self.active_holder(&input.holder_id)?;
        resolve_management_address(holder, &sender)?;

        let category_hash = WhitelistRegistry::category_hash(&input.category);
        if !self
            .registry
            .is_call_allowed(&category_hash, &input.to, &input.method_name)
        {
            return Err(CustodyError::unauthorized(
                "Contract call is not in the category whitelist.",
            ));
        }

        let identity = derive::virtual_user_identity(
            &self.registry,
            &input.holder_id,
            &input.user_token,
            Some(&input.category),
        )?;

        self.context.call_as_virtual_identity(VirtualCall {
            from_identity: identity,
            target: input.to,
            method: input.method_name,
            args: input.args,
        })
    }

    // ---- withdrawals ---------------------------------------------------

    pub fn request_withdraw(
        &mut self,
        input: WithdrawRequest,
    ) -> Result<WithdrawId, CustodyError> {
        if input.address.is_zero() {
            return Err(CustodyError::precondition("Address required."));
        }
        if input.amount == 0 {
            return Err(CustodyError::precondition("Amount required."));
        }

        let sender = self.context.sender();
        let holder = self.active_holder(&input.holder_id)?;
        let management = resolve_management_address(holder, &sender)?;
        authorize_move(management, input.amount)?;
        if management.approvals_required == 0 {
            return Err(CustodyError::unauthorized(
                "Current key cannot make withdraw request.",
            ));
        }
        let total_required = management.approvals_required;
        let limit_amount = management.limit_amount;
        let main_address = holder.main_address;
        let symbol = holder.symbol.clone();

        let balance = self.ledger.balance(&main_address, &symbol)?;
        if balance < input.amount {
            return Err(CustodyError::precondition("Insufficient balance to withdraw."));
        }

        let transaction_id = self.context.transaction_id();
        let withdraw_id: WithdrawId = HashDigest::concat(&transaction_id, &input.holder_id);
        if self.withdraws.contains_key(&withdraw_id) {
            return Err(CustodyError::conflict("Withdraw already exists."));
        }

        let now = self.context.current_time();
        self.withdraws.insert(
            withdraw_id,
            WithdrawInfo {
                holder_id: input.holder_id,
                address: input.address,
                amount: input.amount,
                total_required,
                limit_amount,
                approved_addresses: vec![sender],
                added_time: now,
            },
        );

        self.events.emit(CustodyEvent::WithdrawRequested {
            withdraw_id,
            holder_id: input.holder_id,
            request_address: sender,
            withdraw_address: input.address,
            amount: input.amount,
        });
        info!(
            "holder {}: withdraw {} requested, {} {} to {}",
            input.holder_id, withdraw_id, input.amount, symbol, input.address
        );
        Ok(withdraw_id)
    }

    pub fn approve_withdraw(
        &mut self,
        input: WithdrawApprove,
    ) -> Result<WithdrawApproval, CustodyError> {
        let withdraw = self
            .withdraws
            .get(&input.id)
            .ok_or_else(|| CustodyError::not_found("Withdraw not exists."))?;
        if withdraw.amount != input.amount || withdraw.address != input.address {
            return Err(CustodyError::precondition("Withdraw data not matched."));
        }

        let holder_id = withdraw.holder_id;
        let limit_amount = withdraw.limit_amount;
        let sender = self.context.sender();
        let holder = self.active_holder(&holder_id)?;
        let management = resolve_management_address(holder, &sender)?;
        if management.amount < limit_amount {
            return Err(CustodyError::unauthorized(
                "Current management address cannot approve, amount limited.",
            ));
        }
        let main_address = holder.main_address;
        let symbol = holder.symbol.clone();

        let now = self.context.current_time();
        let withdraw = self.withdraws.get(&input.id).unwrap();
        if withdraw.is_expired(now) {
            self.withdraws.remove(&input.id);
            warn!("withdraw {} expired before release", input.id);
            return Ok(WithdrawApproval::Expired);
        }

        // A key already on the list never counts twice.
        let newly_approved = !withdraw.has_approved(&sender);
        let approved = withdraw.approvals() + u32::from(newly_approved);
        let required = withdraw.total_required;

        if approved >= required {
            let destination = withdraw.address;
            let amount = withdraw.amount;
            self.ledger
                .transfer(&main_address, &destination, &symbol, amount)?;
            self.withdraws.remove(&input.id);

            self.events.emit(CustodyEvent::WithdrawReleased {
                withdraw_id: input.id,
                holder_id,
                withdraw_address: destination,
                amount,
            });
            info!(
                "holder {}: withdraw {} released, {} {} to {}",
                holder_id, input.id, amount, symbol, destination
            );
            return Ok(WithdrawApproval::Approved);
        }

        if newly_approved {
            self.withdraws
                .get_mut(&input.id)
                .unwrap()
                .approved_addresses
                .push(sender);
        }
        Ok(WithdrawApproval::Approving { approved, required })
    }

    /// Cancellation only removes pending liabilities, so it stays allowed
    /// while the holder is shut down
    pub fn cancel_withdraws(&mut self, input: CancelWithdraws) -> Result<(), CustodyError> {
        let sender = self.context.sender();
        let holder = self.holder_info(&input.holder_id)?;
        resolve_management_address(holder, &sender)?;

        for id in &input.ids {
            if let Some(withdraw) = self.withdraws.get(id) {
                if withdraw.holder_id != input.holder_id {
                    return Err(CustodyError::precondition("Holder not matched."));
                }
            }
        }
        for id in &input.ids {
            if self.withdraws.remove(id).is_some() {
                debug!("holder {}: withdraw {} cancelled", input.holder_id, id);
            }
        }
        Ok(())
    }

    /// Never fails: absent ids come back as the empty record
    pub fn pending_withdraw(&self, withdraw_id: &WithdrawId) -> WithdrawInfo {
        self.withdraws
            .get(withdraw_id)
            .cloned()
            .unwrap_or_default()
    }

    // ---- shutdown / update workflow ------------------------------------

    pub fn shutdown_holder(&mut self, holder_id: &HolderId) -> Result<(), CustodyError> {
        let sender = self.context.sender();
        let holder = self.holder_info(holder_id)?;
        if sender != holder.owner_address && sender != holder.shutdown_address {
            return Err(CustodyError::unauthorized("No permission."));
        }

        let holder = self.holders.get_mut(holder_id).unwrap();
        holder.is_shutdown = true;
        holder.updating_info = None;
        warn!("holder {} shut down by {}", holder_id, sender);
        Ok(())
    }

    pub fn reboot_holder(
        &mut self,
        holder_id: &HolderId,
        new_owner: Address,
    ) -> Result<(), CustodyError> {
        self.require_contract_owner()?;
        self.holder_info(holder_id)?;
        if new_owner.is_zero() {
            return Err(CustodyError::precondition("Owner address required."));
        }

        let holder = self.holders.get_mut(holder_id).unwrap();
        holder.is_shutdown = false;
        holder.management_addresses.clear();
        holder.updating_info = None;
        holder.owner_address = new_owner;
        warn!("holder {} rebooted, new owner {}", holder_id, new_owner);
        Ok(())
    }

    pub fn request_update_holder(
        &mut self,
        input: HolderUpdateRequest,
    ) -> Result<(), CustodyError> {
        let sender = self.context.sender();
        let holder = self.holder_info(&input.holder_id)?;
        if sender != holder.owner_address {
            return Err(CustodyError::unauthorized("No permission."));
        }
        check_distinct_addresses(&input.management_addresses)?;

        let settings_effective_time = input
            .settings_effective_time
            .unwrap_or(holder.settings_effective_time);
        let now = self.context.current_time();

        let holder = self.holders.get_mut(&input.holder_id).unwrap();
        // A fresh request silently supersedes any earlier pending one.
        holder.updating_info = Some(HolderUpdatingInfo {
            owner_address: input.owner_address,
            shutdown_address: input.shutdown_address,
            management_addresses: input.management_addresses,
            settings_effective_time,
            requested_at: now,
        });
        debug!("holder {}: settings update requested", input.holder_id);
        Ok(())
    }

    pub fn approve_update_holder(&mut self, holder_id: &HolderId) -> Result<(), CustodyError> {
        let sender = self.context.sender();
        let holder = self.holder_info(holder_id)?;
        if sender != holder.owner_address {
            return Err(CustodyError::unauthorized("No permission."));
        }
        let updating = holder
            .updating_info
            .as_ref()
            .ok_or_else(|| CustodyError::not_found("No pending update."))?;

        let now = self.context.current_time();
        if !holder.is_update_effective(now) {
            return Err(CustodyError::precondition("Effective time not arrived."));
        }
        validate_management_addresses(&updating.management_addresses)?;
        let updating = updating.clone();

        let holder = self.holders.get_mut(holder_id).unwrap();
        holder.management_addresses = management_map(&updating.management_addresses);
        holder.owner_address = updating.owner_address;
        holder.shutdown_address = updating.shutdown_address;
        holder.settings_effective_time = updating.settings_effective_time;
        holder.updating_info = None;
        info!("holder {}: settings update applied", holder_id);
        Ok(())
    }

    // ---- internal helpers ----------------------------------------------

    fn require_contract_owner(&self) -> Result<(), CustodyError> {
        let config = self.info()?;
        if self.context.sender() != *config.owner() {
            return Err(CustodyError::unauthorized("No permission."));
        }
        Ok(())
    }

    fn active_holder(&self, holder_id: &HolderId) -> Result<&HolderInfo, CustodyError> {
        let holder = self.holder_info(holder_id)?;
        if holder.is_shutdown {
            return Err(CustodyError::precondition("Holder is shut down."));
        }
        Ok(holder)
    }
}
