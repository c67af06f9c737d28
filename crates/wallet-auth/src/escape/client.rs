use alloy_primitives::{Address, Bytes, Log, B256};
use alloy_sol_types::{SolCall, SolEvent};
use tracing::debug;

use super::{
    wait_for_timestamp, Escape, EscapeConfig, EscapeError, EscapeEvent, EscapeStatus, WaitConfig,
};
use crate::{contracts::IAccount, ChainProvider, Result, TransactionRequest};

/// Drives the escape entry points of one account and observes its escape on-chain.
///
/// The calldata builders return unsigned requests addressed to the account itself; they must be
/// signed with the signatories the entry point requires (see [`super::EscapeModel`]).
#[derive(Debug, Clone)]
pub struct EscapeClient<P> {
    provider: P,
    account: Address,
    config: EscapeConfig,
    wait: WaitConfig,
}

impl<P: ChainProvider> EscapeClient<P> {
    /// Creates a client for `account`.
    pub fn new(provider: P, account: Address, config: EscapeConfig) -> Self {
        Self { provider, account, config, wait: WaitConfig::default() }
    }

    /// Sets the bounds of timestamp waits.
    pub const fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Returns the account address.
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Returns the escape configuration.
    pub const fn config(&self) -> &EscapeConfig {
        &self.config
    }

    fn request(&self, call: impl SolCall) -> TransactionRequest {
        TransactionRequest::default().to(self.account).data(call.abi_encode())
    }

    /// Request triggering an escape of the owner. Signed by the guardian or the guardian backup.
    pub fn trigger_escape_owner(&self, new_owner: Address) -> TransactionRequest {
        self.request(IAccount::triggerEscapeOwnerCall { newOwner: new_owner })
    }

    /// Request triggering an escape of the guardian. Signed by the owner.
    pub fn trigger_escape_guardian(&self, new_guardian: Address) -> TransactionRequest {
        self.request(IAccount::triggerEscapeGuardianCall { newGuardian: new_guardian })
    }

    /// Request completing an escape of the owner. Signed by the guardian or the guardian backup.
    pub fn escape_owner(&self) -> TransactionRequest {
        self.request(IAccount::escapeOwnerCall {})
    }

    /// Request completing an escape of the guardian. Signed by the owner.
    pub fn escape_guardian(&self) -> TransactionRequest {
        self.request(IAccount::escapeGuardianCall {})
    }

    /// Request cancelling the pending escape. Signed by the owner and a guardian.
    pub fn cancel_escape(&self) -> TransactionRequest {
        self.request(IAccount::cancelEscapeCall {})
    }

    /// Request changing the owner.
    pub fn change_owner(&self, new_owner: Address) -> TransactionRequest {
        self.request(IAccount::changeOwnerCall { newOwner: new_owner })
    }

    /// Request changing the guardian.
    pub fn change_guardian(&self, new_guardian: Address) -> TransactionRequest {
        self.request(IAccount::changeGuardianCall { newGuardian: new_guardian })
    }

    /// Request changing the guardian backup.
    pub fn change_guardian_backup(&self, new_guardian_backup: Address) -> TransactionRequest {
        self.request(IAccount::changeGuardianBackupCall { newGuardianBackup: new_guardian_backup })
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let output = self.provider.call(self.account, Bytes::from(call.abi_encode())).await?;
        Ok(C::abi_decode_returns(&output)?)
    }

    /// Reads the pending escape.
    pub async fn escape(&self) -> Result<Escape> {
        Escape::try_from(self.read(IAccount::escapeCall {}).await?)
    }

    /// Reads the number of owner escapes the guardian triggered since the last reset.
    pub async fn guardian_escape_attempts(&self) -> Result<u32> {
        self.read(IAccount::guardianEscapeAttemptsCall {}).await
    }

    /// Reads the current owner.
    pub async fn owner(&self) -> Result<Address> {
        self.read(IAccount::ownerCall {}).await
    }

    /// Reads the current guardian.
    pub async fn guardian(&self) -> Result<Address> {
        self.read(IAccount::guardianCall {}).await
    }

    /// Reads the current guardian backup, zero if there is none.
    pub async fn guardian_backup(&self) -> Result<Address> {
        self.read(IAccount::guardianBackupCall {}).await
    }

    /// Returns the escape events the account emitted in the mined transaction `tx_hash`.
    pub async fn escape_events(&self, tx_hash: B256) -> Result<Vec<EscapeEvent>> {
        let logs = self.provider.transaction_logs(tx_hash).await?;
        Ok(self.decode_escape_events(&logs))
    }

    /// Decodes the escape events the account emitted among `logs`, in log order.
    pub fn decode_escape_events(&self, logs: &[Log]) -> Vec<EscapeEvent> {
        logs.iter()
            .filter(|log| log.address == self.account)
            .filter_map(decode_escape_event)
            .collect()
    }

    /// Returns the escape status at the latest block.
    pub async fn status(&self) -> Result<EscapeStatus> {
        let escape = self.escape().await?;
        let now = self.provider.latest_timestamp().await?;
        let status = escape.status(now, self.config.expiry_period);
        debug!(account = %self.account, ?escape, now, %status, "Observed escape");
        Ok(status)
    }

    /// Waits until the pending escape is active and returns the block timestamp reached.
    pub async fn wait_until_active(&self) -> Result<u64> {
        let escape = self.pending_escape("wait for active escape").await?;
        wait_for_timestamp(&self.provider, escape.active_at, &self.wait).await
    }

    /// Waits until the pending escape is expired and returns the block timestamp reached.
    pub async fn wait_until_expired(&self) -> Result<u64> {
        let escape = self.pending_escape("wait for expired escape").await?;
        wait_for_timestamp(&self.provider, escape.expires_at(self.config.expiry_period), &self.wait)
            .await
    }

    async fn pending_escape(&self, action: &'static str) -> Result<Escape> {
        let escape = self.escape().await?;
        if escape.is_none() {
            let status = EscapeStatus::None;
            return Err(EscapeError::InvalidEscapeState { action, status }.into());
        }
        Ok(escape)
    }
}

fn decode_escape_event(log: &Log) -> Option<EscapeEvent> {
    let data = &log.data;
    let topic = *data.topics().first()?;
    let event = if topic == IAccount::EscapeOwnerTriggerred::SIGNATURE_HASH {
        let event = IAccount::EscapeOwnerTriggerred::decode_log_data(data).ok()?;
        EscapeEvent::EscapeOwnerTriggered {
            active_at: event.activeAt.into(),
            new_owner: event.newOwner,
        }
    } else if topic == IAccount::EscapeGuardianTriggerred::SIGNATURE_HASH {
        let event = IAccount::EscapeGuardianTriggerred::decode_log_data(data).ok()?;
        EscapeEvent::EscapeGuardianTriggered {
            active_at: event.activeAt.into(),
            new_guardian: event.newGuardian,
        }
    } else if topic == IAccount::OwnerEscaped::SIGNATURE_HASH {
        EscapeEvent::OwnerEscaped(IAccount::OwnerEscaped::decode_log_data(data).ok()?.newOwner)
    } else if topic == IAccount::GuardianEscaped::SIGNATURE_HASH {
        let event = IAccount::GuardianEscaped::decode_log_data(data).ok()?;
        EscapeEvent::GuardianEscaped(event.newGuardian)
    } else if topic == IAccount::EscapeCanceled::SIGNATURE_HASH {
        EscapeEvent::EscapeCanceled
    } else {
        return None;
    };
    Some(event)
}
