//! Client-side model of the account's escape rules.
//!
//! The account enforces these rules on-chain; the model mirrors them so tooling and tests can
//! predict the outcome of a call before sending it.
//!
//! ## Override policy
//!
//! - The owner may replace any pending escape at any time, including an escape of itself.
//! - The guardian (or the guardian backup) may replace an escape of the guardian only once it is
//!   [`EscapeStatus::Expired`]. Before that, the attempt fails with
//!   [`EscapeError::EscapeOverrideForbidden`].
//! - Either party may re-trigger an escape in its own direction.
//!
//! ## Attempt limiting
//!
//! Every owner escape triggered by the guardian is counted. Once the counter reaches
//! [`EscapeConfig::max_escape_attempts`], further triggers fail with
//! [`EscapeError::MaxEscapeAttemptsExceeded`]. Completing an escape, cancelling it, or any signer
//! change authorized by the owner resets the counter.
//!
//! Overriding an expired escape does not clear the counter, unlike account versions that reset
//! it on every expired override. The override counts as one more attempt, so a guardian at the
//! limit cannot trigger again by letting its pending escape expire.

use alloy_primitives::Address;
use bitflags::bitflags;
use tracing::{debug, info};

use super::{Escape, EscapeStatus, EscapeType};

/// The default security period: 7 days.
pub const DEFAULT_SECURITY_PERIOD: u64 = 7 * 24 * 60 * 60;

/// The default expiry period: 7 days.
pub const DEFAULT_EXPIRY_PERIOD: u64 = 7 * 24 * 60 * 60;

/// The default number of consecutive owner escapes the guardian may trigger.
pub const DEFAULT_MAX_ESCAPE_ATTEMPTS: u32 = 5;

/// Escape timing and limits of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeConfig {
    /// Seconds between triggering an escape and being able to complete it.
    pub security_period: u64,
    /// Seconds during which an active escape can be completed.
    pub expiry_period: u64,
    /// The number of consecutive owner escapes the guardian may trigger.
    pub max_escape_attempts: u32,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            security_period: DEFAULT_SECURITY_PERIOD,
            expiry_period: DEFAULT_EXPIRY_PERIOD,
            max_escape_attempts: DEFAULT_MAX_ESCAPE_ATTEMPTS,
        }
    }
}

impl EscapeConfig {
    /// Sets the security period.
    pub const fn with_security_period(mut self, security_period: u64) -> Self {
        self.security_period = security_period;
        self
    }

    /// Sets the expiry period.
    pub const fn with_expiry_period(mut self, expiry_period: u64) -> Self {
        self.expiry_period = expiry_period;
        self
    }

    /// Sets the maximum number of guardian-triggered owner escapes.
    pub const fn with_max_escape_attempts(mut self, max_escape_attempts: u32) -> Self {
        self.max_escape_attempts = max_escape_attempts;
        self
    }
}

bitflags! {
    /// The parties whose signatures authorize a call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Signers: u8 {
        /// The owner.
        const OWNER = 1 << 0;
        /// The guardian.
        const GUARDIAN = 1 << 1;
        /// The guardian backup.
        const GUARDIAN_BACKUP = 1 << 2;
    }
}

impl Signers {
    /// Returns whether exactly one of the guardians signed, and not the owner.
    pub fn is_single_guardian(self) -> bool {
        self == Self::GUARDIAN || self == Self::GUARDIAN_BACKUP
    }

    /// Returns whether the owner and one of the guardians signed.
    pub fn is_owner_and_guardian(self) -> bool {
        self.contains(Self::OWNER) && self.intersects(Self::GUARDIAN | Self::GUARDIAN_BACKUP)
    }
}

/// Errors raised by escape transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    /// The action requires a different escape status.
    #[error("cannot {action} while escape is {status}")]
    InvalidEscapeState {
        /// The attempted action
        action: &'static str,
        /// The status at the time of the attempt
        status: EscapeStatus,
    },

    /// The pending escape is of another type than the action completes.
    #[error("escape type is {actual}, expected {expected}")]
    InvalidEscapeType {
        /// The type the action completes
        expected: EscapeType,
        /// The pending type
        actual: EscapeType,
    },

    /// The caller may not replace the pending escape.
    #[error("pending {pending} escape cannot be overridden while {status}")]
    EscapeOverrideForbidden {
        /// The pending escape type
        pending: EscapeType,
        /// Its status at the time of the attempt
        status: EscapeStatus,
    },

    /// The guardian has triggered too many owner escapes.
    #[error("maximum of {max} owner escape attempts reached")]
    MaxEscapeAttemptsExceeded {
        /// The configured maximum
        max: u32,
    },

    /// The signers do not authorize the action.
    #[error("signers {0:?} are not authorized")]
    Unauthorized(Signers),

    /// The new signer is the zero address.
    #[error("new signer cannot be the zero address")]
    ZeroSigner,

    /// The action requires the account to have a guardian.
    #[error("account has no guardian")]
    NoGuardian,
}

/// What a successful transition changed. Mirrors the events the account emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeEvent {
    /// The guardian triggered an escape of the owner.
    EscapeOwnerTriggered {
        /// When the escape becomes active
        active_at: u64,
        /// The owner after completion
        new_owner: Address,
    },
    /// The owner triggered an escape of the guardian.
    EscapeGuardianTriggered {
        /// When the escape becomes active
        active_at: u64,
        /// The guardian after completion
        new_guardian: Address,
    },
    /// The owner was replaced.
    OwnerEscaped(Address),
    /// The guardian was replaced.
    GuardianEscaped(Address),
    /// The pending escape was cancelled.
    EscapeCanceled,
    /// The owner was changed.
    OwnerChanged(Address),
    /// The guardian was changed.
    GuardianChanged(Address),
    /// The guardian backup was changed.
    GuardianBackupChanged(Address),
}

/// The escape-relevant state of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeModel {
    owner: Address,
    guardian: Address,
    guardian_backup: Address,
    escape: Escape,
    guardian_escape_attempts: u32,
    config: EscapeConfig,
}

impl EscapeModel {
    /// Creates the state of a freshly initialized account. A zero `guardian` means none.
    pub const fn new(owner: Address, guardian: Address, config: EscapeConfig) -> Self {
        Self {
            owner,
            guardian,
            guardian_backup: Address::ZERO,
            escape: Escape::NONE,
            guardian_escape_attempts: 0,
            config,
        }
    }

    /// Returns the owner.
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the guardian, zero if none.
    pub const fn guardian(&self) -> Address {
        self.guardian
    }

    /// Returns the guardian backup, zero if none.
    pub const fn guardian_backup(&self) -> Address {
        self.guardian_backup
    }

    /// Returns the pending escape.
    pub const fn escape(&self) -> &Escape {
        &self.escape
    }

    /// Returns the number of owner escapes the guardian triggered since the last reset.
    pub const fn guardian_escape_attempts(&self) -> u32 {
        self.guardian_escape_attempts
    }

    /// Returns the escape configuration.
    pub const fn config(&self) -> &EscapeConfig {
        &self.config
    }

    /// Returns the escape status at block timestamp `now`.
    pub const fn status(&self, now: u64) -> EscapeStatus {
        self.escape.status(now, self.config.expiry_period)
    }

    /// The owner triggers an escape of the guardian.
    pub fn trigger_escape_guardian(
        &mut self,
        signers: Signers,
        new_guardian: Address,
        now: u64,
    ) -> Result<EscapeEvent, EscapeError> {
        if signers != Signers::OWNER {
            return Err(EscapeError::Unauthorized(signers));
        }
        if self.guardian.is_zero() {
            return Err(EscapeError::NoGuardian);
        }
        if new_guardian.is_zero() {
            return Err(EscapeError::ZeroSigner);
        }

        let active_at = now.saturating_add(self.config.security_period);
        self.replace_escape(Escape {
            escape_type: EscapeType::Guardian,
            active_at,
            new_signer: new_guardian,
        });
        info!(active_at, %new_guardian, "Guardian escape triggered");
        Ok(EscapeEvent::EscapeGuardianTriggered { active_at, new_guardian })
    }

    /// The guardian or the guardian backup triggers an escape of the owner.
    pub fn trigger_escape_owner(
        &mut self,
        signers: Signers,
        new_owner: Address,
        now: u64,
    ) -> Result<EscapeEvent, EscapeError> {
        if !signers.is_single_guardian() {
            return Err(EscapeError::Unauthorized(signers));
        }
        if self.guardian.is_zero() {
            return Err(EscapeError::NoGuardian);
        }
        if signers == Signers::GUARDIAN_BACKUP && self.guardian_backup.is_zero() {
            return Err(EscapeError::Unauthorized(signers));
        }
        if new_owner.is_zero() {
            return Err(EscapeError::ZeroSigner);
        }

        let status = self.status(now);
        if self.escape.escape_type == EscapeType::Guardian && status != EscapeStatus::Expired {
            return Err(EscapeError::EscapeOverrideForbidden {
                pending: EscapeType::Guardian,
                status,
            });
        }
        let max = self.config.max_escape_attempts;
        if self.guardian_escape_attempts >= max {
            return Err(EscapeError::MaxEscapeAttemptsExceeded { max });
        }

        self.guardian_escape_attempts += 1;
        let active_at = now.saturating_add(self.config.security_period);
        self.replace_escape(Escape {
            escape_type: EscapeType::Owner,
            active_at,
            new_signer: new_owner,
        });
        info!(
            active_at,
            %new_owner,
            attempts = self.guardian_escape_attempts,
            "Owner escape triggered"
        );
        Ok(EscapeEvent::EscapeOwnerTriggered { active_at, new_owner })
    }

    /// The guardian or the guardian backup completes an active escape of the owner.
    pub fn escape_owner(
        &mut self,
        signers: Signers,
        now: u64,
    ) -> Result<EscapeEvent, EscapeError> {
        if !signers.is_single_guardian() {
            return Err(EscapeError::Unauthorized(signers));
        }
        let new_owner = self.complete(EscapeType::Owner, "escape owner", now)?;
        self.owner = new_owner;
        info!(%new_owner, "Owner escaped");
        Ok(EscapeEvent::OwnerEscaped(new_owner))
    }

    /// The owner completes an active escape of the guardian.
    pub fn escape_guardian(
        &mut self,
        signers: Signers,
        now: u64,
    ) -> Result<EscapeEvent, EscapeError> {
        if signers != Signers::OWNER {
            return Err(EscapeError::Unauthorized(signers));
        }
        let new_guardian = self.complete(EscapeType::Guardian, "escape guardian", now)?;
        self.guardian = new_guardian;
        info!(%new_guardian, "Guardian escaped");
        Ok(EscapeEvent::GuardianEscaped(new_guardian))
    }

    /// The owner and a guardian jointly cancel the pending escape, whatever its status.
    pub fn cancel_escape(
        &mut self,
        signers: Signers,
        now: u64,
    ) -> Result<EscapeEvent, EscapeError> {
        if !signers.is_owner_and_guardian() {
            return Err(EscapeError::Unauthorized(signers));
        }
        let status = self.status(now);
        if status == EscapeStatus::None {
            return Err(EscapeError::InvalidEscapeState { action: "cancel escape", status });
        }
        self.reset();
        info!(previous = %status, "Escape canceled");
        Ok(EscapeEvent::EscapeCanceled)
    }

    /// Changes the owner.
    pub fn change_owner(
        &mut self,
        signers: Signers,
        new_owner: Address,
    ) -> Result<EscapeEvent, EscapeError> {
        self.authorize_signer_change(signers)?;
        if new_owner.is_zero() {
            return Err(EscapeError::ZeroSigner);
        }
        self.owner = new_owner;
        self.reset();
        Ok(EscapeEvent::OwnerChanged(new_owner))
    }

    /// Changes the guardian. A zero address removes it, unless a guardian backup is set.
    pub fn change_guardian(
        &mut self,
        signers: Signers,
        new_guardian: Address,
    ) -> Result<EscapeEvent, EscapeError> {
        self.authorize_signer_change(signers)?;
        if new_guardian.is_zero() && !self.guardian_backup.is_zero() {
            return Err(EscapeError::ZeroSigner);
        }
        self.guardian = new_guardian;
        self.reset();
        Ok(EscapeEvent::GuardianChanged(new_guardian))
    }

    /// Changes the guardian backup. A zero address removes it.
    pub fn change_guardian_backup(
        &mut self,
        signers: Signers,
        new_guardian_backup: Address,
    ) -> Result<EscapeEvent, EscapeError> {
        self.authorize_signer_change(signers)?;
        if self.guardian.is_zero() {
            return Err(EscapeError::NoGuardian);
        }
        self.guardian_backup = new_guardian_backup;
        self.reset();
        Ok(EscapeEvent::GuardianBackupChanged(new_guardian_backup))
    }

    /// Signer changes need the owner, and a guardian too if the account has one.
    fn authorize_signer_change(&self, signers: Signers) -> Result<(), EscapeError> {
        let authorized = if self.guardian.is_zero() {
            signers.contains(Signers::OWNER)
        } else {
            signers.is_owner_and_guardian()
        };
        if authorized {
            Ok(())
        } else {
            Err(EscapeError::Unauthorized(signers))
        }
    }

    /// Checks that the pending escape is an active escape of `expected` and clears it, returning
    /// its new signer.
    fn complete(
        &mut self,
        expected: EscapeType,
        action: &'static str,
        now: u64,
    ) -> Result<Address, EscapeError> {
        let status = self.status(now);
        if status == EscapeStatus::None {
            return Err(EscapeError::InvalidEscapeState { action, status });
        }
        if self.escape.escape_type != expected {
            return Err(EscapeError::InvalidEscapeType {
                expected,
                actual: self.escape.escape_type,
            });
        }
        if status != EscapeStatus::Active {
            return Err(EscapeError::InvalidEscapeState { action, status });
        }
        let new_signer = self.escape.new_signer;
        self.reset();
        Ok(new_signer)
    }

    fn replace_escape(&mut self, escape: Escape) {
        if !self.escape.is_none() {
            debug!(previous = ?self.escape, "Replacing pending escape");
        }
        self.escape = escape;
    }

    fn reset(&mut self) {
        self.escape = Escape::NONE;
        self.guardian_escape_attempts = 0;
    }
}
