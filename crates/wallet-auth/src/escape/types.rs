use alloy_primitives::Address;

use crate::{contracts::IAccount, WalletError};

/// Which party an escape replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u8)]
pub enum EscapeType {
    /// No escape is pending.
    #[default]
    None = 0,
    /// The guardian is being replaced. Triggered by the owner.
    Guardian = 1,
    /// The owner is being replaced. Triggered by the guardian or the guardian backup.
    Owner = 2,
}

impl TryFrom<u8> for EscapeType {
    type Error = WalletError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Guardian),
            2 => Ok(Self::Owner),
            other => Err(WalletError::UnknownEscapeType(other)),
        }
    }
}

/// The status of an escape at a given block timestamp.
///
/// Never stored; always derived with [`Escape::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EscapeStatus {
    /// No escape is pending.
    None,
    /// The escape is waiting for its security period to pass.
    Triggered,
    /// The escape can be completed.
    Active,
    /// The escape can no longer be completed.
    Expired,
}

/// A pending escape as stored by the account.
///
/// `escape_type` is [`EscapeType::None`] exactly when `active_at` is zero and `new_signer` is the
/// zero address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escape {
    /// Which party is being replaced.
    pub escape_type: EscapeType,
    /// The block timestamp from which the escape can be completed.
    pub active_at: u64,
    /// The signer replacing the escaped party.
    pub new_signer: Address,
}

impl Escape {
    /// The empty escape.
    pub const NONE: Self =
        Self { escape_type: EscapeType::None, active_at: 0, new_signer: Address::ZERO };

    /// Returns whether no escape is pending.
    pub fn is_none(&self) -> bool {
        self.escape_type == EscapeType::None
    }

    /// Returns the status of the escape at block timestamp `now`.
    ///
    /// An escape is [`EscapeStatus::Triggered`] before `active_at`, [`EscapeStatus::Active`] in
    /// `[active_at, active_at + expiry_period)` and [`EscapeStatus::Expired`] afterwards.
    pub const fn status(&self, now: u64, expiry_period: u64) -> EscapeStatus {
        if matches!(self.escape_type, EscapeType::None) {
            EscapeStatus::None
        } else if now < self.active_at {
            EscapeStatus::Triggered
        } else if now < self.active_at.saturating_add(expiry_period) {
            EscapeStatus::Active
        } else {
            EscapeStatus::Expired
        }
    }

    /// Returns the block timestamp from which the escape is expired.
    pub const fn expires_at(&self, expiry_period: u64) -> u64 {
        self.active_at.saturating_add(expiry_period)
    }
}

impl TryFrom<IAccount::Escape> for Escape {
    type Error = WalletError;

    fn try_from(escape: IAccount::Escape) -> Result<Self, Self::Error> {
        Ok(Self {
            escape_type: EscapeType::try_from(escape.escapeType)?,
            active_at: u64::from(escape.activeAt),
            new_signer: escape.newSigner,
        })
    }
}

impl From<Escape> for IAccount::Escape {
    /// The account stores `activeAt` as `uint32`; later timestamps saturate.
    fn from(escape: Escape) -> Self {
        Self {
            activeAt: u32::try_from(escape.active_at).unwrap_or(u32::MAX),
            escapeType: escape.escape_type as u8,
            newSigner: escape.new_signer,
        }
    }
}
