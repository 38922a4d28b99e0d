//! Identifier and validated scalar types for the marketplace domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-assigned unique identifier of a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw ledger task identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger account handle identifying an actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates a validated account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAccountId`] when the value is empty
    /// after trimming or contains interior whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidAccountId(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the account handle as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single 1–5 rating an author awards at completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Creates a validated rating.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRating`] when the value is zero or
    /// exceeds five.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value == 0 || value > 5 {
            return Err(TaskDomainError::InvalidRating(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate rating of an account as maintained by the ledger.
///
/// Zero means the account has never been rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRating(u8);

impl AccountRating {
    /// The unrated sentinel.
    pub const UNRATED: Self = Self(0);

    /// Creates a validated aggregate rating.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAccountRating`] when the value
    /// exceeds five.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value > 5 {
            return Err(TaskDomainError::InvalidAccountRating(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns `true` when the account has never been rated.
    #[must_use]
    pub const fn is_unrated(self) -> bool {
        self.0 == 0
    }

    /// Folds a newly awarded rating into the aggregate.
    ///
    /// The first rating is taken as-is; subsequent ratings average with the
    /// previous aggregate by integer midpoint, matching the ledger's own
    /// accumulation rule.
    #[must_use]
    pub const fn fold(self, rating: Rating) -> Self {
        if self.is_unrated() {
            Self(rating.value())
        } else {
            Self(self.0.midpoint(rating.value()))
        }
    }
}

impl fmt::Display for AccountRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Global platform fee percentage, read from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeePercentage(u8);

impl FeePercentage {
    /// Creates a validated fee percentage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidFeePercentage`] when the value is
    /// not below 100.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value >= 100 {
            return Err(TaskDomainError::InvalidFeePercentage(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for FeePercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Monetary amount in the ledger's native units.
///
/// One whole token is `10^24` native units. All arithmetic is integer-only;
/// display formatting truncates to two decimals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RewardAmount(u128);

impl RewardAmount {
    /// Native units per whole token.
    pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000_000_000;

    /// Minimum amount covering the ledger's per-task storage cost.
    pub const STORAGE_FLOOR: Self = Self(1_000_000_000_000_000_000_000);

    /// Wraps an amount of native units.
    #[must_use]
    pub const fn from_native(value: u128) -> Self {
        Self(value)
    }

    /// Returns the amount in native units.
    #[must_use]
    pub const fn native(self) -> u128 {
        self.0
    }

    /// Returns `true` when the amount exceeds the storage cost floor.
    #[must_use]
    pub const fn covers_storage_floor(self) -> bool {
        self.0 > Self::STORAGE_FLOOR.0
    }

    /// Computes the platform fee on this amount.
    ///
    /// Divides before multiplying, as the ledger does, so the product cannot
    /// overflow for any representable reward.
    #[must_use]
    pub fn platform_fee(self, percentage: FeePercentage) -> Self {
        Self(self.0 / 100 * u128::from(percentage.value()))
    }

    /// Returns the escrow total: this amount plus the platform fee.
    #[must_use]
    pub fn with_fee(self, percentage: FeePercentage) -> Self {
        Self(self.0.saturating_add(self.platform_fee(percentage).0))
    }
}

impl fmt::Display for RewardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNITS_PER_TOKEN;
        let cents = self.0 % Self::UNITS_PER_TOKEN / (Self::UNITS_PER_TOKEN / 100);
        write!(f, "{whole}.{cents:02}")
    }
}
