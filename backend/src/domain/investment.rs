//! Investment aggregate: a commitment of funds against a listing.
//!
//! Admission is a pure function over the listing snapshot and the invested
//! total; adapters are required to evaluate it atomically with the insert so
//! concurrent commitments can reach the target but never overshoot it.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::listing::{Listing, ListingStatus};
use super::user::UserId;

/// A committed investment. Immutable once created; there is no update path.
#[derive(Debug, Clone, PartialEq)]
pub struct Investment {
    pub id: Uuid,
    pub investor_id: UserId,
    pub listing_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Investment joined with the listing summary fields read models need.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentWithListing {
    pub investment: Investment,
    pub listing_title: String,
    pub listing_asset_value: Decimal,
    pub listing_target_amount: Decimal,
}

impl InvestmentWithListing {
    /// The commitment as a share of the listing's total asset value, rounded
    /// to 2 decimal places. Reports zero when the asset value is zero.
    pub fn ownership_percent(&self) -> Decimal {
        ownership_percent(self.investment.amount, self.listing_asset_value)
    }
}

/// `amount / asset_value * 100` rounded to 2 places, zero-guarded.
pub fn ownership_percent(amount: Decimal, asset_value: Decimal) -> Decimal {
    if asset_value.is_zero() {
        return Decimal::new(0, 2);
    }
    super::listing::money2(amount / asset_value * Decimal::ONE_HUNDRED)
}

/// Unvalidated input for creating an investment.
///
/// The investor always comes from the session; any client-supplied investor
/// field was discarded before this point.
#[derive(Debug, Clone)]
pub struct InvestmentDraft {
    pub investor_id: UserId,
    pub listing_id: Uuid,
    pub amount: Decimal,
}

impl InvestmentDraft {
    /// Materialize the accepted commitment.
    pub fn into_investment(self, now: DateTime<Utc>) -> Investment {
        Investment {
            id: Uuid::new_v4(),
            investor_id: self.investor_id,
            listing_id: self.listing_id,
            amount: self.amount,
            created_at: now,
        }
    }
}

/// Why an investment was refused admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    ListingNotLive,
    NonPositiveAmount,
    BelowMinimum { minimum: Decimal },
    FullyFunded,
    ExceedsRemaining { remaining: Decimal },
}

impl AdmissionError {
    /// Machine-readable code surfaced in error details.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ListingNotLive => "listing_not_live",
            Self::NonPositiveAmount => "non_positive_amount",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::FullyFunded => "fully_funded",
            Self::ExceedsRemaining { .. } => "exceeds_remaining",
        }
    }
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListingNotLive => write!(f, "You can only invest in live listings."),
            Self::NonPositiveAmount => write!(f, "Investment amount must be positive."),
            Self::BelowMinimum { minimum } => write!(f, "Minimum investment is {minimum}."),
            Self::FullyFunded => write!(f, "This listing is fully funded."),
            Self::ExceedsRemaining { remaining } => {
                write!(f, "Only {remaining} remaining in this offering.")
            }
        }
    }
}

impl std::error::Error for AdmissionError {}

/// Decide whether `amount` may be committed against `listing` given the
/// currently invested total.
///
/// Checks run in a fixed order: lifecycle, positivity, per-commitment floor,
/// then capacity. The capacity check distinguishes an already-full listing
/// from one with insufficient remaining headroom so callers can surface the
/// exact remaining capacity.
pub fn admit(
    listing: &Listing,
    already_invested: Decimal,
    amount: Decimal,
) -> Result<(), AdmissionError> {
    if listing.status != ListingStatus::Live {
        return Err(AdmissionError::ListingNotLive);
    }
    if amount <= Decimal::ZERO {
        return Err(AdmissionError::NonPositiveAmount);
    }
    if amount < listing.min_investment {
        return Err(AdmissionError::BelowMinimum {
            minimum: listing.min_investment,
        });
    }
    if already_invested + amount > listing.target_amount {
        let remaining = listing.target_amount - already_invested;
        if remaining <= Decimal::ZERO {
            return Err(AdmissionError::FullyFunded);
        }
        return Err(AdmissionError::ExceedsRemaining { remaining });
    }
    Ok(())
}
