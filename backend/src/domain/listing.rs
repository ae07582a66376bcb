//! Listing aggregate: the sellable offering and its lifecycle rules.
//!
//! The funding target is always derived from the asset value and the share
//! the seller retains; clients can never supply it directly. Lifecycle rules
//! live here as pure functions so they are unit-testable without any adapter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Lifecycle state of a listing.
///
/// Transitions are caller-driven through status updates; the backend never
/// auto-transitions a listing to `Funded` when its target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Live,
    Funded,
    Cancelled,
}

impl ListingStatus {
    /// Stable wire/storage spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Live => "live",
            Self::Funded => "funded",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "live" => Ok(Self::Live),
            "funded" => Ok(Self::Funded),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

/// Validation errors for listing field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingValidationError {
    EmptyTitle,
    EmptyDescription,
    NonPositiveAssetValue,
    RetainOutOfRange,
    NonPositiveMinInvestment,
}

impl fmt::Display for ListingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::NonPositiveAssetValue => write!(f, "asset value must be positive"),
            Self::RetainOutOfRange => {
                write!(f, "seller retain percent must be between 0 and 100")
            }
            Self::NonPositiveMinInvestment => {
                write!(f, "minimum investment must be positive")
            }
        }
    }
}

impl std::error::Error for ListingValidationError {}

/// A seller's offering of fractional ownership in an asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub asset_value: Decimal,
    pub seller_retain_percent: Decimal,
    pub target_amount: Decimal,
    pub min_investment: Decimal,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing enriched with seller identity and the invested total, as read
/// models need it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingWithSeller {
    pub listing: Listing,
    pub seller_name: Option<String>,
    pub seller_email: String,
    pub total_invested: Decimal,
}

impl ListingWithSeller {
    /// Share of the target already committed, as a 2-decimal percentage.
    ///
    /// Reports zero when the target is zero to guard the division.
    pub fn percent_funded(&self) -> Decimal {
        if self.listing.target_amount.is_zero() {
            return Decimal::new(0, 2);
        }
        money2(self.total_invested / self.listing.target_amount * Decimal::ONE_HUNDRED)
    }
}

/// Quantize to the 2-decimal money scale used across the API, so amounts
/// render with a stable `x.00` shape regardless of input spelling.
pub fn money2(value: Decimal) -> Decimal {
    let mut quantized = value.round_dp(2);
    quantized.rescale(2);
    quantized
}

/// Derive the funding target from the asset value and the retained share.
///
/// `target = asset_value * (100 - retain) / 100`, rounded to 2 decimal
/// places (banker's rounding). A retained share above 100 would produce a
/// negative for-sale share; that clamps to zero.
pub fn derive_target_amount(asset_value: Decimal, seller_retain_percent: Decimal) -> Decimal {
    let for_sale = (Decimal::ONE_HUNDRED - seller_retain_percent).max(Decimal::ZERO);
    money2(asset_value * for_sale / Decimal::ONE_HUNDRED)
}

fn validate_retain(seller_retain_percent: Decimal) -> Result<(), ListingValidationError> {
    if seller_retain_percent < Decimal::ZERO || seller_retain_percent > Decimal::ONE_HUNDRED {
        return Err(ListingValidationError::RetainOutOfRange);
    }
    Ok(())
}

/// Validated input for creating a listing.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub asset_value: Decimal,
    pub seller_retain_percent: Decimal,
    pub min_investment: Option<Decimal>,
    pub status: Option<ListingStatus>,
}

/// Default floor for a single commitment.
pub const DEFAULT_MIN_INVESTMENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

impl ListingDraft {
    /// Validate the draft and assemble a persistable [`Listing`].
    ///
    /// # Errors
    /// Returns the first violated field constraint.
    pub fn into_listing(self, now: DateTime<Utc>) -> Result<Listing, ListingValidationError> {
        if self.title.trim().is_empty() {
            return Err(ListingValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ListingValidationError::EmptyDescription);
        }
        if self.asset_value <= Decimal::ZERO {
            return Err(ListingValidationError::NonPositiveAssetValue);
        }
        validate_retain(self.seller_retain_percent)?;
        let min_investment = self.min_investment.unwrap_or(DEFAULT_MIN_INVESTMENT);
        if min_investment <= Decimal::ZERO {
            return Err(ListingValidationError::NonPositiveMinInvestment);
        }

        Ok(Listing {
            id: Uuid::new_v4(),
            seller_id: self.seller_id,
            title: self.title,
            description: self.description,
            category: self.category,
            target_amount: derive_target_amount(self.asset_value, self.seller_retain_percent),
            asset_value: money2(self.asset_value),
            seller_retain_percent: money2(self.seller_retain_percent),
            min_investment: money2(min_investment),
            status: self.status.unwrap_or(ListingStatus::Draft),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update to a listing. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub asset_value: Option<Decimal>,
    pub seller_retain_percent: Option<Decimal>,
    pub min_investment: Option<Decimal>,
    pub status: Option<ListingStatus>,
}

impl ListingPatch {
    /// Whether the patch touches anything besides `status`.
    ///
    /// The edit-lock rule keys off this: non-status edits require the listing
    /// to still be a draft, while a status-only patch (publish/unpublish) is
    /// allowed from any state.
    pub const fn touches_non_status(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.asset_value.is_some()
            || self.seller_retain_percent.is_some()
            || self.min_investment.is_some()
    }

    /// Apply the patch, re-deriving the funding target when its inputs moved.
    ///
    /// # Errors
    /// Rejects values violating the same field constraints as creation.
    pub fn apply(self, listing: &mut Listing, now: DateTime<Utc>) -> Result<(), ListingValidationError> {
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(ListingValidationError::EmptyTitle);
            }
            listing.title = title;
        }
        if let Some(description) = self.description {
            if description.trim().is_empty() {
                return Err(ListingValidationError::EmptyDescription);
            }
            listing.description = description;
        }
        if let Some(category) = self.category {
            listing.category = Some(category);
        }
        if let Some(asset_value) = self.asset_value {
            if asset_value <= Decimal::ZERO {
                return Err(ListingValidationError::NonPositiveAssetValue);
            }
            listing.asset_value = money2(asset_value);
        }
        if let Some(retain) = self.seller_retain_percent {
            validate_retain(retain)?;
            listing.seller_retain_percent = money2(retain);
        }
        if let Some(min_investment) = self.min_investment {
            if min_investment <= Decimal::ZERO {
                return Err(ListingValidationError::NonPositiveMinInvestment);
            }
            listing.min_investment = money2(min_investment);
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
        listing.target_amount =
            derive_target_amount(listing.asset_value, listing.seller_retain_percent);
        listing.updated_at = now;
        Ok(())
    }
}

/// Whether the edit-lock rule permits this patch against the current status.
pub const fn edit_permitted(current: ListingStatus, patch: &ListingPatch) -> bool {
    matches!(current, ListingStatus::Draft) || !patch.touches_non_status()
}

/// Typed filter for listing queries; composed onto the query by adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub seller: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn draft(seller: UserId) -> ListingDraft {
        ListingDraft {
            seller_id: seller,
            title: "Dockside flat".to_owned(),
            description: "Two rooms over the marina".to_owned(),
            category: Some("residential".to_owned()),
            asset_value: dec!(500000),
            seller_retain_percent: dec!(40),
            min_investment: None,
            status: None,
        }
    }

    fn listing() -> Listing {
        draft(UserId::random())
            .into_listing(Utc::now())
            .expect("valid draft")
    }

    #[rstest]
    #[case(dec!(500000), dec!(40), dec!(300000.00))]
    #[case(dec!(1000), dec!(0), dec!(1000.00))]
    #[case(dec!(1000), dec!(100), dec!(0.00))]
    // Above 100 the for-sale share clamps to zero rather than going negative.
    #[case(dec!(1000), dec!(140), dec!(0.00))]
    // Banker's rounding on the half-cent.
    #[case(dec!(333.33), dec!(50), dec!(166.66))]
    fn target_amount_follows_the_invariant(
        #[case] asset_value: Decimal,
        #[case] retain: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(derive_target_amount(asset_value, retain), expected);
    }

    #[test]
    fn draft_defaults_min_investment_and_status() {
        let listing = listing();
        assert_eq!(listing.min_investment, dec!(100));
        assert_eq!(listing.status, ListingStatus::Draft);
        assert_eq!(listing.target_amount, dec!(300000.00));
    }

    #[rstest]
    #[case(dec!(-1), ListingValidationError::RetainOutOfRange)]
    #[case(dec!(100.01), ListingValidationError::RetainOutOfRange)]
    fn retain_outside_range_is_rejected(
        #[case] retain: Decimal,
        #[case] expected: ListingValidationError,
    ) {
        let mut input = draft(UserId::random());
        input.seller_retain_percent = retain;
        assert_eq!(input.into_listing(Utc::now()).expect_err("invalid"), expected);
    }

    #[test]
    fn zero_asset_value_is_rejected() {
        let mut input = draft(UserId::random());
        input.asset_value = Decimal::ZERO;
        assert_eq!(
            input.into_listing(Utc::now()).expect_err("invalid"),
            ListingValidationError::NonPositiveAssetValue
        );
    }

    #[rstest]
    #[case(ListingStatus::Draft, true)]
    #[case(ListingStatus::Live, false)]
    #[case(ListingStatus::Funded, false)]
    #[case(ListingStatus::Cancelled, false)]
    fn non_status_edits_require_draft(#[case] current: ListingStatus, #[case] permitted: bool) {
        let patch = ListingPatch {
            title: Some("New title".to_owned()),
            ..ListingPatch::default()
        };
        assert_eq!(edit_permitted(current, &patch), permitted);
    }

    #[rstest]
    #[case(ListingStatus::Draft)]
    #[case(ListingStatus::Live)]
    #[case(ListingStatus::Funded)]
    #[case(ListingStatus::Cancelled)]
    fn status_only_patch_is_always_permitted(#[case] current: ListingStatus) {
        let patch = ListingPatch {
            status: Some(ListingStatus::Live),
            ..ListingPatch::default()
        };
        assert!(edit_permitted(current, &patch));
    }

    #[test]
    fn patch_rederives_target_amount() {
        let mut subject = listing();
        let patch = ListingPatch {
            seller_retain_percent: Some(dec!(80)),
            ..ListingPatch::default()
        };
        patch.apply(&mut subject, Utc::now()).expect("valid patch");
        assert_eq!(subject.target_amount, dec!(100000.00));
    }

    #[test]
    fn percent_funded_guards_zero_target() {
        let mut subject = listing();
        subject.target_amount = Decimal::ZERO;
        let read = ListingWithSeller {
            listing: subject,
            seller_name: None,
            seller_email: "s@example.com".to_owned(),
            total_invested: dec!(10),
        };
        assert_eq!(read.percent_funded().to_string(), "0.00");
    }

    #[test]
    fn percent_funded_rounds_to_two_places() {
        let read = ListingWithSeller {
            listing: listing(),
            seller_name: None,
            seller_email: "s@example.com".to_owned(),
            total_invested: dec!(100000),
        };
        assert_eq!(read.percent_funded().to_string(), "33.33");
    }

    #[rstest]
    #[case("draft", ListingStatus::Draft)]
    #[case("live", ListingStatus::Live)]
    #[case("funded", ListingStatus::Funded)]
    #[case("cancelled", ListingStatus::Cancelled)]
    fn status_parses_wire_spelling(#[case] raw: &str, #[case] expected: ListingStatus) {
        assert_eq!(raw.parse::<ListingStatus>().expect("known status"), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        assert!("archived".parse::<ListingStatus>().is_err());
    }
}
