//! Authorization predicates.
//!
//! Ownership checks are explicit functions called from the services rather
//! than framework permission classes, so every gate is visible at the call
//! site.

use super::listing::Listing;
use super::user::UserId;

/// Reads are public; only the seller may mutate or delete a listing.
pub fn can_modify_listing(actor: &UserId, listing: &Listing) -> bool {
    listing.seller_id == *actor
}
