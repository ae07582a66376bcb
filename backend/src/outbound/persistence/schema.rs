//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, regenerate or update this
//! file to match (`diesel print-schema` against a live database).

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login identity, stored trimmed and lowercased.
        email -> Varchar,
        /// Optional display name.
        name -> Nullable<Varchar>,
        /// Argon2id credential in PHC string format.
        password_hash -> Varchar,
        /// Deactivated accounts cannot log in.
        is_active -> Bool,
        /// Grants access to administrative tooling.
        is_staff -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Sellable offerings and their lifecycle state.
    listings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning seller; cascades on account deletion.
        seller_id -> Uuid,
        /// Short display title.
        title -> Varchar,
        /// Long-form description.
        description -> Text,
        /// Optional free-form category tag.
        category -> Nullable<Varchar>,
        /// Total worth of the underlying asset.
        asset_value -> Numeric,
        /// Share of the asset the seller keeps, 0 to 100.
        seller_retain_percent -> Numeric,
        /// Derived capacity open to investors; never client-supplied.
        target_amount -> Numeric,
        /// Floor for a single commitment.
        min_investment -> Numeric,
        /// Lifecycle state: draft, live, funded, or cancelled.
        status -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Committed investments against listings.
    investments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning investor; cascades on account deletion.
        investor_id -> Uuid,
        /// Target listing; cascades on listing deletion.
        listing_id -> Uuid,
        /// Committed amount, positive, 2 decimal places.
        amount -> Numeric,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(listings -> users (seller_id));
diesel::joinable!(investments -> listings (listing_id));
diesel::joinable!(investments -> users (investor_id));

diesel::allow_tables_to_appear_in_same_query!(users, listings, investments);
