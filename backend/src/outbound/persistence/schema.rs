//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users.
    users (id) {
        id -> Uuid,
        first_name -> Varchar,
        last_name -> Varchar,
        /// Unique, stored lower-cased.
        email -> Varchar,
        /// Unique login handle.
        username -> Varchar,
        /// Opaque hash produced by the authentication service.
        password_hash -> Varchar,
        is_active -> Bool,
        is_verified -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Calculations owned by users.
    ///
    /// `type` is constrained to `add`, `subtract`, `multiply` or `divide`.
    calculations (id) {
        id -> Uuid,
        /// References `users.id`; rows cascade on user deletion.
        user_id -> Uuid,
        a -> Float8,
        b -> Float8,
        #[sql_name = "type"]
        calculation_type -> Varchar,
        result -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(calculations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(calculations, users);
