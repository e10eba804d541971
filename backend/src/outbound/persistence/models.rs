//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to and from domain types live
//! here so every adapter maps rows the same way.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    Calculation, CalculationId, CalculationType, PasswordHash, StoredCalculation, User, UserId,
    UserProfile, UserValidationError,
};

use super::schema::{calculations, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Rebuild the domain user, re-validating stored profile fields.
    pub(crate) fn into_user(self) -> Result<User, UserValidationError> {
        let profile = UserProfile::try_from_strings(
            self.first_name,
            self.last_name,
            self.email,
            self.username,
        )?;
        let password_hash = PasswordHash::new(self.password_hash)?;
        Ok(User::new(
            UserId::from_uuid(self.id),
            profile,
            password_hash,
            self.created_at,
        )
        .with_status(self.is_active, self.is_verified)
        .with_timestamps(self.created_at, self.updated_at))
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        let profile = user.profile();
        Self {
            id: *user.id().as_uuid(),
            first_name: profile.first_name.as_ref(),
            last_name: profile.last_name.as_ref(),
            email: profile.email.as_ref(),
            username: profile.username.as_ref(),
            password_hash: user.password_hash().as_ref(),
            is_active: user.is_active(),
            is_verified: user.is_verified(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Changeset struct for updating existing user records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_verified: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&NewUserRow<'a>> for UserUpdate<'a> {
    fn from(row: &NewUserRow<'a>) -> Self {
        Self {
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            is_active: row.is_active,
            is_verified: row.is_verified,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculation models
// ---------------------------------------------------------------------------

/// Row struct for reading from the calculations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = calculations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CalculationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub a: f64,
    pub b: f64,
    pub calculation_type: String,
    pub result: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalculationRow {
    /// Rebuild the domain calculation. Returns the raw tag when it is not a
    /// known operation.
    pub(crate) fn into_calculation(self) -> Result<Calculation, String> {
        let Some(calculation_type) = CalculationType::parse_normalised(&self.calculation_type)
        else {
            warn!(
                value = %self.calculation_type,
                calculation_id = %self.id,
                "unrecognised calculation type in storage"
            );
            return Err(self.calculation_type);
        };
        Ok(Calculation::restore(StoredCalculation {
            id: CalculationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            a: self.a,
            b: self.b,
            calculation_type,
            result: self.result,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Insertable struct for new calculation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = calculations)]
pub(crate) struct NewCalculationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub a: f64,
    pub b: f64,
    pub calculation_type: &'static str,
    pub result: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Calculation> for NewCalculationRow {
    fn from(calculation: &Calculation) -> Self {
        Self {
            id: *calculation.id().as_uuid(),
            user_id: *calculation.user_id().as_uuid(),
            a: calculation.a(),
            b: calculation.b(),
            calculation_type: calculation.calculation_type().as_str(),
            result: calculation.result(),
            created_at: calculation.created_at(),
            updated_at: calculation.updated_at(),
        }
    }
}
