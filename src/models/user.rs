//! This file defines a user of the application.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to
/// better compile time errors, and more flexible generics that can have
/// distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// Everything in the store layer is scoped by the owning user's ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the database.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: String,
    /// The bcrypt hash of the user's password. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user that has not been inserted into the database yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The email address to register.
    pub email: String,
    /// The bcrypt hash of the chosen password.
    pub password_hash: String,
}

