//! Defines the user store trait.

use crate::{
    Error,
    models::{NewUser, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user in the store.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the email is already registered.
    fn create(&mut self, user: NewUser) -> Result<User, Error>;

    /// Retrieve the user registered with `email`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no user has that email.
    fn get_by_email(&self, email: &str) -> Result<User, Error>;

    /// Retrieve the user with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no user has that ID.
    fn get(&self, id: UserID) -> Result<User, Error>;
}
