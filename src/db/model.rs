//! Row views returned by repositories.

use crate::model::User;

/// User row together with the stored bcrypt hash, used only by sign-in.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}
