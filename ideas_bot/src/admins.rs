use std::collections::HashSet;

use teloxide::types::UserId;

use crate::error::IdeaError;

/// Fixed set of users allowed to see and manage all ideas.
#[derive(Clone, Debug, Default)]
pub struct Admins(HashSet<UserId>);

impl Admins {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Admins {
        Admins(ids.into_iter().map(UserId).collect())
    }

    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    /// Like [`Admins::is_admin`], but as an error for use with `?`.
    pub fn check(&self, user: UserId) -> Result<(), IdeaError> {
        if self.is_admin(user) {
            Ok(())
        } else {
            log::info!("Non-admin user {user} tried to use an admin command");
            Err(IdeaError::PermissionDenied)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let admins = Admins::new([1407696674, 955785809]);
        assert!(admins.is_admin(UserId(955785809)));
        assert!(!admins.is_admin(UserId(1)));
        assert!(admins.check(UserId(1407696674)).is_ok());
        assert!(matches!(
            admins.check(UserId(2)),
            Err(IdeaError::PermissionDenied)
        ));
    }

    #[test]
    fn nobody_is_admin_by_default() {
        let admins = Admins::new([]);
        assert!(admins.is_empty());
        assert!(!admins.is_admin(UserId(0)));
    }
}
