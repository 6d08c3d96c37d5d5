//! Roles, sessions and login.

use crate::credentials::CredentialStore;
use crate::error::{Result, RosterError};

/// Access role of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
    User,
    Guest,
}

impl Role {
    /// Interpret a stored role label. Labels are case-sensitive:
    /// `admin`, `STAFF` and `USER` are recognised, anything else is a guest.
    pub fn from_label(label: &str) -> Self {
        match label {
            "admin" => Self::Admin,
            "STAFF" => Self::Staff,
            "USER" => Self::User,
            _ => Self::Guest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "STAFF",
            Self::User => "USER",
            Self::Guest => "guest",
        }
    }

    pub fn menu_title(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN MENU",
            Self::Staff => "STAFF MENU",
            Self::User => "USER MENU",
            Self::Guest => "GUEST MENU",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity established by a successful login. Fixed for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    role: Role,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    #[cfg(test)]
    pub fn for_test(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            role,
        }
    }
}

/// Check a username/password pair against the credential collection.
///
/// Bootstraps the default admin first when the collection is missing or
/// empty. Comparison is exact; the first matching credential wins.
/// There is no retry here: a mismatch is final for this attempt.
pub fn login(credentials: &CredentialStore, username: &str, password: &str) -> Result<Session> {
    credentials.ensure_default_admin()?;

    for credential in credentials.list_all()? {
        let credential = credential?;
        if credential.username == username && credential.password == password {
            return Ok(Session {
                username: credential.username,
                role: Role::from_label(&credential.role),
            });
        }
    }

    Err(RosterError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(dir: &TempDir, content: &str) -> CredentialStore {
        let path = dir.path().join("credentials.txt");
        fs::write(&path, content).unwrap();
        CredentialStore::new(path)
    }

    #[test]
    fn test_role_labels_case_sensitive() {
        assert_eq!(Role::from_label("admin"), Role::Admin);
        assert_eq!(Role::from_label("STAFF"), Role::Staff);
        assert_eq!(Role::from_label("USER"), Role::User);
        assert_eq!(Role::from_label("ADMIN"), Role::Guest);
        assert_eq!(Role::from_label("staff"), Role::Guest);
        assert_eq!(Role::from_label("visitor"), Role::Guest);
    }

    #[test]
    fn test_default_admin_bootstrap_login() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.txt"));

        let session = login(&store, "admin", "admin123").unwrap();
        assert_eq!(session.username(), "admin");
        assert_eq!(session.role(), Role::Admin);
    }

    #[test]
    fn test_login_roles() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "admin admin123 admin\nsam pw STAFF\numa pw USER\ngil pw visitor\n");

        assert_eq!(login(&store, "sam", "pw").unwrap().role(), Role::Staff);
        assert_eq!(login(&store, "uma", "pw").unwrap().role(), Role::User);
        assert_eq!(login(&store, "gil", "pw").unwrap().role(), Role::Guest);
    }

    #[test]
    fn test_login_wrong_password() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "uma pw USER\n");

        assert!(matches!(
            login(&store, "uma", "PW"),
            Err(RosterError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "nobody", "pw"),
            Err(RosterError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_login_first_match_wins() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "dup pw USER\ndup pw admin\n");

        assert_eq!(login(&store, "dup", "pw").unwrap().role(), Role::User);
    }

    #[test]
    fn test_existing_store_not_bootstrapped() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "uma pw USER\n");

        assert!(login(&store, "admin", "admin123").is_err());
    }
}
