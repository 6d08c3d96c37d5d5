//! Login credentials and their collection.
//!
//! On disk each credential is one line `username password role`, separated
//! by single spaces. Passwords are stored in plain text.

use crate::error::{Result, RosterError};
use crate::store::{FlatFile, LineCodec, Records, Rewrite, RewriteSummary};
use std::path::{Path, PathBuf};

pub const MAX_FIELD_LEN: usize = 49;

pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// A stored login. `role` keeps the label exactly as written in the file;
/// see [`crate::auth::Role::from_label`] for how it is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl Credential {
    pub fn new(username: &str, password: &str, role: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }

    pub fn default_admin() -> Self {
        Self::new(DEFAULT_ADMIN_USER, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_ROLE)
    }
}

/// Passwords share the file's whitespace-separated layout, so they may not
/// contain whitespace.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(RosterError::validation("password", "Password cannot be empty"));
    }
    if password.chars().count() > MAX_FIELD_LEN {
        return Err(RosterError::validation(
            "password",
            format!("Password must be at most {} characters", MAX_FIELD_LEN),
        ));
    }
    if password.chars().any(char::is_whitespace) {
        return Err(RosterError::validation(
            "password",
            "Password must not contain spaces",
        ));
    }
    Ok(())
}

pub struct CredentialCodec;

impl LineCodec for CredentialCodec {
    type Item = Credential;

    fn encode(item: &Credential) -> String {
        format!("{} {} {}", item.username, item.password, item.role)
    }

    fn decode(line: &str) -> Option<Credential> {
        let mut fields = line.split_whitespace();
        let credential = Credential::new(fields.next()?, fields.next()?, fields.next()?);
        if fields.next().is_some() {
            return None;
        }
        Some(credential)
    }
}

/// The credential collection
pub struct CredentialStore {
    file: FlatFile<CredentialCodec>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FlatFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Create the collection holding only the default admin if it is missing
    /// or holds no credentials. Returns true when the admin was written.
    pub fn ensure_default_admin(&self) -> Result<bool> {
        if self.file.exists() && self.list_all()?.next().is_some() {
            return Ok(false);
        }
        self.file.create_with(&[Credential::default_admin()])?;
        Ok(true)
    }

    pub fn list_all(&self) -> Result<Records<CredentialCodec>> {
        self.file.list_all()
    }

    pub fn rewrite_all<F>(&self, transform: F) -> Result<RewriteSummary>
    where
        F: FnMut(Credential) -> Rewrite<Credential>,
    {
        self.file.rewrite_all(transform)
    }

    /// Set the password of every credential named `username`.
    /// Roles and all other lines are written back untouched.
    pub fn set_password(&self, username: &str, password: &str) -> Result<RewriteSummary> {
        self.rewrite_all(|credential| {
            if credential.username == username {
                Rewrite::Replace(Credential {
                    password: password.to_string(),
                    ..credential
                })
            } else {
                Rewrite::Keep(credential)
            }
        })
    }
}
