//! Role-based permission decisions for menu operations.
//!
//! Each role maps to a fixed list of operations. The list order is also the
//! menu order, so item numbers are stable per role.

use crate::auth::Role;
use crate::error::{Result, RosterError};

/// Permission decision result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Everything a session can ask for from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Find,
    Update,
    Delete,
    ChangePassword,
    Logout,
}

impl Operation {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" | "add" => Some(Self::Create),
            "list" | "display" => Some(Self::List),
            "find" | "search" => Some(Self::Find),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "passwd" | "password" | "change-password" => Some(Self::ChangePassword),
            "logout" | "exit" | "quit" => Some(Self::Logout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Find => "find",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ChangePassword => "passwd",
            Self::Logout => "logout",
        }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Add Student",
            Self::List => "Display Students",
            Self::Find => "Search Students",
            Self::Update => "Update Student",
            Self::Delete => "Delete Student",
            Self::ChangePassword => "Change Password",
            Self::Logout => "Logout",
        }
    }
}

use Operation::*;

const ADMIN_OPS: &[Operation] = &[Create, List, Find, Update, Delete, ChangePassword, Logout];
const STAFF_OPS: &[Operation] = &[Create, List, Find, Update, ChangePassword, Logout];
const USER_OPS: &[Operation] = &[List, Find, Logout];
const GUEST_OPS: &[Operation] = &[];

/// Permitted operations for a role, in menu order
pub fn permitted(role: Role) -> &'static [Operation] {
    match role {
        Role::Admin => ADMIN_OPS,
        Role::Staff => STAFF_OPS,
        Role::User => USER_OPS,
        Role::Guest => GUEST_OPS,
    }
}

/// The policy engine that gates operations for one session role
#[derive(Debug, Clone, Copy)]
pub struct PolicyEngine {
    role: Role,
}

impl PolicyEngine {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn permitted(&self) -> &'static [Operation] {
        permitted(self.role)
    }

    /// Guests get no menu at all
    pub fn has_menu(&self) -> bool {
        !self.permitted().is_empty()
    }

    pub fn decide(&self, op: Operation) -> Decision {
        if self.permitted().contains(&op) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn check(&self, op: Operation) -> Result<()> {
        match self.decide(op) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(RosterError::InvalidChoice(format!(
                "{} is not available to {}",
                op.as_str(),
                self.role
            ))),
        }
    }

    /// Resolve a menu answer: a 1-based item number or an operation name.
    pub fn resolve(&self, choice: &str) -> Result<Operation> {
        let choice = choice.trim();
        let ops = self.permitted();

        if let Ok(n) = choice.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| ops.get(i).copied())
                .ok_or_else(|| RosterError::InvalidChoice(choice.to_string()));
        }

        match Operation::from_str(choice) {
            Some(op) => self.check(op).map(|_| op),
            None => Err(RosterError::InvalidChoice(choice.to_string())),
        }
    }

    /// Numbered menu lines: `1. Add Student`
    pub fn menu_lines(&self) -> Vec<String> {
        self.permitted()
            .iter()
            .enumerate()
            .map(|(i, op)| format!("{}. {}", i + 1, op.label()))
            .collect()
    }
}
