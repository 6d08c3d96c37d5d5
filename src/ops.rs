//! The operation set a session can run against the stores.
//!
//! [`Operations::run`] checks the session's permissions before touching any
//! store, so a denied request never opens a collection file.

use crate::auth::Session;
use crate::credentials::{validate_password, CredentialStore};
use crate::error::{Result, RosterError};
use crate::policy::{Operation, PolicyEngine};
use crate::students::{StudentRecord, StudentStore};

/// A fully-read request from the front-end
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create { roll: i32, name: String, marks: f64 },
    List,
    Find { roll: i32 },
    Update { roll: i32, name: String, marks: f64 },
    Delete { roll: i32 },
    ChangePassword { new_password: String },
    Logout,
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::List => Operation::List,
            Self::Find { .. } => Operation::Find,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
            Self::ChangePassword { .. } => Operation::ChangePassword,
            Self::Logout => Operation::Logout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(StudentRecord),
    Listing(Vec<StudentRecord>),
    Found(StudentRecord),
    Updated(StudentRecord),
    Deleted { roll: i32 },
    PasswordChanged,
    LoggedOut,
}

pub struct Operations<'a> {
    students: &'a StudentStore,
    credentials: &'a CredentialStore,
}

impl<'a> Operations<'a> {
    pub fn new(students: &'a StudentStore, credentials: &'a CredentialStore) -> Self {
        Self {
            students,
            credentials,
        }
    }

    /// Authorize then execute one request for `session`
    pub fn run(&self, session: &Session, request: Request) -> Result<Outcome> {
        PolicyEngine::new(session.role()).check(request.operation())?;

        match request {
            Request::Create { roll, name, marks } => self.create(roll, &name, marks),
            Request::List => self.list().map(Outcome::Listing),
            Request::Find { roll } => self.find(roll).map(Outcome::Found),
            Request::Update { roll, name, marks } => self.update(roll, &name, marks),
            Request::Delete { roll } => self.delete(roll),
            Request::ChangePassword { new_password } => {
                self.change_password(session, &new_password)
            }
            Request::Logout => Ok(Outcome::LoggedOut),
        }
    }

    /// Validate and append a new student. Roll numbers must be unused.
    pub fn create(&self, roll: i32, name: &str, marks: f64) -> Result<Outcome> {
        let record = StudentRecord::new(roll, name, marks)?;
        if self.students.find_by_roll(roll)?.is_some() {
            return Err(RosterError::validation(
                "roll",
                format!("Roll Number {} already exists", roll),
            ));
        }
        self.students.append(&record)?;
        Ok(Outcome::Created(record))
    }

    pub fn list(&self) -> Result<Vec<StudentRecord>> {
        self.students.list_all()?.collect()
    }

    pub fn find(&self, roll: i32) -> Result<StudentRecord> {
        self.students
            .find_by_roll(roll)?
            .ok_or(RosterError::NotFound(roll))
    }

    pub fn update(&self, roll: i32, name: &str, marks: f64) -> Result<Outcome> {
        let record = StudentRecord::new(roll, name, marks)?;
        if self.students.replace_first(roll, record.clone())? {
            Ok(Outcome::Updated(record))
        } else {
            Err(RosterError::NotFound(roll))
        }
    }

    pub fn delete(&self, roll: i32) -> Result<Outcome> {
        if self.students.delete_first(roll)? {
            Ok(Outcome::Deleted { roll })
        } else {
            Err(RosterError::NotFound(roll))
        }
    }

    /// Reports success once the rewrite completes, whether or not a
    /// credential matched the session user.
    pub fn change_password(&self, session: &Session, new_password: &str) -> Result<Outcome> {
        validate_password(new_password)?;
        self.credentials
            .set_password(session.username(), new_password)?;
        Ok(Outcome::PasswordChanged)
    }
}
