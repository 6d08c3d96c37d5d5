use crate::{
    auth::{self, Session},
    config::Config,
    credentials::CredentialStore,
    error::RosterError,
    ops::{Operations, Outcome, Request},
    policy::{Operation, PolicyEngine},
    students::{self, StudentRecord, StudentStore},
    transcript::Transcript,
};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

/// Source of already-read input lines
pub trait LineSource {
    /// None at end of input or on interrupt
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Offer a line to history. Only menu choices are offered, never passwords.
    fn remember(&mut self, _line: &str) {}
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remember(&mut self, line: &str) {
        let _ = self.add_history_entry(line);
    }
}

pub struct Context {
    pub config: Config,
    pub students: StudentStore,
    pub credentials: CredentialStore,
    pub transcript: RefCell<Transcript>,
}

impl Context {
    pub fn new(config: Config, transcript: Transcript) -> Self {
        let students = StudentStore::new(config.students_path());
        let credentials = CredentialStore::new(config.credentials_path());
        Self {
            config,
            students,
            credentials,
            transcript: RefCell::new(transcript),
        }
    }

    /// Transcript failures never stop the session
    fn record(&self, write: impl FnOnce(&mut Transcript) -> Result<()>) {
        if let Err(e) = write(&mut *self.transcript.borrow_mut()) {
            eprintln!("Warning: failed to write transcript: {}", e);
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    LoggedOut,
    Guest,
    LoginFailed,
}

/// Log in once, then serve the role menu until logout
pub fn run(ctx: &Context, input: &mut impl LineSource) -> Result<SessionEnd> {
    match login(ctx, input)? {
        Some(session) => run_menu(ctx, &session, input),
        None => Ok(SessionEnd::LoginFailed),
    }
}

fn login(ctx: &Context, input: &mut impl LineSource) -> Result<Option<Session>> {
    println!("-----LOGIN-----");
    let Some(username) = input.read_line("Username: ")? else {
        return Ok(None);
    };
    let Some(password) = input.read_line("Password: ")? else {
        return Ok(None);
    };
    let username = first_word(&username);
    let password = first_word(&password);

    if !ctx.credentials.path().exists() {
        println!("Credentials file not found. Creating default admin...");
    }

    match auth::login(&ctx.credentials, username, password) {
        Ok(session) => {
            ctx.record(|t| t.login_ok(session.username(), session.role().as_str()));
            Ok(Some(session))
        }
        Err(RosterError::InvalidCredentials) => {
            println!("Invalid username or password.");
            ctx.record(|t| t.login_failed(username));
            Ok(None)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ctx.record(|t| t.login_failed(username));
            Ok(None)
        }
    }
}

pub fn run_menu(ctx: &Context, session: &Session, input: &mut impl LineSource) -> Result<SessionEnd> {
    let policy = PolicyEngine::new(session.role());

    if !policy.has_menu() {
        println!("\n-----{}-----", session.role().menu_title());
        println!("Access Restricted. Please contact admin.");
        ctx.record(|t| t.logout(session.username()));
        return Ok(SessionEnd::Guest);
    }

    let ops = Operations::new(&ctx.students, &ctx.credentials);

    loop {
        println!("\n-----{}-----", session.role().menu_title());
        for line in policy.menu_lines() {
            println!("{}", line);
        }

        let op = match input.read_line("Enter your choice: ")? {
            None => Operation::Logout,
            Some(choice) => match policy.resolve(&choice) {
                Ok(op) => {
                    input.remember(choice.trim());
                    op
                }
                Err(_) => {
                    println!("Invalid choice. Please try again.");
                    // Free text stays out of the transcript
                    if let Some(op) = Operation::from_str(choice.trim()) {
                        ctx.record(|t| t.denied(op.as_str()));
                    }
                    continue;
                }
            },
        };

        if op == Operation::Logout {
            println!("Logging out...");
            ctx.record(|t| t.logout(session.username()));
            return Ok(SessionEnd::LoggedOut);
        }

        let Some(request) = read_request(&ops, op, input)? else {
            continue;
        };

        match ops.run(session, request) {
            Ok(outcome) => {
                ctx.record(|t| t.operation(op.as_str(), true, None));
                render(&outcome);
            }
            Err(e) => {
                let message = e.to_string();
                ctx.record(|t| t.operation(op.as_str(), false, Some(&message)));
                report(&e);
            }
        }
    }
}

/// Gather the inputs `op` needs. None sends the user back to the menu.
fn read_request(
    ops: &Operations,
    op: Operation,
    input: &mut impl LineSource,
) -> Result<Option<Request>> {
    let request = match op {
        Operation::Create => {
            let Some(roll) = read_roll(input, "Enter Roll Number: ")? else {
                return Ok(None);
            };
            let Some(name) = input.read_line("Enter Name: ")? else {
                return Ok(None);
            };
            let Some(marks) = read_marks(input, "Enter Marks (0-100): ")? else {
                return Ok(None);
            };
            Request::Create { roll, name, marks }
        }
        Operation::List => Request::List,
        Operation::Find => match read_roll(input, "Enter Roll Number to search: ")? {
            Some(roll) => Request::Find { roll },
            None => return Ok(None),
        },
        Operation::Update => {
            let Some(roll) = read_roll(input, "Enter Roll Number to update: ")? else {
                return Ok(None);
            };
            // Only ask for new details when there is something to update
            if let Err(e) = ops.find(roll) {
                report(&e);
                return Ok(None);
            }
            let Some(name) = input.read_line("Enter New Name: ")? else {
                return Ok(None);
            };
            let Some(marks) = read_marks(input, "Enter New Marks (0-100): ")? else {
                return Ok(None);
            };
            Request::Update { roll, name, marks }
        }
        Operation::Delete => match read_roll(input, "Enter Roll Number to delete: ")? {
            Some(roll) => Request::Delete { roll },
            None => return Ok(None),
        },
        Operation::ChangePassword => match input.read_line("Enter new password: ")? {
            Some(line) => Request::ChangePassword {
                new_password: line.trim().to_string(),
            },
            None => return Ok(None),
        },
        Operation::Logout => Request::Logout,
    };
    Ok(Some(request))
}

fn read_roll(input: &mut impl LineSource, prompt: &str) -> Result<Option<i32>> {
    let Some(line) = input.read_line(prompt)? else {
        return Ok(None);
    };
    match line.trim().parse() {
        Ok(roll) => Ok(Some(roll)),
        Err(_) => {
            println!("Invalid input.");
            Ok(None)
        }
    }
}

/// Re-prompts until the marks are a number in range
fn read_marks(input: &mut impl LineSource, prompt: &str) -> Result<Option<f64>> {
    loop {
        let Some(line) = input.read_line(prompt)? else {
            return Ok(None);
        };
        match line.trim().parse::<f64>().ok().map(students::validate_marks) {
            Some(Ok(marks)) => return Ok(Some(marks)),
            _ => println!(
                "Invalid marks! Please enter between {} and {}.",
                students::MIN_MARKS,
                students::MAX_MARKS
            ),
        }
    }
}

fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn render(outcome: &Outcome) {
    match outcome {
        Outcome::Created(record) => println!("Student {} added successfully.", record.roll()),
        Outcome::Listing(records) => print_table(records),
        Outcome::Found(record) => {
            println!("\nStudent Found:");
            println!("Roll: {}", record.roll());
            println!("Name: {}", record.name());
            println!("Marks: {:.2}", record.marks());
        }
        Outcome::Updated(record) => println!("Student {} updated successfully.", record.roll()),
        Outcome::Deleted { roll } => println!("Student {} deleted successfully.", roll),
        Outcome::PasswordChanged => println!("Password changed successfully."),
        Outcome::LoggedOut => println!("Logging out..."),
    }
}

fn print_table(records: &[StudentRecord]) {
    println!("\n{:<10} {:<30} {:<10}", "Roll", "Name", "Marks");
    println!("{}", "-".repeat(50));
    for record in records {
        println!(
            "{:<10} {:<30} {:<10.2}",
            record.roll(),
            record.name(),
            record.marks()
        );
    }
}

fn report(e: &RosterError) {
    if !e.is_recoverable() {
        eprintln!("Error: {}", e);
        return;
    }
    match e {
        RosterError::Validation { .. } => println!("Error: {}", e),
        _ => println!("{}", e),
    }
}
