mod auth;
mod cli;
mod config;
mod credentials;
mod error;
mod ops;
mod policy;
mod store;
mod students;
mod transcript;

use anyhow::Result;
use clap::Parser;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "roster", about = "Role-gated student record keeper")]
pub struct Args {
    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "ROSTER_DATA_DIR",
        help = "Directory holding the student and credential files"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Do not write a session transcript")]
    pub no_transcript: bool,

    #[arg(long, help = "Debug output (print resolved settings)")]
    pub debug: bool,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: ignoring unreadable config: {}", e);
            config::Config::default()
        })
    };

    // CLI overrides
    if let Some(data_dir) = &args.data_dir {
        cfg.storage.data_dir = Some(data_dir.clone());
    }
    if args.no_transcript {
        cfg.transcript.enabled = Some(false);
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} errors)",
            errors.len()
        ));
    }

    let data_dir = cfg.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let transcript = if cfg.transcript_enabled() {
        let transcripts_dir = cfg.transcripts_dir();
        std::fs::create_dir_all(&transcripts_dir)?;
        let path = transcripts_dir.join(format!("{}.jsonl", session_id));
        transcript::Transcript::new(&path, &session_id)?
    } else {
        transcript::Transcript::disabled(&session_id)
    };

    let ctx = cli::Context::new(cfg, transcript);

    if args.debug {
        eprintln!("[DEBUG] Session: {}", ctx.transcript.borrow().session_id());
        eprintln!("[DEBUG] Students: {}", ctx.students.path().display());
        eprintln!("[DEBUG] Credentials: {}", ctx.credentials.path().display());
        match &ctx.transcript.borrow().path {
            Some(path) => eprintln!("[DEBUG] Transcript: {}", path.display()),
            None => eprintln!("[DEBUG] Transcript: disabled"),
        }
        eprintln!("[DEBUG] Config: {:?}", ctx.config);
    }

    if let Err(e) = ctx.transcript.borrow_mut().session_start(&data_dir) {
        eprintln!("Warning: failed to write transcript: {}", e);
    }

    let mut rl = DefaultEditor::new()?;
    match cli::run(&ctx, &mut rl)? {
        cli::SessionEnd::LoginFailed => {
            println!("\nAccess Denied. Exiting the system......");
            Ok(ExitCode::FAILURE)
        }
        cli::SessionEnd::LoggedOut | cli::SessionEnd::Guest => Ok(ExitCode::SUCCESS),
    }
}
