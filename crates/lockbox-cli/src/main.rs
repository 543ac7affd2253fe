//! `Lockbox` CLI: offline front end for the `Lockbox` envelope format.
//!
//! Encrypts and decrypts single values, audits an exported vault's
//! passwords, and prints the fixed wire parameters. Everything runs locally
//! through `lockbox-core`; no server is involved.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use lockbox_core::crypto::{IV_LEN, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN, TAG_LEN};
use lockbox_core::{EncodedEnvelope, Envelope, MasterPassword, VaultAnalysis, VaultRecord, analyze};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// Lockbox: password-keyed record envelopes.
#[derive(Parser)]
#[command(
    name = "lockbox",
    version,
    about = "Lockbox CLI: encrypt, decrypt, and audit vault records offline",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         LOCKBOX_MASTER_PASSWORD   Master password for every crypto command\n\n\
         {DIM}Examples:{RESET}\n  \
         lockbox encrypt 'hunter2' > envelope.json\n  \
         lockbox decrypt envelope.json\n  \
         lockbox analyze vault.json --json"
    ),
)]
struct Cli {
    /// Master password. Prefer the environment variable over the flag.
    #[arg(long, env = "LOCKBOX_MASTER_PASSWORD", hide_env_values = true, global = true)]
    master_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a value into a new envelope (JSON on stdout).
    Encrypt {
        /// Text to encrypt. Read from stdin when omitted; one trailing
        /// newline (`\n` or `\r\n`) is then dropped from the input.
        text: Option<String>,
        /// Encrypt stdin byte for byte, trailing newline included.
        #[arg(long)]
        keep_newline: bool,
    },
    /// Decrypt an envelope JSON file and print the plaintext.
    Decrypt {
        /// Path to the envelope JSON (`salt`, `iv`, `authTag`, `ciphertext`).
        file: PathBuf,
    },
    /// Audit a vault export for weak, reused, and old passwords.
    Analyze {
        /// Path to a JSON array of password records.
        file: PathBuf,
        /// Print the raw analysis as JSON.
        #[arg(long)]
        json: bool,
        /// Reference time for the age check (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Show the fixed envelope parameters.
    Params,
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn warning(msg: &str) {
    eprintln!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn score_color(score: u8) -> &'static str {
    match score {
        80..=100 => GREEN,
        50..=79 => YELLOW,
        _ => RED,
    }
}

fn print_analysis(analysis: &VaultAnalysis) {
    header("🛡", "Vault Security Report");
    let color = score_color(analysis.overall_score);
    println!(
        "  {DIM}{:<20}{RESET} {color}{BOLD}{}/100{RESET}",
        "Overall score", analysis.overall_score
    );
    kv_line("Passwords", &analysis.total_passwords.to_string());
    kv_line("Weak", &analysis.weak_count.to_string());
    kv_line("Reused", &analysis.reused_count.to_string());
    kv_line("Older than 1 year", &analysis.old_password_count.to_string());
    if analysis.skipped_count > 0 {
        kv_line("Skipped", &analysis.skipped_count.to_string());
    }

    let flagged: Vec<_> = analysis
        .passwords
        .iter()
        .filter(|p| p.is_weak || p.is_reused || p.is_old)
        .collect();
    if flagged.is_empty() {
        return;
    }

    println!();
    header("⚑", "Needs attention");
    for p in flagged {
        let mut tags = Vec::new();
        if p.is_weak {
            tags.push(format!("{RED}weak{RESET}"));
        }
        if p.is_reused {
            tags.push(format!("{YELLOW}reused{RESET}"));
        }
        if p.is_old {
            tags.push(format!("{DIM}old{RESET}"));
        }
        let label = p.name.as_deref().unwrap_or(&p.id);
        println!("  {WHITE}{label:<28}{RESET} {}", tags.join(" "));
    }
}

// ── Commands ─────────────────────────────────────────────────────────

fn master_password(supplied: Option<String>) -> Result<MasterPassword> {
    let supplied = supplied.ok_or_else(|| {
        anyhow!("master password required (use --master-password or LOCKBOX_MASTER_PASSWORD)")
    })?;
    MasterPassword::new(supplied).context("master password must not be empty")
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_stdin(keep_newline: bool) -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    // A single trailing newline comes from `echo` or the terminal, not the value.
    if !keep_newline && input.ends_with('\n') {
        input.pop();
        if input.ends_with('\r') {
            input.pop();
        }
    }
    Ok(input)
}

fn cmd_encrypt(master: &MasterPassword, text: Option<String>, keep_newline: bool) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            if io::stdin().is_terminal() {
                eprintln!("{DIM}Reading plaintext from stdin (Ctrl-D to finish)…{RESET}");
            }
            read_stdin(keep_newline)?
        }
    };

    let envelope = Envelope::encrypt(text.as_bytes(), master)?;
    let json = serde_json::to_string_pretty(&envelope.encode())
        .context("failed to serialize envelope")?;
    println!("{json}");
    Ok(())
}

fn cmd_decrypt(master: &MasterPassword, file: &Path) -> Result<()> {
    let encoded: EncodedEnvelope = serde_json::from_str(&read_file(file)?)
        .with_context(|| format!("{} is not an envelope JSON document", file.display()))?;
    let plaintext = encoded.decode()?.decrypt_to_string(master)?;
    println!("{plaintext}");
    Ok(())
}

fn cmd_analyze(
    master: &MasterPassword,
    file: &Path,
    json: bool,
    now: Option<DateTime<Utc>>,
) -> Result<()> {
    let records: Vec<VaultRecord> = serde_json::from_str(&read_file(file)?)
        .with_context(|| format!("{} is not a JSON array of password records", file.display()))?;

    let analysis = analyze(&records, master, now.unwrap_or_else(Utc::now));

    if analysis.looks_like_wrong_password() {
        warning(&format!(
            "none of the {} records could be decrypted; the master password is probably wrong",
            records.len()
        ));
    } else if analysis.skipped_count > 0 {
        warning(&format!(
            "{} record(s) could not be decrypted and were left out",
            analysis.skipped_count
        ));
    }

    if json {
        let out = serde_json::to_string_pretty(&analysis).context("failed to serialize analysis")?;
        println!("{out}");
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn cmd_params() {
    header("⚙", "Envelope parameters");
    kv_line("Cipher", "AES-256-GCM");
    kv_line("Key derivation", "PBKDF2-HMAC-SHA512");
    kv_line("Iterations", &PBKDF2_ITERATIONS.to_string());
    kv_line("Key length", &format!("{KEY_LEN} bytes"));
    kv_line("Salt length", &format!("{SALT_LEN} bytes"));
    kv_line("IV length", &format!("{IV_LEN} bytes"));
    kv_line("Tag length", &format!("{TAG_LEN} bytes"));
}

// ── Main ─────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Params => {
            cmd_params();
            Ok(())
        }
        Commands::Encrypt { text, keep_newline } => {
            cmd_encrypt(&master_password(cli.master_password)?, text, keep_newline)
        }
        Commands::Decrypt { file } => cmd_decrypt(&master_password(cli.master_password)?, &file),
        Commands::Analyze { file, json, now } => {
            cmd_analyze(&master_password(cli.master_password)?, &file, json, now)
        }
    }
}
