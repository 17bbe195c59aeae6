//! Imagony: identity attestation for AI agents.
//!
//! Two document protocols share one pipeline: parse → validate →
//! canonicalize → hash → sign/verify.
//!
//! - **Soul** (`imagony/soul`): a markdown manifesto of an agent's
//!   principles, boundaries, and commitments, sealed with a content
//!   checksum and attested by self- and witness-signatures.
//! - **Fragility** (`imagony/fragility`): a JSON map of the agent's
//!   failure modes (breakpoints), dependencies, and risk metrics, with
//!   derived indicators and a compact card view.
//!
//! # Guarantees
//!
//! - **Deterministic canonicalization**: one byte representation per
//!   logical document; key order and section order never change the hash
//! - **Accumulating validation**: every violation is reported in one
//!   pass; content problems never raise errors
//! - **Hash-then-sign split**: signatures attest to content, never to
//!   other signatures or to the checksum itself
//! - **Algorithm-agnostic signing**: the scheme is derived from the key
//!   (Ed25519, RSA), not selected by the caller
//!
//! The core is pure and synchronous over in-memory text/JSON. File and
//! key I/O live only in the CLI surface defined here.
//!
//! # Crate Structure
//!
//! - [`core`]: error taxonomy, validation reports, hashing, signatures
//! - [`soul`]: front matter, section, and bullet grammar parsing,
//!   canonical markdown, schema validation, sealing
//! - [`fragility`]: canonical JSON, schema validation, sealing,
//!   indicators, card, templates

pub mod core;
pub mod fragility;
pub mod soul;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::AttestError;
use crate::core::report::ValidationOutcome;
use crate::core::signature;

#[derive(Parser, Debug)]
#[clap(
    name = "imagony",
    version = env!("CARGO_PKG_VERSION"),
    about = "Identity attestation for the Soul and Fragility protocols"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a document and print its content hash.
    Validate(ValidateCli),
    /// Recompute the checksum and emit the sealed canonical document.
    Seal(SealCli),
    /// Sign a document's content hash with a private key.
    Sign(SignCli),
    /// Verify a signature over a document's content hash.
    Verify(VerifyCli),
    /// Render indicators and the compact card for a Fragility document.
    Card(CardCli),
    /// Emit a starter document.
    Template(TemplateCli),
}

#[derive(clap::Args, Debug)]
struct ValidateCli {
    /// Document file to validate.
    path: PathBuf,
    /// Document kind: 'auto', 'soul', or 'fragility'.
    #[clap(long, default_value = "auto")]
    kind: String,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(clap::Args, Debug)]
struct SealCli {
    /// Document file to seal.
    path: PathBuf,
    /// Write the sealed document back in place instead of printing it.
    #[clap(long)]
    write: bool,
}

#[derive(clap::Args, Debug)]
struct SignCli {
    /// Document to hash and sign.
    #[clap(long, conflicts_with = "hash")]
    doc: Option<PathBuf>,
    /// Precomputed content hash (sha256:<hex> or bare hex).
    #[clap(long)]
    hash: Option<String>,
    /// PEM private key file; the algorithm is derived from the key.
    #[clap(long)]
    key: PathBuf,
}

#[derive(clap::Args, Debug)]
struct VerifyCli {
    /// Document to hash and verify against.
    #[clap(long, conflicts_with = "hash")]
    doc: Option<PathBuf>,
    /// Precomputed content hash (sha256:<hex> or bare hex).
    #[clap(long)]
    hash: Option<String>,
    /// Base64 signature to check.
    #[clap(long)]
    sig: String,
    /// PEM public key file.
    #[clap(long)]
    key: PathBuf,
}

#[derive(clap::Args, Debug)]
struct CardCli {
    /// Fragility document file.
    path: PathBuf,
    /// Drop the audited badge (caller attestation, default on).
    #[clap(long)]
    unaudited: bool,
    /// Set the witnessed badge (caller attestation, default off).
    #[clap(long)]
    witnessed: bool,
}

#[derive(clap::Args, Debug)]
struct TemplateCli {
    /// Template kind: 'soul' or 'fragility'.
    kind: String,
    /// Agent name to embed.
    #[clap(long)]
    agent: String,
    /// Soul scope ('portable' or 'platform:<name>'); soul templates only.
    #[clap(long, default_value = "portable")]
    scope: String,
    /// Sealed Soul hash to reference; fragility templates only.
    #[clap(long, default_value = "sha256:REPLACE_WITH_SOUL_HASH")]
    soul_hash: String,
    #[clap(long, default_value = "unspecified")]
    runtime: String,
    #[clap(long, default_value = "unspecified")]
    model: String,
    #[clap(long, default_value = "unspecified")]
    provider: String,
    #[clap(long, default_value = "unspecified")]
    region: String,
}

/// Which protocol a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Soul,
    Fragility,
}

/// Sniff the document kind: JSON objects are Fragility, everything else
/// is treated as Soul markdown.
pub fn detect_kind(text: &str) -> DocKind {
    if text.trim_start().starts_with('{') {
        DocKind::Fragility
    } else {
        DocKind::Soul
    }
}

fn resolve_kind(flag: &str, text: &str) -> Result<DocKind, AttestError> {
    match flag {
        "auto" => Ok(detect_kind(text)),
        "soul" => Ok(DocKind::Soul),
        "fragility" => Ok(DocKind::Fragility),
        other => Err(AttestError::UnknownKind(other.to_string())),
    }
}

/// Validate either document kind from raw text. Hard errors only for
/// unparseable JSON bodies; content problems land in the outcome.
pub fn validate_text(text: &str, kind: DocKind) -> Result<ValidationOutcome, AttestError> {
    match kind {
        DocKind::Soul => Ok(soul::validate_soul(text)),
        DocKind::Fragility => {
            let value: Value = serde_json::from_str(text)?;
            Ok(fragility::validate_fragility(&value))
        }
    }
}

fn read_doc(path: &Path) -> Result<String, AttestError> {
    fs::read_to_string(path).map_err(AttestError::IoError)
}

fn print_outcome_text(outcome: &ValidationOutcome) {
    for issue in &outcome.report.errors {
        println!("{} [{:?}] {}", "✗".red().bold(), issue.kind, issue.message);
    }
    for issue in &outcome.report.warnings {
        println!("{} {}", "!".yellow().bold(), issue.message);
    }
    match &outcome.hash_hex {
        Some(hash) => {
            println!(
                "{} valid ({} warning(s)) {}",
                "✓".green().bold(),
                outcome.report.warnings.len(),
                hash
            );
        }
        None => {
            println!(
                "{} invalid: {} error(s), {} warning(s)",
                "✗".red().bold(),
                outcome.report.errors.len(),
                outcome.report.warnings.len()
            );
        }
    }
}

fn doc_hash(text: &str) -> Result<String, AttestError> {
    let outcome = validate_text(text, detect_kind(text))?;
    match outcome.hash_hex {
        Some(hash) => Ok(hash),
        None => Err(AttestError::InvalidDocument(outcome.report.summary())),
    }
}

fn hash_input(doc: &Option<PathBuf>, hash: &Option<String>) -> Result<String, AttestError> {
    match (doc, hash) {
        (_, Some(hash)) => Ok(hash.clone()),
        (Some(path), None) => doc_hash(&read_doc(path)?),
        (None, None) => Err(AttestError::InvalidDocument(
            "either --doc or --hash is required".to_string(),
        )),
    }
}

fn execute_validate(cli: &ValidateCli) -> Result<(), AttestError> {
    let text = read_doc(&cli.path)?;
    let kind = resolve_kind(&cli.kind, &text)?;
    let outcome = validate_text(&text, kind)?;
    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        _ => print_outcome_text(&outcome),
    }
    if outcome.report.is_fatal() {
        return Err(AttestError::InvalidDocument(format!(
            "{} error(s)",
            outcome.report.errors.len()
        )));
    }
    Ok(())
}

fn execute_seal(cli: &SealCli) -> Result<(), AttestError> {
    let text = read_doc(&cli.path)?;
    let sealed = match detect_kind(&text) {
        DocKind::Soul => soul::update_checksum(&text)?,
        DocKind::Fragility => {
            let value: Value = serde_json::from_str(&text)?;
            fragility::update_checksum(&value)?
        }
    };
    if cli.write {
        fs::write(&cli.path, &sealed).map_err(AttestError::IoError)?;
        println!("{} sealed {}", "✓".green().bold(), cli.path.display());
    } else {
        print!("{}", sealed);
    }
    Ok(())
}

fn execute_sign(cli: &SignCli) -> Result<(), AttestError> {
    let hash = hash_input(&cli.doc, &cli.hash)?;
    let pem = read_doc(&cli.key)?;
    let signer = signature::signer_from_pem(&pem)?;
    let record = signature::sign_hash(&hash, signer.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn execute_verify(cli: &VerifyCli) -> Result<(), AttestError> {
    let hash = hash_input(&cli.doc, &cli.hash)?;
    let pem = read_doc(&cli.key)?;
    let verifier = signature::verifier_from_pem(&pem)?;
    if signature::verify_hash(&hash, &cli.sig, verifier.as_ref())? {
        println!("{} signature valid ({})", "✓".green().bold(), verifier.algorithm());
        Ok(())
    } else {
        println!("{} signature invalid", "✗".red().bold());
        Err(AttestError::InvalidDocument(
            "signature did not verify".to_string(),
        ))
    }
}

fn execute_card(cli: &CardCli) -> Result<(), AttestError> {
    let text = read_doc(&cli.path)?;
    let value: Value = serde_json::from_str(&text)?;
    let outcome = fragility::validate_fragility(&value);
    if outcome.report.is_fatal() {
        return Err(AttestError::InvalidDocument(outcome.report.summary()));
    }
    let doc: fragility::FragilityDocument = serde_json::from_value(value)?;
    let indicators = fragility::compute_indicators(&doc, chrono::Utc::now());
    let card = fragility::build_card(
        &doc,
        &indicators,
        fragility::CardOptions {
            audited: !cli.unaudited,
            witnessed: cli.witnessed,
        },
    );
    let view = serde_json::json!({ "indicators": indicators, "card": card });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn execute_template(cli: &TemplateCli) -> Result<(), AttestError> {
    match cli.kind.as_str() {
        "soul" => {
            print!("{}", fragility::soul_template(&cli.agent, &cli.scope));
            Ok(())
        }
        "fragility" => {
            let doc = fragility::create_template(
                &cli.agent,
                &cli.soul_hash,
                fragility::Environment {
                    runtime: cli.runtime.clone(),
                    model: cli.model.clone(),
                    provider: cli.provider.clone(),
                    region: cli.region.clone(),
                },
            );
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        other => Err(AttestError::UnknownKind(other.to_string())),
    }
}

pub fn run() -> Result<(), AttestError> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Validate(args) => execute_validate(args),
        Command::Seal(args) => execute_seal(args),
        Command::Sign(args) => execute_sign(args),
        Command::Verify(args) => execute_verify(args),
        Command::Card(args) => execute_card(args),
        Command::Template(args) => execute_template(args),
    }
}
