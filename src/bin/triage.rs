//! Triage CLI
//!
//! Evaluate recorded responses against a protocol, validate protocol
//! documents, or print the call brief for a protocol.
//!
//! Usage:
//!   triage evaluate --category cancer --responses answers.json
//!   triage evaluate --protocol copd.json --responses - --force-follow-up
//!   triage validate protocols/*.json
//!   triage brief --category heart_failure

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use palliative_triage::protocols::{has_errors, validate_protocol};
use palliative_triage::triage::TriageAssessment;
use palliative_triage::{
    CallBrief, DefaultTriageEngine, InMemoryProtocolStore, Protocol, ProtocolCategory,
    ProtocolStore, Responses, TriageEngine, TriageError, TriagePolicy,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "triage")]
#[command(version)]
#[command(about = "Palliative care protocol triage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Policy file (defaults to $TRIAGE_POLICY, then the config directory)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Extra directory of protocol JSON files, loaded over the bundled ones
    #[arg(long, global = true)]
    protocols: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one set of responses
    Evaluate {
        #[command(flatten)]
        source: ProtocolSource,

        /// Responses JSON file, or - for stdin
        #[arg(short, long)]
        responses: PathBuf,

        /// Assessment time for the follow-up date (defaults to now, UTC)
        #[arg(long)]
        assessed_at: Option<NaiveDateTime>,

        /// Follow up even when the result is routine
        #[arg(long)]
        force_follow_up: bool,
    },

    /// Check protocol documents for authoring defects
    Validate {
        /// Protocol JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the call brief of a protocol
    Brief {
        #[command(flatten)]
        source: ProtocolSource,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ProtocolSource {
    /// Use the active protocol of this category
    #[arg(short, long)]
    category: Option<ProtocolCategory>,

    /// Use this protocol file
    #[arg(short, long)]
    protocol: Option<PathBuf>,
}

#[derive(Serialize)]
struct EvaluateOutput {
    #[serde(flatten)]
    assessment: TriageAssessment,
    assessment_fields: palliative_triage::triage::AssessmentFields,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    palliative_triage::init_tracing();
    let cli = Cli::parse();

    let policy = match &cli.policy {
        Some(path) => TriagePolicy::load(path)?,
        None => TriagePolicy::load_or_default()?,
    };

    let result: serde_json::Value = match cli.command {
        Commands::Evaluate {
            source,
            responses,
            assessed_at,
            force_follow_up,
        } => {
            let protocol = resolve_protocol(&source, cli.protocols.as_deref())?;
            let responses = read_responses(&responses)?;
            let engine = DefaultTriageEngine::new(policy);

            let mut assessment = engine.assess(&protocol, &responses);
            if force_follow_up {
                assessment.result = assessment.result.with_follow_up_forced();
            }
            let assessed_at = assessed_at.unwrap_or_else(|| chrono::Utc::now().naive_utc());
            let assessment_fields = assessment.result.assessment_fields(assessed_at);
            serde_json::to_value(EvaluateOutput {
                assessment,
                assessment_fields,
            })?
        }
        Commands::Validate { files } => {
            let mut reports = Vec::new();
            let mut failed = 0usize;
            for path in &files {
                let protocol = Protocol::load(path)?;
                let issues = validate_protocol(&protocol);
                if has_errors(&issues) {
                    failed += 1;
                }
                reports.push(serde_json::json!({
                    "file": path.display().to_string(),
                    "protocol_id": protocol.id,
                    "issues": issues,
                }));
            }
            print_json(&serde_json::Value::Array(reports))?;
            if failed > 0 {
                return Err(format!("{failed} protocol(s) failed validation").into());
            }
            return Ok(());
        }
        Commands::Brief { source } => {
            let protocol = resolve_protocol(&source, cli.protocols.as_deref())?;
            serde_json::to_value(CallBrief::from_protocol(&protocol, &policy))?
        }
    };

    print_json(&result)
}

fn resolve_protocol(
    source: &ProtocolSource,
    extra_dir: Option<&Path>,
) -> Result<Arc<Protocol>, Box<dyn std::error::Error>> {
    if let Some(path) = &source.protocol {
        return Ok(Arc::new(Protocol::load(path)?));
    }

    let store = InMemoryProtocolStore::with_builtin()?;
    if let Some(dir) = extra_dir {
        store.load_dir(dir)?;
    }
    let category = source.category.ok_or(TriageError::NoProtocol)?;
    let protocol = store
        .latest_active(category)?
        .ok_or(TriageError::NoActiveProtocol(category))?;
    Ok(protocol)
}

fn read_responses(path: &Path) -> Result<Responses, Box<dyn std::error::Error>> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&json)?)
}

fn print_json(value: &serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
