use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use intake_core::organizer::evidence_name;
use intake_core::{
	run_intake, verify_evidence, CaseId, CaseLayout, IntakeError, IntakeReport, RemoteStore,
	VerificationStatus,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;
mod exit_codes;
mod prompt;

use config::{intake_options, StoreArgs};
use prompt::Prompter;

#[derive(Parser, Debug)]
#[command(name = "intake", version, about = "Evidence Intake - hash, file and upload digital evidence")]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Directory that holds forensics/ (defaults to the home directory)
	#[arg(long, env = "INTAKE_BASE_DIR", global = true)]
	base_dir: Option<PathBuf>,

	/// Reuse an existing case directory instead of refusing it
	#[arg(long, global = true)]
	resume: bool,

	/// Print the final report as JSON
	#[arg(long, global = true)]
	json: bool,

	#[command(flatten)]
	store: StoreArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Prompt for case details, then hash, file and upload one evidence file (default)
	Intake,
	/// Re-hash stored evidence and compare it with its digest file
	Verify {
		/// Case number or identifier
		#[arg(long)]
		case: String,
		/// Evidence file name inside the case's evidence/ directory
		filename: String,
	},
}

fn main() -> ExitCode {
	// Diagnostics go to stderr so prompts stay readable
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();

	let cli = Cli::parse();
	let result = match cli.command {
		None | Some(Commands::Intake) => intake(&cli),
		Some(Commands::Verify { ref case, ref filename }) => verify(&cli, case, filename),
	};

	match result {
		Ok(code) => ExitCode::from(code),
		Err(err) => {
			report_failure(&err);
			ExitCode::from(exit_codes::for_anyhow(&err))
		}
	}
}

fn intake(cli: &Cli) -> Result<u8> {
	let options = intake_options(cli.base_dir.clone(), cli.resume)?;
	let store = cli
		.store
		.to_config()?
		.build()
		.context("Failed to initialise remote store")?;

	let interactive = atty::is(atty::Stream::Stdin);
	let stdin = io::stdin();
	let answers = Prompter::new(stdin.lock(), io::stdout(), interactive).collect()?;

	let show_progress = !cli.json && atty::is(atty::Stream::Stdout);
	if show_progress {
		println!();
		println!("🔍 Processing evidence file: {}", answers.evidence.display());
	}
	let spinner = if show_progress {
		let pb = ProgressBar::new_spinner();
		pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
		pb.set_message(format!("Hashing and uploading to {}", store.location()));
		pb.enable_steady_tick(Duration::from_millis(120));
		Some(pb)
	} else {
		None
	};

	let result = run_intake(&answers.case, &answers.evidence, &options, &store);
	if let Some(pb) = spinner {
		pb.finish_and_clear();
	}
	let report = result?;

	if cli.json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	} else {
		print_summary(&report);
	}
	Ok(exit_codes::SUCCESS)
}

fn print_summary(report: &IntakeReport) {
	println!("✅ Case {} intake complete!", report.case.id);
	println!("📄 Evidence: {}", report.evidence_path.display());
	println!("   Size: {:.2} MB", report.evidence.size_mb());
	println!("   Type: {}", report.evidence.category);
	println!("🔒 SHA-256: {}", report.sha256);
	println!("   Digest file: {}", report.digest_path.display());
	println!("☁️  Uploaded to {}:", report.store);
	for key in &report.uploaded_keys {
		println!("   - {}", key);
	}
	println!("📝 Case log: {}", report.case_log.display());
}

#[derive(Serialize)]
struct VerifyOutput<'a> {
	case: &'a CaseId,
	filename: &'a str,
	status: VerificationStatus,
	expected: &'a str,
	actual: &'a str,
}

fn verify(cli: &Cli, case: &str, filename: &str) -> Result<u8> {
	let options = intake_options(cli.base_dir.clone(), false)?;
	let case_id = CaseId::parse(case)?;
	let layout = CaseLayout::new(&options.base_dir, &case_id);
	if evidence_name(Path::new(filename))? != filename {
		bail!(IntakeError::InvalidCase(format!(
			"{:?} is not a plain evidence file name",
			filename
		)));
	}

	let verification = verify_evidence(layout.evidence_path(filename), layout.digest_path(filename))?;

	if cli.json {
		let output = VerifyOutput {
			case: &case_id,
			filename,
			status: verification.status,
			expected: verification.expected.as_str(),
			actual: verification.actual.as_str(),
		};
		println!("{}", serde_json::to_string_pretty(&output)?);
	}

	match verification.status {
		VerificationStatus::Verified => {
			if !cli.json {
				println!("✅ {} matches its digest ({})", filename, verification.actual);
			}
			Ok(exit_codes::SUCCESS)
		}
		VerificationStatus::Corrupted => {
			if !cli.json {
				eprintln!("❌ {} does not match its digest", filename);
				eprintln!("   expected: {}", verification.expected);
				eprintln!("   actual:   {}", verification.actual);
			}
			Ok(exit_codes::VERIFICATION_FAILED)
		}
	}
}

fn report_failure(err: &anyhow::Error) {
	match err.downcast_ref::<IntakeError>() {
		Some(intake) => {
			eprintln!(
				"❌ Intake failed at stage '{}' ({}): {}",
				intake.stage(),
				intake.kind(),
				intake
			);
			if let Some(key) = intake.failed_key() {
				eprintln!("   Object not uploaded: {}", key);
				eprintln!("💡 Local evidence and digest files were kept; re-run with --resume to retry");
			}
		}
		None => eprintln!("❌ {:#}", err),
	}
}
