//! Document Signing Tool - Command-line Interface
//! Author: kartik4091
//! Created: 2025-06-06
//!
//! Issues throwaway signing identities, signs and stamps documents, and
//! verifies detached signatures.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};
use docsign::config::SignerConfig;
use docsign::identity::{SignRequest, StampData};
use docsign::pipeline::{DocumentSignRequest, SignedPackage, SigningPipeline, VerificationRequest};
use docsign::utils::encoding::encode;
use docsign::{Error, Logger, Result};
use tracing::{error, info, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => match SignerConfig::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file: {}", e);
                process::exit(1);
            }
        },
        None => SignerConfig::default(),
    };

    let level = matches
        .get_one::<String>("verbose")
        .cloned()
        .unwrap_or_else(|| config.logging.level.clone());
    Logger::with_level(&level).init();

    info!("🚀 Document Signing Tool v{} - Starting...", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(
        matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    let pipeline = match SigningPipeline::new(config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("❌ Failed to initialise signing pipeline: {}", e);
            process::exit(1);
        }
    };

    match run(pipeline, &matches, timeout).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    }
}

/// Dispatches the chosen subcommand; returns the process exit code.
async fn run(pipeline: Arc<SigningPipeline>, matches: &ArgMatches, timeout: Duration) -> Result<i32> {
    match matches.subcommand() {
        Some(("issue", args)) => {
            let request = sign_request(args);
            let issued = blocking(timeout, move || pipeline.create_signature(&request)).await?;
            write_output(args, &issued.archive).await?;
            info!("📜 Issued certificate for {}", issued.subject);
            Ok(0)
        }
        Some(("sign", args)) => {
            let request = document_request(args).await?;
            let output = blocking(timeout, move || pipeline.sign_document(&request)).await?;
            write_output(args, &output).await?;
            info!("✅ Document signed");
            Ok(0)
        }
        Some(("sign-package", args)) => {
            let request = document_request(args).await?;
            let package = blocking(timeout, move || pipeline.sign_document_with_signature(&request)).await?;
            if let SignedPackage::Degraded { reason, .. } = &package {
                warn!("⚠️ Signature could not be created: {}", reason);
            }
            let degraded = package.is_degraded();
            write_output(args, package.archive()).await?;
            info!("📦 Package written");
            Ok(if degraded { 3 } else { 0 })
        }
        Some(("stamp", args)) => {
            let request = document_request(args).await?;
            let output = blocking(timeout, move || pipeline.add_stamp(&request)).await?;
            write_output(args, &output).await?;
            info!("🖋️ Stamp added");
            Ok(0)
        }
        Some(("verify", args)) => {
            let certificate = read_file(required(args, "certificate")?).await?;
            let signature = read_file(required(args, "signature")?).await?;
            let request = VerificationRequest {
                certificate_base64: encode(&certificate),
                signature_base64: String::from_utf8_lossy(&signature).trim().to_owned(),
                document_bytes: read_file(required(args, "input")?).await?,
            };
            let result = blocking(timeout, move || pipeline.verify(&request)).await?;
            if args.get_flag("json") {
                let json = serde_json::to_string_pretty(&result)
                    .map_err(|e| Error::Encoding(format!("Failed to serialize result: {}", e)))?;
                println!("{}", json);
            } else {
                print!("{}", result.message);
            }
            Ok(if result.is_valid() { 0 } else { 2 })
        }
        Some(("test-pdf", args)) => {
            let output = blocking(timeout, move || pipeline.generate_test_pdf()).await?;
            write_output(args, &output).await?;
            info!("📄 Test document written");
            Ok(0)
        }
        _ => Err(Error::Config("No subcommand given; see --help".into())),
    }
}

/// Runs a synchronous pipeline operation off the async runtime, bounded by
/// `timeout`.
async fn blocking<T, F>(timeout: Duration, operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(operation);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Worker task failed: {}", join_error),
        ))),
        Err(_) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("Operation exceeded {}s timeout", timeout.as_secs()),
        ))),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String> {
    args.get_one::<String>(name)
        .ok_or_else(|| Error::Config(format!("Missing required argument --{}", name)))
}

async fn read_file(path: &str) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path, e))))
}

async fn write_output(args: &ArgMatches, data: &[u8]) -> Result<()> {
    let path = PathBuf::from(required(args, "output")?);
    if path.exists() && !args.get_flag("force") {
        return Err(Error::Config(format!(
            "Output file already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }
    tokio::fs::write(&path, data).await?;
    info!("💾 Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

fn opt(args: &ArgMatches, name: &str) -> Option<String> {
    args.try_get_one::<String>(name).ok().flatten().cloned()
}

fn stamp_data(args: &ArgMatches) -> StampData {
    StampData {
        organization_name: opt(args, "stamp-organization"),
        director: opt(args, "stamp-director"),
        inn: opt(args, "stamp-inn"),
        validity_period: opt(args, "stamp-validity"),
    }
}

fn sign_request(args: &ArgMatches) -> SignRequest {
    SignRequest {
        surname: opt(args, "surname"),
        given_name: opt(args, "given-name"),
        title: opt(args, "title"),
        organization_name: opt(args, "organization"),
        city: opt(args, "city"),
        street_address: None,
        email: opt(args, "email"),
        inn: opt(args, "inn"),
        ogrn: opt(args, "ogrn"),
        stamp: stamp_data(args),
    }
}

/// The key file holds PKCS#8 DER as written to `private_key.der`.
async fn document_request(args: &ArgMatches) -> Result<DocumentSignRequest> {
    let private_key_base64 = match opt(args, "key") {
        Some(path) => Some(encode(&read_file(&path).await?)),
        None => None,
    };
    Ok(DocumentSignRequest {
        private_key_base64,
        certificate_base64: None,
        document_bytes: read_file(required(args, "input")?).await?,
        stamp: stamp_data(args),
    })
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Output file path")
        .required(true)
}

fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("Document to process")
        .required(true)
}

fn force_arg() -> Arg {
    Arg::new("force")
        .short('f')
        .long("force")
        .action(ArgAction::SetTrue)
        .help("Overwrite the output file if it exists")
}

fn key_arg(required: bool) -> Arg {
    Arg::new("key")
        .short('k')
        .long("key")
        .value_name("FILE")
        .help("Private key (PKCS#8 DER, as found in the issued archive)")
        .required(required)
}

fn stamp_args() -> [Arg; 4] {
    [
        Arg::new("stamp-organization")
            .long("stamp-organization")
            .value_name("TEXT")
            .help("Organization name drawn on the stamp"),
        Arg::new("stamp-director")
            .long("stamp-director")
            .value_name("TEXT")
            .help("Director name drawn on the stamp"),
        Arg::new("stamp-inn")
            .long("stamp-inn")
            .value_name("TEXT")
            .help("Tax id drawn on the stamp"),
        Arg::new("stamp-validity")
            .long("stamp-validity")
            .value_name("TEXT")
            .help("Validity period drawn on the stamp"),
    ]
}

fn build_cli() -> Command {
    Command::new("docsign")
        .version(env!("CARGO_PKG_VERSION"))
        .author("kartik4091")
        .about("Self-signed identities, detached signatures and PDF stamps")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .global(true)
            .help("Configuration file (JSON/YAML)"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .value_name("LEVEL")
            .global(true)
            .value_parser(["error", "warn", "info", "debug", "trace"])
            .help("Log level (overrides the config file)"))
        .arg(Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .global(true)
            .value_parser(clap::value_parser!(u64))
            .help("Abort an operation that runs longer than this"))
        .subcommand(Command::new("issue")
            .about("Issue a self-signed certificate and key as a zip archive")
            .arg(output_arg())
            .arg(force_arg())
            .arg(Arg::new("surname").long("surname").value_name("TEXT"))
            .arg(Arg::new("given-name").long("given-name").value_name("TEXT"))
            .arg(Arg::new("title").long("title").value_name("TEXT"))
            .arg(Arg::new("organization").long("organization").value_name("TEXT"))
            .arg(Arg::new("city").long("city").value_name("TEXT"))
            .arg(Arg::new("email").long("email").value_name("TEXT"))
            .arg(Arg::new("inn").long("inn").value_name("TEXT").help("Taxpayer identification number"))
            .arg(Arg::new("ogrn").long("ogrn").value_name("TEXT").help("State registration number"))
            .args(stamp_args()))
        .subcommand(Command::new("sign")
            .about("Stamp a PDF, or write the Base64 detached signature of any other document")
            .arg(input_arg())
            .arg(output_arg())
            .arg(force_arg())
            .arg(key_arg(false))
            .args(stamp_args()))
        .subcommand(Command::new("sign-package")
            .about("Stamp (PDF only) and sign a document into a zip archive")
            .arg(input_arg())
            .arg(output_arg())
            .arg(force_arg())
            .arg(key_arg(true))
            .args(stamp_args()))
        .subcommand(Command::new("stamp")
            .about("Add the visual stamp to every page of a PDF")
            .arg(input_arg())
            .arg(output_arg())
            .arg(force_arg())
            .args(stamp_args()))
        .subcommand(Command::new("verify")
            .about("Verify a detached signature against a certificate")
            .arg(input_arg())
            .arg(Arg::new("certificate")
                .long("certificate")
                .value_name("FILE")
                .help("Certificate (DER, as found in the issued archive)")
                .required(true))
            .arg(Arg::new("signature")
                .short('s')
                .long("signature")
                .value_name("FILE")
                .help("Base64 signature text")
                .required(true))
            .arg(Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the result as JSON")))
        .subcommand(Command::new("test-pdf")
            .about("Write a sample PDF document")
            .arg(output_arg())
            .arg(force_arg()))
}
