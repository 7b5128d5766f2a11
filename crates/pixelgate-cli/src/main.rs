//! Pixelgate CLI: run the image intake pipeline against files on disk.
//!
//! Limits come from the environment (and `.env`); see `IntakeConfig::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pixelgate_cli::{
    render_classification, render_dimension_check, render_validation, sanitized_output_path,
};
use pixelgate_core::config::megabytes_to_bytes;
use pixelgate_core::{
    ErrorMetadata, FileDescriptor, IntakeConfig, IntakeError, OutputFormat, QualityPreset,
};
use pixelgate_infra::init_telemetry;
use pixelgate_processing::{
    LocalFile, SanitizeOptions, Sanitizer, SecurityValidator, ValidationOptions,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pixelgate", about = "Validate and sanitize untrusted image uploads")]
struct Cli {
    /// Print results as JSON (and log as JSON lines)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full security validation on a file
    Validate {
        file: PathBuf,
        /// Rate-limit identity (user id, session, client address)
        #[arg(long)]
        identity: Option<String>,
        #[arg(long)]
        skip_rate_limit: bool,
        /// Per-call size limit in MB, instead of MAX_FILE_SIZE_MB
        #[arg(long)]
        max_size_mb: Option<u64>,
        /// Intended conversion target (checked for RAW sources)
        #[arg(long)]
        target: Option<String>,
        /// Declared MIME type, instead of the one implied by the extension
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Classify a file by declared MIME type and extension
    Classify {
        file: PathBuf,
        /// Also sniff the magic bytes
        #[arg(long)]
        signature: bool,
    },
    /// Validate, then re-encode a file into a clean copy
    Sanitize {
        file: PathBuf,
        /// Destination path (default: <stem>.sanitized.<ext> next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// jpeg, png, webp or avif (default: source format)
        #[arg(long)]
        format: Option<String>,
        /// best, better, normal, lighter or lightest (default: SANITIZE_QUALITY)
        #[arg(long)]
        quality: Option<String>,
    },
    /// List the output formats a file may be converted to
    Formats { file: PathBuf },
    /// Check whether a RAW file may be converted to the given target
    CheckConversion { target: String },
    /// Check a width and height against the configured limits
    Dimensions { width: u32, height: u32 },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn open_file(path: &Path, mime_type: Option<String>) -> anyhow::Result<LocalFile> {
    let file = LocalFile::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(match mime_type {
        Some(mime_type) => file.with_mime_type(Some(mime_type)),
        None => file,
    })
}

/// Surface a pipeline error with its code and suggested action.
fn report(err: IntakeError) -> anyhow::Error {
    let hint = err
        .suggested_action()
        .map(|action| format!(" ({})", action))
        .unwrap_or_default();
    anyhow::anyhow!("[{}] {}{}", err.error_code(), err, hint)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(cli.json).map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let config = IntakeConfig::from_env().context("Invalid intake configuration")?;
    let sanitize_quality = config.sanitize_quality;
    let validator = SecurityValidator::from_config(config);

    match cli.command {
        Commands::Validate {
            file,
            identity,
            skip_rate_limit,
            max_size_mb,
            target,
            mime_type,
        } => {
            let max_size = max_size_mb
                .map(|mb| megabytes_to_bytes("--max-size-mb", mb))
                .transpose()?;
            let file = open_file(&file, mime_type).await?;
            let options = ValidationOptions {
                max_size,
                skip_rate_limiting: skip_rate_limit,
                identity,
                target_format: target,
            };
            let result = validator.validate(Some(&file), &options).await;

            if cli.json {
                print_json(&result)?;
            } else {
                print!("{}", render_validation(&result));
            }

            if let Some(retry_after_secs) = result.retry_after_secs() {
                return Err(report(IntakeError::RateLimited { retry_after_secs }));
            }
            if !result.is_valid() {
                std::process::exit(1);
            }
        }
        Commands::Classify { file, signature } => {
            let file = open_file(&file, None).await?;
            let mut classification = validator.classifier().classify(&file);
            if signature && !classification.is_valid {
                let header = file
                    .read_header(validator.config().header_read_bytes)
                    .await
                    .context("Failed to read file header")?;
                classification = validator.classifier().detect_from_signature(&header);
            }

            if cli.json {
                print_json(&classification)?;
            } else {
                print!("{}", render_classification(&classification));
            }
        }
        Commands::Sanitize {
            file: path,
            output,
            format,
            quality,
        } => {
            let file = open_file(&path, None).await?;
            let result = validator
                .validate(
                    Some(&file),
                    &ValidationOptions {
                        target_format: format.clone(),
                        ..Default::default()
                    },
                )
                .await;
            if !result.is_valid() {
                if let Some(retry_after_secs) = result.retry_after_secs() {
                    return Err(report(IntakeError::RateLimited { retry_after_secs }));
                }
                if !cli.json {
                    print!("{}", render_validation(&result));
                }
                anyhow::bail!("{} rejected, not sanitizing", path.display());
            }

            let options = SanitizeOptions {
                format: format
                    .as_deref()
                    .map(OutputFormat::parse)
                    .transpose()
                    .map_err(report)?,
                quality: quality
                    .as_deref()
                    .map(QualityPreset::parse)
                    .transpose()
                    .map_err(report)?
                    .unwrap_or(sanitize_quality),
            };
            let sanitizer = Sanitizer::new(validator.decoder());
            let target = options
                .format
                .unwrap_or_else(|| sanitizer.default_output_format(&file));
            let sanitized = sanitizer.sanitize(&file, &options).await.map_err(report)?;

            let destination = output.unwrap_or_else(|| sanitized_output_path(&path, target));
            tokio::fs::write(&destination, sanitized.data())
                .await
                .with_context(|| format!("Failed to write {}", destination.display()))?;

            tracing::info!(
                input = %path.display(),
                output = %destination.display(),
                "Sanitized copy written"
            );

            if cli.json {
                print_json(&serde_json::json!({
                    "input": path,
                    "output": destination,
                    "format": target,
                    "original_bytes": file.size(),
                    "sanitized_bytes": sanitized.size(),
                }))?;
            } else {
                println!("{} -> {}", path.display(), destination.display());
            }
        }
        Commands::Formats { file } => {
            let file = open_file(&file, None).await?;
            let formats = validator.classifier().available_output_formats(&file);

            if cli.json {
                print_json(&formats)?;
            } else if formats.is_empty() {
                println!("no output formats (unsupported file)");
            } else {
                let names: Vec<&str> = formats.iter().map(|f| f.as_str()).collect();
                println!("{}", names.join(", "));
            }
        }
        Commands::CheckConversion { target } => {
            let check = validator.classifier().validate_raw_conversion(&target);

            if cli.json {
                print_json(&check)?;
            } else if check.is_valid {
                println!("OK: RAW files can be converted to {}", target);
            } else {
                println!("{}", check.error.as_deref().unwrap_or("Not allowed"));
            }
            if !check.is_valid {
                std::process::exit(1);
            }
        }
        Commands::Dimensions { width, height } => {
            let check = validator.validate_image_dimensions(width, height);

            if cli.json {
                print_json(&check)?;
            } else {
                print!("{}", render_dimension_check(&check));
            }
            if !check.valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
