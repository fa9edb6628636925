//! Config validation CLI tool
//!
//! Validates an oncall-sim configuration file and reports any errors.

use oncall_util::{default_config_path, format_countdown};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an oncall-sim configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match oncall_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", oncall_config::CURRENT_CONFIG_VERSION);
            println!("  Service: {}", settings.api.base_url);
            println!(
                "  Login: {}",
                match (&settings.auth.credentials, &settings.auth.access_token) {
                    (Some(creds), _) => format!("as {}", creds.email),
                    (None, Some(_)) => "pre-issued token".to_string(),
                    (None, None) => "anonymous".to_string(),
                }
            );
            match settings.workday.company_id {
                Some(id) => println!("  Company: {}", id),
                None => println!("  Company: (chosen at start)"),
            }
            println!(
                "  Incident target: {} (unless the service sets one)",
                settings.workday.default_incidents_scheduled
            );

            println!();
            println!("Wait-time buckets:");
            for bucket in &settings.workday.intervals {
                println!(
                    "  - {:>5.1}%  {} .. {}  {}",
                    bucket.weight * 100.0,
                    format_countdown(bucket.min_seconds),
                    format_countdown(bucket.max_seconds),
                    bucket.label
                );
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                oncall_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                oncall_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                oncall_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                oncall_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        oncall_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
