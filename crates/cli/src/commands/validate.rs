//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::rig::{load_rig, ConnectionOverrides};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RigSummary>,
}

#[derive(Serialize)]
struct RigSummary {
    host: String,
    port: u16,
    vehicle: String,
    sensor_count: usize,
    actor_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_rig(args);
    info!(source = %result.source, valid = result.valid, "Validated rig");

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Rig validation failed")
    }
}

fn validate_rig(args: &ValidateArgs) -> ValidationResult {
    let source = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string());

    match load_rig(args.config.as_deref(), &ConnectionOverrides::default()) {
        Ok(rig) => ValidationResult {
            valid: true,
            source,
            error: None,
            summary: Some(RigSummary {
                host: rig.connection.host.clone(),
                port: rig.connection.port,
                vehicle: rig.vehicle.blueprint.id.clone(),
                sensor_count: rig.sensors.len(),
                actor_count: rig.actor_count(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(e.to_string()),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Rig is valid: {}", result.source);
        if let Some(summary) = &result.summary {
            println!("  CARLA:   {}:{}", summary.host, summary.port);
            println!("  Vehicle: {}", summary.vehicle);
            println!(
                "  Sensors: {} ({} actors total)",
                summary.sensor_count, summary.actor_count
            );
        }
    } else {
        println!("✗ Rig is invalid: {}", result.source);
        if let Some(error) = &result.error {
            println!("  Error: {}", error);
        }
    }
}
