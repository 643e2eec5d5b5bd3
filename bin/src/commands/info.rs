//! Info command implementation.
//!
//! This module handles displaying the metadata of one dataset, including its
//! parameter table.

use anyhow::{Context, Result};
use hapi_lib::prelude::*;

/// Show dataset metadata and parameters.
pub(crate) async fn show_info(service: &HapiService, dataset: &str) -> Result<()> {
    let version = service.catalog().await?.version();
    let info = service
        .info(version, dataset)
        .await
        .with_context(|| format!("Unknown dataset: {dataset}"))?;

    println!("Dataset:     {dataset}");
    println!("HAPI:        {}", info.version());
    if let Some(description) = &info.description {
        println!("Description: {description}");
    }
    if let (Some(start), Some(stop)) = (&info.start_date, &info.stop_date) {
        println!("Available:   {start} to {stop}");
    }
    if let (Some(start), Some(stop)) = (&info.sample_start_date, &info.sample_stop_date) {
        println!("Sample:      {start} to {stop}");
    }
    if let Some(cadence) = &info.cadence {
        println!("Cadence:     {cadence}");
    }
    if let Some(max) = &info.max_request_duration {
        println!("Max request: {max}");
    }

    println!("\nParameters:");
    println!(
        "{:<24} {:<8} {:<10} {:<12} {:<12}",
        "NAME", "TYPE", "SIZE", "UNITS", "FILL"
    );
    println!("{}", "-".repeat(70));

    for param in &info.parameters {
        let size = param
            .size
            .as_ref()
            .map(|s| format!("{s:?}"))
            .unwrap_or_default();
        println!(
            "{:<24} {:<8} {:<10} {:<12} {:<12}",
            param.name,
            param.kind.as_str(),
            size,
            param.units_text().unwrap_or_default(),
            param.fill.as_deref().unwrap_or(""),
        );
    }

    println!("\nTotal: {} parameters", info.parameters.len());
    Ok(())
}
