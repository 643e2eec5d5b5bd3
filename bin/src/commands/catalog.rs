//! Catalog command implementation.

use anyhow::Result;
use hapi_lib::prelude::*;

/// List the datasets a server offers.
pub(crate) async fn list_catalog(service: &HapiService) -> Result<()> {
    let catalog = service.catalog().await?;

    if catalog.catalog.is_empty() {
        println!("No datasets found.");
        return Ok(());
    }

    println!("{:<40} TITLE", "ID");
    println!("{}", "-".repeat(80));

    for entry in &catalog.catalog {
        println!("{:<40} {}", entry.id, entry.title.as_deref().unwrap_or(""));
    }

    println!(
        "\nTotal: {} datasets (HAPI {})",
        catalog.catalog.len(),
        catalog.version()
    );
    Ok(())
}
