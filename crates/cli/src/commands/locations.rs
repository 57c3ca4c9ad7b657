//! Location and model listing commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, LocationList, ModelInfo};
use crate::output::{print_info, print_json, print_table, OutputFormat};

/// Row for locations table
#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Location")]
    name: String,
}

/// List known locations, optionally filtered by substring
pub async fn list_locations(
    client: &ApiClient,
    filter: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let path = match &filter {
        Some(text) => {
            let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
            format!("api/v1/locations?filter={}", encoded)
        }
        None => "api/v1/locations".to_string(),
    };
    let result: LocationList = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<LocationRow> = result
                .locations
                .iter()
                .enumerate()
                .map(|(i, name)| LocationRow {
                    index: i + 1,
                    name: name.clone(),
                })
                .collect();
            print_table(&rows);
            print_info(&format!("{} locations", result.total));
        }
    }

    Ok(())
}

/// Describe the loaded model artifacts
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("api/v1/model").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Model".bold());
            println!("{}", "=".repeat(50));
            println!("Format:      {}", info.format.cyan());
            println!("Features:    {}", info.feature_count);
            println!("Locations:   {}", info.location_count);
            if let Some(checksum) = &info.checksum {
                println!("SHA-256:     {}", checksum.dimmed());
            }
        }
    }

    Ok(())
}
