//! Price estimate command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, Estimate, EstimateRequest};
use crate::output::{format_timestamp, print_json, print_warning, OutputFormat};

/// Request an estimate and print it
pub async fn run_estimate(
    client: &ApiClient,
    request: EstimateRequest,
    format: OutputFormat,
) -> Result<()> {
    let result: Estimate = client.post("api/v1/estimate", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Estimated Property Value".bold());
            println!("{}", "=".repeat(50));
            println!("Location:   {}", result.location.cyan());
            println!("Area:       {} sqft", request.sqft);
            println!("Bedrooms:   {} BHK", request.bhk);
            println!("Bathrooms:  {}", request.bath);
            println!();
            println!("{}", result.display.green().bold());
            println!();

            if result.location_known {
                println!("Based on current market trends in {}", result.location);
            } else {
                print_warning(&format!(
                    "'{}' is not a known location; estimate carries no location adjustment",
                    result.location
                ));
            }

            println!(
                "{}",
                format!(
                    "Model: {}  Generated: {}",
                    result.model,
                    format_timestamp(result.generated_at)
                )
                .dimmed()
            );
        }
    }

    Ok(())
}
