//! Prediction output post-processing
//!
//! Raw regressor outputs become non-negative prices in Lakhs, rounded to two
//! decimals, with a display string for the UI.

use crate::error::{EstimatorError, Result};
use tracing::warn;

/// Smallest price a result may carry
pub const MIN_PRICE_LAKHS: f64 = 0.0;

pub const CURRENCY_SYMBOL: &str = "₹";
pub const PRICE_UNIT: &str = "Lakhs";

/// Turn a raw model output into a rounded price.
///
/// Non-finite outputs fail the request; negative ones are clamped to zero.
pub fn finalize_price(raw: f64) -> Result<f64> {
    if !raw.is_finite() {
        return Err(EstimatorError::Inference(format!(
            "model returned a non-finite value ({})",
            raw
        )));
    }
    if raw < MIN_PRICE_LAKHS {
        warn!(raw_output = raw, "Model returned a negative price, clamping to zero");
        return Ok(MIN_PRICE_LAKHS);
    }
    Ok(round_to_cents(raw))
}

/// Round to two decimal places, ties to even
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Display form of a price, e.g. `₹ 1,234.50 Lakhs`
pub fn format_lakhs(price: f64) -> String {
    format!("{} {} {}", CURRENCY_SYMBOL, group_thousands(price), PRICE_UNIT)
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
