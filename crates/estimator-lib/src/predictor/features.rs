//! Feature encoding for model inference
//!
//! Turns a price query into the dense vector the regressor was trained on:
//! `[bhk, sqft, bath, one-hot location...]`. Values are passed through
//! unscaled. A location missing from the schema leaves the whole location
//! block at zero; that is the model's "no location signal" input, not an error.

use crate::models::{FeatureVector, PredictionRequest};
use crate::schema::{FeatureSchema, BATH_INDEX, BHK_INDEX, SQFT_INDEX};

/// Encoded query plus the location slot that was set, if any
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedQuery {
    pub vector: FeatureVector,
    pub location_index: Option<usize>,
}

impl EncodedQuery {
    pub fn location_known(&self) -> bool {
        self.location_index.is_some()
    }
}

/// Encode raw inputs against `schema`
pub fn encode(location: &str, sqft: f64, bhk: u32, bath: u32, schema: &FeatureSchema) -> FeatureVector {
    encode_query(location, sqft, bhk, bath, schema).vector
}

/// Encode a request against `schema`, reporting whether the location matched
pub fn encode_request(request: &PredictionRequest, schema: &FeatureSchema) -> EncodedQuery {
    encode_query(
        &request.location,
        request.sqft,
        request.bhk,
        request.bath,
        schema,
    )
}

fn encode_query(location: &str, sqft: f64, bhk: u32, bath: u32, schema: &FeatureSchema) -> EncodedQuery {
    let location_index = schema.location_index(location);

    let mut vector = FeatureVector::zeros(schema.len());
    vector.set(BHK_INDEX, f64::from(bhk));
    vector.set(SQFT_INDEX, sqft);
    vector.set(BATH_INDEX, f64::from(bath));
    if let Some(i) = location_index {
        vector.set(i, 1.0);
    }

    EncodedQuery {
        vector,
        location_index,
    }
}
