//! HTTP front end for the home price estimator

pub mod api;
pub mod config;
