//! Binary-side adapters for external services.

pub mod socrata;
