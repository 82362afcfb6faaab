//! Live open-data services consumed alongside the static artifacts.

pub mod potholes;
pub mod soql;
