pub mod analyzers;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod records;
pub mod services;
