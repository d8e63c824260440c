pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod stages;
