pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod session;
pub mod tasks;
pub mod tools;

pub use config::{Config, PipelineSettings};
pub use error::FactCheckError;
pub use pipeline::FactChecker;
