pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::{
    Config, PipelineConfig, ReliabilityDeltas, SlaPolicy, Thresholds, Weights,
    MAX_DEDUP_WINDOW_DAYS,
};
pub use error::NewsdeskError;
pub use types::*;
