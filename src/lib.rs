pub mod analysis;
pub mod calibration;
pub mod classify;
pub mod config;
pub mod error;
pub mod facing;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod pose;
pub mod result;

pub use analysis::{Analyzer, Observation};
pub use error::{AnalysisError, Result};
pub use result::{AnalysisResult, Domain};
