//! # Basin
//!
//! $$
//! \text{list}[i-1]\;\to\;\texttt{data\_dir}/\{id\}.csv\;\to\;\texttt{output\_dir}/\texttt{basin\_}\{i-1\}.csv
//! $$
//!
//! File layout, configuration and drivers around the per-basin analysis.
//!
pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod monthly;

pub use analysis::analyze_basin;
pub use analysis::analyze_sample;
pub use analysis::BasinResult;
pub use analysis::PairedSample;
pub use config::AnalysisConfig;
pub use config::PipelineConfig;
pub use error::BasinError;
