pub mod config;
pub mod errors;
pub mod extract;
pub mod generator;
pub mod metrics;
pub mod output;
pub mod results;

pub use config::{ConfigOverrides, ErrorPolicy, ExtractConfig, OutputFormat};
pub use errors::{ExtractError, ExtractResult};
pub use extract::{extract, extract_from_reader, extract_with_progress, CanonicalNumber};
pub use results::{Aggregator, ExtractOutput, ResultSet};
