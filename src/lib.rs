// lib.rs - crawlexsses
// Purpose: Chain subfinder, httpx, waymore/katana/gau, gf, uro and knoxnl into a
//          single XSS candidate discovery run

pub mod batching;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod filter;
pub mod history;
pub mod lines;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod refine;
pub mod runner;
pub mod scan;
pub mod tools;

pub use config::{ArtifactPaths, Mode, PipelineConfig};
pub use errors::{PipelineError, Result};
pub use pipeline::{Pipeline, RunReport};
