pub mod config;
pub mod executor;
pub mod fuzzer;
pub mod generator;
pub mod input;
pub mod report;

pub use config::HarnessConfig;
pub use executor::{
    CommandExecutor, CommandExecutorConfig, ExecutionError, ExecutionResult, ExecutionStatus,
};
pub use fuzzer::Fuzzer;
pub use generator::{GenerationError, GenerationPolicy};
pub use input::TestCase;
pub use report::{FuzzReport, ReportSummary, RunRecord};
