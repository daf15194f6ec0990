pub mod cross;
pub mod driver;
pub mod error;
pub mod gen1;
pub mod lines;
pub mod report;
pub mod resolver;
pub mod responder;
pub mod scoring;
pub mod services;

/// Program key under which the configuration service stores the
/// suffix-to-score table.
pub const PROGRAM_NAME: &str = "gen1_split_generator";

/// Fallback base URL for the configuration service; everything else is
/// discovered through it at startup.
pub const DEFAULT_CONFIG_URL: &str = "http://config.int.example.org/";
