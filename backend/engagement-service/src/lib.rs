/// Engagement Service Library
///
/// Scores posts from their votes and discussion, assembles threaded comment
/// trees, ranks paginated feeds and rolls popularity up into dashboard
/// leaderboards for the blogging platform.
///
/// # Modules
///
/// - `handlers`: Engagement HTTP request handlers
/// - `models`: Posts, comments, votes and read-side views
/// - `services`: Vote ledger, scoring, comment trees, ranking, dashboard
/// - `db`: Entity store trait with PostgreSQL and in-memory implementations
/// - `middleware`: Viewer identity extraction
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
