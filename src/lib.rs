//! ChurnForge: a Rust CLI application for customer churn prediction
//!
//! This library validates customer records against the Telco churn schema,
//! classifies them with a pre-trained model loaded from a JSON artifact, keeps
//! a per-session prediction history, and computes descriptive statistics and
//! charts over the historical churn dataset.

pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod model;
pub mod record;
pub mod session;
pub mod shell;
pub mod viz;

// Re-export public items for easier access
pub use cli::Cli;
pub use data::{compute_stats, load_dataset, load_stats, DatasetStats};
pub use error::{ArtifactError, SchemaError};
pub use export::{export_filename, export_submission, ExportFormat};
pub use model::{Classifier, Label, LogisticModel, PredictionResult};
pub use record::{CustomerRecord, Field};
pub use session::{HistoryEntry, PredictionSession, Recommendation, Submission};
pub use shell::Shell;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
