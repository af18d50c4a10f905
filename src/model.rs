//! Churn classifier: the `Classifier` seam and the logistic-regression model
//! loaded from a serialized JSON artifact

use crate::error::ArtifactError;
use crate::record::{CustomerRecord, Field, FieldKind};
use ndarray::Array1;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default decision threshold on the churn probability
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Smallest standard deviation accepted for a numeric term
pub const MIN_STD: f64 = 1e-6;

/// Predicted outcome for a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Churn,
    NoChurn,
}

impl Label {
    /// Label as written in exports and reports
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Churn => "Churn",
            Label::NoChurn => "No Churn",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub predicted_label: Label,
    /// Probability of churn, always within [0, 1]
    pub churn_probability: f64,
}

impl PredictionResult {
    /// Label a probability against a decision threshold.
    /// `Churn` only when the probability strictly exceeds the threshold.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let churn_probability = if probability.is_nan() {
            warn!("Classifier produced a NaN churn probability; reporting 0");
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        let predicted_label = if churn_probability > threshold {
            Label::Churn
        } else {
            Label::NoChurn
        };
        Self {
            predicted_label,
            churn_probability,
        }
    }

    pub fn retention_probability(&self) -> f64 {
        1.0 - self.churn_probability
    }
}

/// A trained model that can score customer records.
///
/// Implementations must be deterministic: the same record always yields the
/// same result.
pub trait Classifier {
    fn classify(&self, record: &CustomerRecord) -> PredictionResult;

    /// Per-field importance scores, when the model exposes them
    fn feature_importances(&self) -> Option<Vec<(Field, f64)>> {
        None
    }

    fn name(&self) -> &str {
        "classifier"
    }
}

/// On-disk representation of a logistic-regression model
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub intercept: f64,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
    #[serde(default)]
    pub feature_importances: Option<BTreeMap<String, f64>>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Standardized numeric input: `weight * (x - mean) / std`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericTerm {
    pub field: String,
    pub mean: f64,
    pub std: f64,
    pub weight: f64,
}

/// One-hot categorical input; levels not listed carry weight 0
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalTerm {
    pub field: String,
    pub levels: BTreeMap<String, f64>,
}

/// One column of the encoded design vector
#[derive(Debug, Clone)]
enum Column {
    Standardized { field: Field, mean: f64, std: f64 },
    Indicator { field: Field, level: &'static str },
}

impl Column {
    fn encode(&self, record: &CustomerRecord) -> f64 {
        match self {
            Column::Standardized { field, mean, std } => {
                let x = record.get(*field).as_f64().unwrap_or(*mean);
                (x - mean) / std
            }
            Column::Indicator { field, level } => {
                if record.get(*field).as_category() == Some(*level) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Logistic-regression churn model
#[derive(Debug, Clone)]
pub struct LogisticModel {
    name: String,
    threshold: f64,
    intercept: f64,
    columns: Vec<Column>,
    weights: Array1<f64>,
    importances: Option<Vec<(Field, f64)>>,
}

impl LogisticModel {
    /// Load and validate a model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ArtifactError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let model = Self::from_json(&content)?;
        info!(
            model = %model.name,
            path = %path.display(),
            columns = model.columns.len(),
            threshold = model.threshold,
            "Loaded churn model"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(content)?;
        Self::from_artifact(artifact)
    }

    /// Validate an artifact and compile it into an encoded weight vector
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
            return Err(invalid(format!(
                "threshold must lie strictly between 0 and 1, got {}",
                artifact.threshold
            )));
        }
        if !artifact.intercept.is_finite() {
            return Err(invalid("intercept must be finite"));
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut weights = Vec::new();

        for term in &artifact.numeric {
            let field = resolve_field(&term.field, &mut seen)?;
            if matches!(field.kind(), FieldKind::Categorical(_)) {
                return Err(invalid(format!("{} is categorical, not numeric", field)));
            }
            if !(term.std.is_finite() && term.std >= MIN_STD) {
                return Err(invalid(format!(
                    "{}: std must be at least {}, got {}",
                    field, MIN_STD, term.std
                )));
            }
            if !(term.mean.is_finite() && term.weight.is_finite()) {
                return Err(invalid(format!("{}: mean and weight must be finite", field)));
            }
            columns.push(Column::Standardized {
                field,
                mean: term.mean,
                std: term.std,
            });
            weights.push(term.weight);
        }

        for term in &artifact.categorical {
            let field = resolve_field(&term.field, &mut seen)?;
            let domain = field
                .domain()
                .ok_or_else(|| invalid(format!("{} is numeric, not categorical", field)))?;
            for (level, &weight) in &term.levels {
                let level = domain
                    .iter()
                    .find(|label| **label == level.as_str())
                    .copied()
                    .ok_or_else(|| invalid(format!("{}: unknown level {:?}", field, level)))?;
                if !weight.is_finite() {
                    return Err(invalid(format!("{}: weight for {:?} must be finite", field, level)));
                }
                columns.push(Column::Indicator { field, level });
                weights.push(weight);
            }
        }

        let importances = artifact
            .feature_importances
            .map(|scores| {
                scores
                    .into_iter()
                    .map(|(name, score)| {
                        let field = Field::from_name(&name)
                            .ok_or_else(|| invalid(format!("importance for unknown field {:?}", name)))?;
                        if !(score.is_finite() && score >= 0.0) {
                            return Err(invalid(format!("{}: importance must be non-negative", field)));
                        }
                        Ok((field, score))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self {
            name: artifact.name,
            threshold: artifact.threshold,
            intercept: artifact.intercept,
            columns,
            weights: Array1::from(weights),
            importances,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Encode a record into the model's design vector
    pub fn encode(&self, record: &CustomerRecord) -> Array1<f64> {
        self.columns.iter().map(|column| column.encode(record)).collect()
    }

    /// Raw churn probability for a record
    pub fn predict_proba(&self, record: &CustomerRecord) -> f64 {
        let logit = self.intercept + self.weights.dot(&self.encode(record));
        sigmoid(logit)
    }
}

impl Classifier for LogisticModel {
    fn classify(&self, record: &CustomerRecord) -> PredictionResult {
        let probability = self.predict_proba(record);
        let result = PredictionResult::from_probability(probability, self.threshold);
        debug!(
            label = %result.predicted_label,
            probability = result.churn_probability,
            "Classified record"
        );
        result
    }

    fn feature_importances(&self) -> Option<Vec<(Field, f64)>> {
        self.importances.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn resolve_field(name: &str, seen: &mut HashSet<Field>) -> Result<Field, ArtifactError> {
    let field = Field::from_name(name).ok_or_else(|| invalid(format!("unknown field {:?}", name)))?;
    if !seen.insert(field) {
        return Err(invalid(format!("{} appears in more than one term", field)));
    }
    Ok(field)
}

fn invalid(message: impl Into<String>) -> ArtifactError {
    ArtifactError::Invalid(message.into())
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
