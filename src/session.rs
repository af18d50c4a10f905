//! Prediction session: validates user input, classifies it and keeps an
//! in-memory history of outcomes for the lifetime of the session

use crate::error::SchemaError;
use crate::model::{Classifier, Label, PredictionResult};
use crate::record::CustomerRecord;
use chrono::{DateTime, Local};
use tracing::{debug, info};

/// Static guidance shown alongside a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Customer is likely to churn: try to win them back
    RetentionOffer,
    /// Customer is likely to stay: keep them engaged
    LoyaltyProgram,
}

impl Recommendation {
    pub fn for_label(label: Label) -> Self {
        match label {
            Label::Churn => Recommendation::RetentionOffer,
            Label::NoChurn => Recommendation::LoyaltyProgram,
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Recommendation::RetentionOffer => "HIGH RISK: customer is likely to churn",
            Recommendation::LoyaltyProgram => "LOW RISK: customer is likely to stay",
        }
    }

    pub fn guidance(self) -> &'static [&'static str] {
        match self {
            Recommendation::RetentionOffer => &[
                "Offer a discount or a special promotion",
                "Propose an upgrade to a long-term contract",
                "Improve the customer service experience",
                "Grant loyalty rewards",
            ],
            Recommendation::LoyaltyProgram => &[
                "Maintain the current service quality",
                "Invite the customer to a referral program",
                "Cross-sell additional services",
                "Ask for feedback to drive improvements",
            ],
        }
    }
}

/// One row of the session's prediction history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub predicted_label: Label,
    pub churn_probability: f64,
    pub tenure: u32,
    pub monthly_charge: f64,
}

/// The full outcome of a successful submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub record: CustomerRecord,
    pub result: PredictionResult,
    pub recommendation: Recommendation,
    pub timestamp: DateTime<Local>,
}

impl Submission {
    fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            timestamp: self.timestamp,
            predicted_label: self.result.predicted_label,
            churn_probability: self.result.churn_probability,
            tenure: self.record.tenure(),
            monthly_charge: self.record.monthly_charges(),
        }
    }
}

/// A single user's prediction session.
///
/// Borrows the classifier, which is loaded once and shared read-only.
pub struct PredictionSession<'a, C: Classifier + ?Sized> {
    classifier: &'a C,
    history: Vec<HistoryEntry>,
    last: Option<Submission>,
}

impl<'a, C: Classifier + ?Sized> PredictionSession<'a, C> {
    pub fn new(classifier: &'a C) -> Self {
        Self {
            classifier,
            history: Vec::new(),
            last: None,
        }
    }

    pub fn classifier(&self) -> &'a C {
        self.classifier
    }

    /// Validate a complete set of fields and classify it.
    ///
    /// On a schema error nothing is classified and the history is untouched.
    pub fn submit<I, K, V>(&mut self, fields: I) -> Result<Submission, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let record = CustomerRecord::from_fields(fields)?;
        Ok(self.submit_record(record))
    }

    /// Like [`submit`](Self::submit), filling unspecified fields with form defaults
    pub fn submit_form<I, K, V>(&mut self, overrides: I) -> Result<Submission, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let record = CustomerRecord::from_form(overrides)?;
        Ok(self.submit_record(record))
    }

    /// Classify an already validated record and append it to the history
    pub fn submit_record(&mut self, record: CustomerRecord) -> Submission {
        let result = self.classifier.classify(&record);
        let submission = Submission {
            record,
            result,
            recommendation: Recommendation::for_label(result.predicted_label),
            timestamp: Local::now(),
        };

        self.history.push(submission.history_entry());
        info!(
            label = %result.predicted_label,
            probability = result.churn_probability,
            history_len = self.history.len(),
            "Prediction recorded"
        );

        self.last = Some(submission.clone());
        submission
    }

    /// Predictions made so far, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        debug!(cleared = self.history.len(), "Clearing prediction history");
        self.history.clear();
    }

    /// Most recent successful submission, kept across `clear_history`
    pub fn last(&self) -> Option<&Submission> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed probability regardless of input
    struct FixedClassifier(f64);

    impl Classifier for FixedClassifier {
        fn classify(&self, _record: &CustomerRecord) -> PredictionResult {
            PredictionResult::from_probability(self.0, 0.5)
        }
    }

    #[test]
    fn test_submit_appends_history() {
        let classifier = FixedClassifier(0.8);
        let mut session = PredictionSession::new(&classifier);

        let submission = session
            .submit_form([("tenure", "3"), ("MonthlyCharges", "99.5")])
            .unwrap();
        assert_eq!(submission.result.predicted_label, Label::Churn);
        assert_eq!(submission.recommendation, Recommendation::RetentionOffer);

        session.submit_form([("tenure", "40")]).unwrap();

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tenure, 3);
        assert_eq!(history[0].monthly_charge, 99.5);
        assert_eq!(history[1].tenure, 40);
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[test]
    fn test_schema_error_leaves_history_untouched() {
        let classifier = FixedClassifier(0.2);
        let mut session = PredictionSession::new(&classifier);
        session.submit_form(Vec::<(&str, &str)>::new()).unwrap();

        let err = session.submit_form([("Contract", "Lifetime")]).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfDomain { field: "Contract", .. }));
        assert_eq!(session.history().len(), 1);

        let incomplete = session.submit([("tenure", "1")]);
        assert!(matches!(incomplete, Err(SchemaError::MissingField(_))));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let classifier = FixedClassifier(0.2);
        let mut session = PredictionSession::new(&classifier);
        for tenure in 0..5 {
            session.submit_form([("tenure", tenure.to_string())]).unwrap();
        }
        assert_eq!(session.history().len(), 5);

        session.clear_history();
        assert!(session.history().is_empty());
        assert!(session.last().is_some());

        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_recommendation_rule() {
        let classifier = FixedClassifier(0.2);
        let mut session = PredictionSession::new(&classifier);
        let submission = session.submit_form([("tenure", "60")]).unwrap();
        assert_eq!(submission.result.predicted_label, Label::NoChurn);
        assert_eq!(submission.recommendation, Recommendation::LoyaltyProgram);
        assert_eq!(Recommendation::LoyaltyProgram.guidance().len(), 4);
    }

    #[test]
    fn test_session_accepts_trait_objects() {
        let classifier = FixedClassifier(0.9);
        let shared: &dyn Classifier = &classifier;
        let mut session = PredictionSession::new(shared);
        session.submit_form([("tenure", "1")]).unwrap();
        assert_eq!(session.classifier().name(), "classifier");
        assert_eq!(session.history().len(), 1);
    }
}
