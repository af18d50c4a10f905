//! Integration tests for ChurnForge

use churnforge::export::{PREDICTION_COLUMN, PROBABILITY_COLUMN};
use churnforge::{
    export_submission, load_stats, viz, ArtifactError, Classifier, ExportFormat, Label,
    LogisticModel, PredictionSession, Recommendation, SchemaError,
};
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

fn bundled_model() -> LogisticModel {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/churn_logistic.json");
    LogisticModel::load(path).unwrap()
}

/// A complete customer record with the given tenure, contract and payment method
fn customer(tenure: &str, contract: &str, payment: &str) -> Vec<(&'static str, String)> {
    vec![
        ("gender", "Female"),
        ("SeniorCitizen", "0"),
        ("Partner", "Yes"),
        ("Dependents", "No"),
        ("tenure", tenure),
        ("PhoneService", "Yes"),
        ("MultipleLines", "No"),
        ("InternetService", "Fiber optic"),
        ("OnlineSecurity", "No"),
        ("OnlineBackup", "No"),
        ("DeviceProtection", "No"),
        ("TechSupport", "No"),
        ("StreamingTV", "No"),
        ("StreamingMovies", "No"),
        ("Contract", contract),
        ("PaperlessBilling", "Yes"),
        ("PaymentMethod", payment),
        ("MonthlyCharges", "70.0"),
        ("TotalCharges", "500.0"),
    ]
    .into_iter()
    .map(|(name, value)| (name, value.to_string()))
    .collect()
}

/// Create a small labelled dataset in the Telco column layout
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "customerID,gender,tenure,Contract,InternetService,PaymentMethod,MonthlyCharges,TotalCharges,Churn"
    )
    .unwrap();
    writeln!(file, "0001-A,Female,1,Month-to-month,Fiber optic,Electronic check,80.0,80.0,Yes").unwrap();
    writeln!(file, "0002-B,Male,3,Month-to-month,Fiber optic,Electronic check,90.0,270.0,Yes").unwrap();
    writeln!(file, "0003-C,Male,60,Two year,DSL,Bank transfer (automatic),50.0,3000.0,No").unwrap();
    writeln!(file, "0004-D,Female,24,One year,DSL,Credit card (automatic),60.0,1440.0,No").unwrap();
    writeln!(file, "0005-E,Female,48,Two year,No,Mailed check,20.0, ,No").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_short_tenure_month_to_month_predicts_churn() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let submission = session
        .submit(customer("1", "Month-to-month", "Electronic check"))
        .unwrap();

    assert_eq!(submission.result.predicted_label, Label::Churn);
    assert!(submission.result.churn_probability > 0.5);
    assert_eq!(submission.recommendation, Recommendation::RetentionOffer);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_long_tenure_two_year_predicts_no_churn() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let submission = session
        .submit(customer("72", "Two year", "Bank transfer (automatic)"))
        .unwrap();

    assert_eq!(submission.result.predicted_label, Label::NoChurn);
    assert!(submission.result.churn_probability < 0.5);
    assert_eq!(submission.recommendation, Recommendation::LoyaltyProgram);
}

#[test]
fn test_form_defaults_short_tenure_predicts_churn() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let submission = session
        .submit_form([
            ("tenure", "1"),
            ("Contract", "Month-to-month"),
            ("PaymentMethod", "Electronic check"),
        ])
        .unwrap();

    assert_eq!(submission.result.predicted_label, Label::Churn);
    assert!((submission.result.churn_probability - 0.62).abs() < 0.02);
}

#[test]
fn test_form_defaults_long_tenure_predicts_no_churn() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let submission = session
        .submit_form([
            ("tenure", "72"),
            ("Contract", "Two year"),
            ("PaymentMethod", "Bank transfer (automatic)"),
        ])
        .unwrap();

    assert_eq!(submission.result.predicted_label, Label::NoChurn);
    assert!(submission.result.churn_probability < 0.05);
    assert_eq!(submission.recommendation, Recommendation::LoyaltyProgram);
}

#[test]
fn test_classification_is_deterministic() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let first = session
        .submit(customer("12", "One year", "Mailed check"))
        .unwrap();
    let second = session
        .submit(customer("12", "One year", "Mailed check"))
        .unwrap();

    assert_eq!(first.result, second.result);
    assert_eq!(first.record, second.record);
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_unknown_contract_is_rejected_without_history() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    let err = session
        .submit(customer("12", "Lifetime", "Mailed check"))
        .unwrap_err();

    assert!(matches!(
        err,
        SchemaError::OutOfDomain { field: "Contract", .. }
    ));
    assert!(session.history().is_empty());
}

#[test]
fn test_clear_history() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);

    session.submit_form([("tenure", "5")]).unwrap();
    session.submit_form([("tenure", "50")]).unwrap();
    assert_eq!(session.history().len(), 2);
    assert!(session.history()[0].timestamp <= session.history()[1].timestamp);

    session.clear_history();
    assert!(session.history().is_empty());

    session.submit_form([("tenure", "7")]).unwrap();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].tenure, 7);
}

#[test]
fn test_missing_model_artifact() {
    let dir = tempdir().unwrap();
    let err = LogisticModel::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ArtifactError::Missing { .. }));
}

#[test]
fn test_csv_export_end_to_end() {
    let model = bundled_model();
    let mut session = PredictionSession::new(&model);
    let submission = session
        .submit(customer("1", "Month-to-month", "Electronic check"))
        .unwrap();

    let dir = tempdir().unwrap();
    let path = export_submission(&submission, dir.path(), ExportFormat::Csv).unwrap();

    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("prediction_"));
    assert!(file_name.ends_with(".csv"));

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(header.len(), 21);
    assert_eq!(header[0], "gender");
    assert_eq!(header[19], PREDICTION_COLUMN);
    assert_eq!(header[20], PROBABILITY_COLUMN);

    let row = lines.next().unwrap();
    assert!(row.starts_with("Female,"));
    assert!(row.contains(",Churn,"));
    assert!(lines.next().is_none());
}

#[test]
fn test_feature_importances_from_artifact() {
    let model = bundled_model();
    let importances = model.feature_importances().unwrap();

    assert_eq!(importances.len(), 19);
    let total: f64 = importances.iter().map(|(_, weight)| weight).sum();
    assert!((total - 1.0).abs() < 1e-6);

    let top = viz::top_importances(&importances, 15);
    assert_eq!(top.len(), 15);
    assert!(top.windows(2).all(|pair| pair[0].1 >= pair[1].1));
}

#[test]
fn test_dataset_stats_and_charts() {
    let file = create_test_csv();
    let stats = load_stats(file.path()).unwrap();

    assert_eq!(stats.total_customers, 5);
    assert_eq!(stats.churned, 2);
    assert_eq!(stats.retained, 3);
    assert!((stats.churn_rate() - 40.0).abs() < 1e-9);
    assert!((stats.avg_tenure - 27.2).abs() < 1e-9);

    let month_to_month = stats
        .contract_breakdown
        .iter()
        .find(|group| group.key == "Month-to-month")
        .unwrap();
    assert_eq!(month_to_month.churned, 2);
    assert_eq!(month_to_month.retained, 0);
    assert_eq!(stats.churned_monthly_charges.len(), 2);
    assert_eq!(stats.retained_monthly_charges.len(), 3);

    assert_eq!(
        stats.payment_churn_rates.last().map(|(method, _)| method.as_str()),
        Some("Electronic check")
    );

    let dir = tempdir().unwrap();
    let charts = viz::generate_dashboard_charts(&stats, dir.path()).unwrap();
    assert_eq!(charts.len(), 5);
    assert!(charts.iter().all(|chart| chart.exists()));
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_stats(&dir.path().join("nope.csv")).is_err());
}
