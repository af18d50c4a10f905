//! Historical churn dataset loading and descriptive statistics using Polars

use anyhow::Context;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Columns the statistics are computed from
const REQUIRED_COLUMNS: [&str; 6] = [
    "tenure",
    "MonthlyCharges",
    "Contract",
    "InternetService",
    "PaymentMethod",
    "Churn",
];

/// Retained/churned customer counts for one value of a grouping column
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCounts {
    pub key: String,
    pub retained: usize,
    pub churned: usize,
}

impl GroupCounts {
    pub fn customers(&self) -> usize {
        self.retained + self.churned
    }

    /// Percentage of customers in the group that churned
    pub fn churn_rate(&self) -> f64 {
        if self.customers() == 0 {
            0.0
        } else {
            self.churned as f64 / self.customers() as f64 * 100.0
        }
    }
}

/// Typical attributes of a group of customers
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub customers: usize,
    pub avg_tenure: f64,
    pub avg_monthly_charges: f64,
    pub top_contract: String,
    pub top_internet_service: String,
    pub top_payment_method: String,
}

/// Descriptive statistics over the historical dataset
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_customers: usize,
    pub churned: usize,
    pub retained: usize,
    pub avg_tenure: f64,
    pub avg_monthly_charges: f64,
    /// Counts per contract type, sorted by contract name
    pub contract_breakdown: Vec<GroupCounts>,
    /// Churn rate (%) per payment method, lowest first
    pub payment_churn_rates: Vec<(String, f64)>,
    /// Tenure values of churned customers
    pub churned_tenures: Vec<f64>,
    /// Tenure values of retained customers
    pub retained_tenures: Vec<f64>,
    /// Monthly charges of churned customers
    pub churned_monthly_charges: Vec<f64>,
    /// Monthly charges of retained customers
    pub retained_monthly_charges: Vec<f64>,
    pub churned_profile: Option<Profile>,
    pub retained_profile: Option<Profile>,
}

impl DatasetStats {
    /// Overall churn rate in percent
    pub fn churn_rate(&self) -> f64 {
        if self.total_customers == 0 {
            0.0
        } else {
            self.churned as f64 / self.total_customers as f64 * 100.0
        }
    }
}

fn churned() -> Expr {
    col("Churn").eq(lit("Yes"))
}

/// Load the dataset, keeping only the columns used for statistics and rows
/// with a valid `Churn` label
pub fn load_dataset(file_path: &Path) -> crate::Result<DataFrame> {
    if !file_path.exists() {
        anyhow::bail!("Dataset not found: {}", file_path.display());
    }

    // Full-file schema inference: TotalCharges holds blank strings deep into the file
    let df = LazyCsvReader::new(file_path)
        .with_infer_schema_length(None)
        .finish()
        .with_context(|| format!("Failed to read {}", file_path.display()))?
        .select([
            col("tenure").cast(DataType::Float64),
            col("MonthlyCharges").cast(DataType::Float64),
            col("Contract"),
            col("InternetService"),
            col("PaymentMethod"),
            col("Churn"),
        ])
        .filter(churned().or(col("Churn").eq(lit("No"))))
        .collect()
        .with_context(|| {
            format!(
                "Dataset {} must provide columns: {}",
                file_path.display(),
                REQUIRED_COLUMNS.join(", ")
            )
        })?;

    if df.height() == 0 {
        anyhow::bail!("No labelled customers found in {}", file_path.display());
    }

    info!(rows = df.height(), path = %file_path.display(), "Loaded churn dataset");
    Ok(df)
}

/// Compute all dashboard statistics from a loaded dataset
pub fn compute_stats(df: &DataFrame) -> crate::Result<DatasetStats> {
    let churned_df = df.clone().lazy().filter(churned()).collect()?;
    let retained_df = df.clone().lazy().filter(churned().not()).collect()?;

    let (avg_tenure, avg_monthly_charges) = means(df)?;

    let mut payment_churn_rates: Vec<(String, f64)> = churn_by(df, "PaymentMethod")?
        .into_iter()
        .map(|group| {
            let rate = group.churn_rate();
            (group.key, rate)
        })
        .collect();
    payment_churn_rates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let stats = DatasetStats {
        total_customers: df.height(),
        churned: churned_df.height(),
        retained: retained_df.height(),
        avg_tenure,
        avg_monthly_charges,
        contract_breakdown: churn_by(df, "Contract")?,
        payment_churn_rates,
        churned_tenures: values(&churned_df, "tenure")?,
        retained_tenures: values(&retained_df, "tenure")?,
        churned_monthly_charges: values(&churned_df, "MonthlyCharges")?,
        retained_monthly_charges: values(&retained_df, "MonthlyCharges")?,
        churned_profile: profile(&churned_df)?,
        retained_profile: profile(&retained_df)?,
    };

    debug!(
        total = stats.total_customers,
        churned = stats.churned,
        churn_rate = stats.churn_rate(),
        "Computed dataset statistics"
    );
    Ok(stats)
}

/// Load a dataset and compute its statistics in one step
pub fn load_stats(file_path: &Path) -> crate::Result<DatasetStats> {
    let df = load_dataset(file_path)?;
    compute_stats(&df)
}

/// Mean tenure and mean monthly charges
fn means(df: &DataFrame) -> crate::Result<(f64, f64)> {
    let means = df
        .clone()
        .lazy()
        .select([
            col("tenure").mean().alias("avg_tenure"),
            col("MonthlyCharges").mean().alias("avg_monthly"),
        ])
        .collect()?;

    Ok((scalar(&means, "avg_tenure")?, scalar(&means, "avg_monthly")?))
}

fn scalar(df: &DataFrame, column: &str) -> crate::Result<f64> {
    df.column(column)?
        .f64()?
        .get(0)
        .with_context(|| format!("No value for {}", column))
}

/// Group-by counts of retained and churned customers, sorted by key.
/// Rows with a missing key are skipped.
fn churn_by(df: &DataFrame, key: &str) -> crate::Result<Vec<GroupCounts>> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([
            col("Churn").count().cast(DataType::Float64).alias("customers"),
            churned().cast(DataType::Float64).sum().alias("churned"),
        ])
        .collect()?;

    let keys = grouped.column(key)?.str()?;
    let customers = grouped.column("customers")?.f64()?;
    let churned = grouped.column("churned")?.f64()?;

    let mut groups: Vec<GroupCounts> = keys
        .into_iter()
        .zip(customers.into_iter())
        .zip(churned.into_iter())
        .filter_map(|((key, customers), churned)| {
            let (key, customers, churned) = (key?, customers?, churned?);
            Some(GroupCounts {
                key: key.to_string(),
                retained: (customers - churned) as usize,
                churned: churned as usize,
            })
        })
        .collect();

    groups.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(groups)
}

/// Most frequent value of a column; ties resolve to the smallest value
fn mode(df: &DataFrame, key: &str) -> crate::Result<String> {
    churn_by(df, key)?
        .into_iter()
        .fold(None::<GroupCounts>, |best, group| match best {
            Some(best) if best.customers() >= group.customers() => Some(best),
            _ => Some(group),
        })
        .map(|group| group.key)
        .with_context(|| format!("No values for {}", key))
}

/// Non-null values of a numeric column
fn values(df: &DataFrame, column: &str) -> crate::Result<Vec<f64>> {
    Ok(df.column(column)?.f64()?.into_iter().flatten().collect())
}

fn profile(df: &DataFrame) -> crate::Result<Option<Profile>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let (avg_tenure, avg_monthly_charges) = means(df)?;
    Ok(Some(Profile {
        customers: df.height(),
        avg_tenure,
        avg_monthly_charges,
        top_contract: mode(df, "Contract")?,
        top_internet_service: mode(df, "InternetService")?,
        top_payment_method: mode(df, "PaymentMethod")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customerID,gender,tenure,Contract,InternetService,PaymentMethod,MonthlyCharges,TotalCharges,Churn").unwrap();
        writeln!(file, "7590-VHVEG,Female,1,Month-to-month,Fiber optic,Electronic check,70.70,70.70,Yes").unwrap();
        writeln!(file, "5575-GNVDE,Male,34,One year,DSL,Mailed check,56.95,1889.5,No").unwrap();
        writeln!(file, "3668-QPYBK,Male,2,Month-to-month,DSL,Mailed check,53.85,108.15,Yes").unwrap();
        writeln!(file, "7795-CFOCW,Male,45,One year,DSL,Bank transfer (automatic),42.30,1840.75,No").unwrap();
        writeln!(file, "9237-HQITU,Female,8,Month-to-month,Fiber optic,Electronic check,99.65,820.5,Yes").unwrap();
        writeln!(file, "4472-LVYGI,Female,72,Two year,No,Credit card (automatic),20.00, ,No").unwrap();
        writeln!(file, "1452-KIOVK,Male,22,Month-to-month,Fiber optic,Credit card (automatic),89.10,1949.4,No").unwrap();
        writeln!(file, "6713-OKOMC,Female,10,Month-to-month,DSL,Mailed check,29.75,301.9,No").unwrap();
        file
    }

    #[test]
    fn test_load_dataset() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        assert_eq!(df.height(), 8);
        assert_eq!(df.width(), REQUIRED_COLUMNS.len());
    }

    #[test]
    fn test_headline_metrics() {
        let test_file = create_test_csv();
        let stats = load_stats(test_file.path()).unwrap();

        assert_eq!(stats.total_customers, 8);
        assert_eq!(stats.churned, 3);
        assert_eq!(stats.retained, 5);
        assert!((stats.churn_rate() - 37.5).abs() < 1e-9);
        assert!((stats.avg_tenure - 24.25).abs() < 1e-9);
        assert!((stats.avg_monthly_charges - 57.7875).abs() < 1e-9);
        assert_eq!(stats.churned_tenures.len(), 3);
        assert_eq!(stats.retained_tenures.len(), 5);
    }

    #[test]
    fn test_monthly_charges_by_churn_status() {
        let test_file = create_test_csv();
        let stats = load_stats(test_file.path()).unwrap();

        let mut churned = stats.churned_monthly_charges.clone();
        churned.sort_by(f64::total_cmp);
        assert_eq!(churned, vec![53.85, 70.70, 99.65]);
        assert_eq!(stats.retained_monthly_charges.len(), 5);
        assert!(stats.retained_monthly_charges.contains(&20.0));
    }

    #[test]
    fn test_contract_breakdown() {
        let test_file = create_test_csv();
        let stats = load_stats(test_file.path()).unwrap();

        let expected = vec![
            GroupCounts { key: "Month-to-month".into(), retained: 2, churned: 3 },
            GroupCounts { key: "One year".into(), retained: 2, churned: 0 },
            GroupCounts { key: "Two year".into(), retained: 1, churned: 0 },
        ];
        assert_eq!(stats.contract_breakdown, expected);
    }

    #[test]
    fn test_payment_churn_rates_ascending() {
        let test_file = create_test_csv();
        let stats = load_stats(test_file.path()).unwrap();

        let methods: Vec<&str> = stats
            .payment_churn_rates
            .iter()
            .map(|(method, _)| method.as_str())
            .collect();
        assert_eq!(
            methods,
            vec![
                "Bank transfer (automatic)",
                "Credit card (automatic)",
                "Mailed check",
                "Electronic check"
            ]
        );
        assert!((stats.payment_churn_rates[3].1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_profiles() {
        let test_file = create_test_csv();
        let stats = load_stats(test_file.path()).unwrap();

        let churned = stats.churned_profile.unwrap();
        assert_eq!(churned.customers, 3);
        assert!((churned.avg_tenure - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(churned.top_contract, "Month-to-month");
        assert_eq!(churned.top_internet_service, "Fiber optic");
        assert_eq!(churned.top_payment_method, "Electronic check");

        let retained = stats.retained_profile.unwrap();
        assert!((retained.avg_tenure - 36.6).abs() < 1e-9);
        // Month-to-month and One year tie at two customers each
        assert_eq!(retained.top_contract, "Month-to-month");
        assert_eq!(retained.top_internet_service, "DSL");
        assert_eq!(retained.top_payment_method, "Credit card (automatic)");
    }

    #[test]
    fn test_missing_file_and_columns() {
        assert!(load_dataset(Path::new("/nonexistent/churn.csv")).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customerID,tenure,Churn").unwrap();
        writeln!(file, "1,5,Yes").unwrap();
        assert!(load_dataset(file.path()).is_err());
    }
}
