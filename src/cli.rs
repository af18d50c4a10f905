//! Command-line interface definitions and argument parsing

use crate::export::ExportFormat;
use crate::record::Field;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Customer churn prediction and churn dataset analytics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the trained model artifact (JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "CHURN_MODEL",
        default_value = "models/churn_logistic.json"
    )]
    pub model: PathBuf,

    /// Path to the historical churn dataset (CSV)
    #[arg(
        short,
        long,
        global = true,
        env = "CHURN_DATA",
        default_value = "data/WA_Fn-UseC_-Telco-Customer-Churn.csv"
    )]
    pub data: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict churn for a single customer
    Predict {
        #[command(flatten)]
        customer: CustomerArgs,

        /// Directory to export the prediction into
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format: csv or json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Start an interactive prediction session on stdin
    Session {
        /// Default directory for `export` commands
        #[arg(long, default_value = ".")]
        export_dir: PathBuf,
    },

    /// Summarize the historical dataset and render its charts
    Dashboard {
        /// Directory for the generated SVG charts
        #[arg(short, long, default_value = "charts")]
        output_dir: PathBuf,
    },

    /// Show feature importances and churned vs retained customer profiles
    Insights {
        /// Directory for the generated SVG charts
        #[arg(short, long, default_value = "charts")]
        output_dir: PathBuf,
    },
}

/// Customer attributes; any field left unset takes the form default
#[derive(Args, Debug, Default, Clone)]
pub struct CustomerArgs {
    /// Female or Male [default: Female]
    #[arg(long)]
    pub gender: Option<String>,

    /// 1 for senior citizens, 0 otherwise [default: 0]
    #[arg(long)]
    pub senior_citizen: Option<String>,

    /// Yes or No [default: Yes]
    #[arg(long)]
    pub partner: Option<String>,

    /// Yes or No [default: Yes]
    #[arg(long)]
    pub dependents: Option<String>,

    /// Months subscribed [default: 12]
    #[arg(long)]
    pub tenure: Option<String>,

    /// Yes or No [default: Yes]
    #[arg(long)]
    pub phone_service: Option<String>,

    /// No phone service, No or Yes [default: No phone service]
    #[arg(long)]
    pub multiple_lines: Option<String>,

    /// DSL, Fiber optic or No [default: DSL]
    #[arg(long)]
    pub internet_service: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub online_security: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub online_backup: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub device_protection: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub tech_support: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub streaming_tv: Option<String>,

    /// No, Yes or No internet service [default: No]
    #[arg(long)]
    pub streaming_movies: Option<String>,

    /// Month-to-month, One year or Two year [default: Month-to-month]
    #[arg(long)]
    pub contract: Option<String>,

    /// Yes or No [default: Yes]
    #[arg(long)]
    pub paperless_billing: Option<String>,

    /// Electronic check, Mailed check, Bank transfer (automatic) or
    /// Credit card (automatic) [default: Electronic check]
    #[arg(long)]
    pub payment_method: Option<String>,

    /// Monthly charge in USD [default: 70.0]
    #[arg(long)]
    pub monthly_charges: Option<String>,

    /// Total charges in USD [default: 500.0]
    #[arg(long)]
    pub total_charges: Option<String>,
}

impl CustomerArgs {
    /// Fields supplied on the command line, keyed by column name
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let supplied = [
            (Field::Gender, &self.gender),
            (Field::SeniorCitizen, &self.senior_citizen),
            (Field::Partner, &self.partner),
            (Field::Dependents, &self.dependents),
            (Field::Tenure, &self.tenure),
            (Field::PhoneService, &self.phone_service),
            (Field::MultipleLines, &self.multiple_lines),
            (Field::InternetService, &self.internet_service),
            (Field::OnlineSecurity, &self.online_security),
            (Field::OnlineBackup, &self.online_backup),
            (Field::DeviceProtection, &self.device_protection),
            (Field::TechSupport, &self.tech_support),
            (Field::StreamingTv, &self.streaming_tv),
            (Field::StreamingMovies, &self.streaming_movies),
            (Field::Contract, &self.contract),
            (Field::PaperlessBilling, &self.paperless_billing),
            (Field::PaymentMethod, &self.payment_method),
            (Field::MonthlyCharges, &self.monthly_charges),
            (Field::TotalCharges, &self.total_charges),
        ];

        supplied
            .into_iter()
            .filter_map(|(field, value)| value.clone().map(|v| (field.name(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict_args() {
        let cli = Cli::try_parse_from([
            "churnforge",
            "predict",
            "--tenure",
            "1",
            "--contract",
            "Month-to-month",
            "--payment-method",
            "Bank transfer (automatic)",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Command::Predict {
                customer,
                export,
                format,
            } => {
                assert_eq!(
                    customer.to_pairs(),
                    vec![
                        ("tenure", "1".to_string()),
                        ("Contract", "Month-to-month".to_string()),
                        ("PaymentMethod", "Bank transfer (automatic)".to_string()),
                    ]
                );
                assert_eq!(export, None);
                assert_eq!(format, ExportFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "churnforge",
            "dashboard",
            "--data",
            "telco.csv",
            "-v",
            "-o",
            "out",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.data, PathBuf::from("telco.csv"));
        assert!(matches!(cli.command, Command::Dashboard { ref output_dir } if output_dir == &PathBuf::from("out")));
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let result = Cli::try_parse_from(["churnforge", "predict", "--format", "xlsx"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_customer_args() {
        assert!(CustomerArgs::default().to_pairs().is_empty());
    }
}
