//! Dashboard and insight charts using Plotters, plus console summaries

use crate::data::{DatasetStats, Profile};
use crate::record::Field;
use plotters::prelude::*;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};
use tracing::info;

const RETAINED_COLOR: RGBColor = RGBColor(34, 197, 94);
const CHURNED_COLOR: RGBColor = RGBColor(239, 68, 68);
const IMPORTANCE_COLOR: RGBColor = RGBColor(102, 126, 234);

/// Number of bins in the tenure histogram
pub const TENURE_BINS: usize = 30;

/// Number of features shown in the importance chart
pub const TOP_FEATURES: usize = 15;

/// Axis categories of the churn-status charts
static CHURN_GROUPS: [&str; 2] = ["Retained", "Churned"];

/// Attributes associated with customers who stay
pub const PROTECTIVE_FACTORS: [&str; 4] = [
    "Long-term contracts (one or two years)",
    "Longer tenure (more than 12 months)",
    "Online security and backup services",
    "Automatic payment methods",
];

/// Attributes associated with customers who leave
pub const RISK_FACTORS: [&str; 4] = [
    "Month-to-month contracts",
    "Short tenure (under 6 months)",
    "Electronic check payments",
    "No protection services",
];

/// Label for an integer tick on a categorical axis, empty between categories
fn category_label(names: &[String], tick: f64) -> String {
    let index = tick.round();
    if (tick - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    names.get(index as usize).cloned().unwrap_or_default()
}

/// Stacked bars of retained and churned customers per contract type
pub fn create_contract_chart(stats: &DatasetStats, output_path: &Path) -> crate::Result<()> {
    let groups = &stats.contract_breakdown;
    let names: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
    let max_count = groups.iter().map(|g| g.customers()).max().unwrap_or(1).max(1) as f64;

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Churn by Contract Type", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(groups.len() as f64 - 0.5), 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len().max(1))
        .x_label_formatter(&|x| category_label(&names, *x))
        .x_desc("Contract Type")
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.35, 0.0), (x + 0.35, g.retained as f64)],
                RETAINED_COLOR.filled(),
            )
        }))?
        .label("Retained")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RETAINED_COLOR.filled()));

    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.35, g.retained as f64), (x + 0.35, g.customers() as f64)],
                CHURNED_COLOR.filled(),
            )
        }))?
        .label("Churned")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], CHURNED_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "Contract chart saved");
    Ok(())
}

/// Horizontal bars of churn rate per payment method, lowest at the bottom
pub fn create_payment_chart(stats: &DatasetStats, output_path: &Path) -> crate::Result<()> {
    let rates = &stats.payment_churn_rates;
    let names: Vec<String> = rates.iter().map(|(method, _)| method.clone()).collect();

    let root = SVGBackend::new(output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Churn Rate by Payment Method", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(180)
        .build_cartesian_2d(0f64..100f64, -0.5f64..(rates.len() as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rates.len().max(1))
        .y_label_formatter(&|y| category_label(&names, *y))
        .x_desc("Churn Rate (%)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(rates.iter().enumerate().map(|(i, (_, rate))| {
        let y = i as f64;
        Rectangle::new([(0.0, y - 0.35), (*rate, y + 0.35)], CHURNED_COLOR.mix(0.8).filled())
    }))?;

    chart.draw_series(rates.iter().enumerate().map(|(i, (_, rate))| {
        Text::new(format!("{:.1}%", rate), (*rate, i as f64), ("sans-serif", 13))
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "Payment method chart saved");
    Ok(())
}

/// Outline of a ring segment between two angles (radians), outer arc first
pub fn ring_segment(start: f64, end: f64, inner: f64, outer: f64) -> Vec<(f64, f64)> {
    let steps = ((end - start).abs() / TAU * 120.0).ceil().max(1.0) as usize;
    let point = |radius: f64, step: usize| {
        let angle = start + (end - start) * step as f64 / steps as f64;
        (radius * angle.cos(), radius * angle.sin())
    };
    (0..=steps)
        .map(|step| point(outer, step))
        .chain((0..=steps).rev().map(|step| point(inner, step)))
        .collect()
}

/// Donut of retained vs churned customers, clockwise from the top
pub fn create_churn_distribution_chart(stats: &DatasetStats, output_path: &Path) -> crate::Result<()> {
    let root = SVGBackend::new(output_path, (500, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Churned vs Retained Customers", ("sans-serif", 26))
        .margin(10)
        .build_cartesian_2d(-1.2f64..1.2f64, -1.2f64..1.2f64)?;

    let total = stats.total_customers.max(1) as f64;
    let mut start = FRAC_PI_2;
    for (count, color, label) in [
        (stats.retained, RETAINED_COLOR, CHURN_GROUPS[0]),
        (stats.churned, CHURNED_COLOR, CHURN_GROUPS[1]),
    ] {
        if count == 0 {
            continue;
        }
        let share = count as f64 / total;
        let end = start - share * TAU;

        chart
            .draw_series(std::iter::once(Polygon::new(
                ring_segment(start, end, 0.5, 1.0),
                color.filled(),
            )))?
            .label(format!("{} ({})", label, count))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        let middle = (start + end) / 2.0;
        chart.draw_series(std::iter::once(Text::new(
            format!("{:.1}%", share * 100.0),
            (0.75 * middle.cos() - 0.1, 0.75 * middle.sin() + 0.03),
            ("sans-serif", 15),
        )))?;
        start = end;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "Churn distribution chart saved");
    Ok(())
}

/// Box plots of monthly charges for retained and churned customers
pub fn create_charges_boxplot(stats: &DatasetStats, output_path: &Path) -> crate::Result<()> {
    let upper = stats
        .churned_monthly_charges
        .iter()
        .chain(stats.retained_monthly_charges.iter())
        .fold(1.0f64, |a, &b| a.max(b)) as f32
        * 1.1;

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Charges by Churn Status", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(CHURN_GROUPS[..].into_segmented(), 0f32..upper)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Churn Status")
        .y_desc("Monthly Charges ($)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let groups = [
        (&CHURN_GROUPS[0], &stats.retained_monthly_charges, RETAINED_COLOR),
        (&CHURN_GROUPS[1], &stats.churned_monthly_charges, CHURNED_COLOR),
    ];
    chart.draw_series(
        groups
            .into_iter()
            .filter(|(_, values, _)| !values.is_empty())
            .map(|(group, values, color)| {
                let quartiles = Quartiles::new(values.as_slice());
                Boxplot::new_vertical(SegmentValue::CenterOf(group), &quartiles)
                    .width(60)
                    .whisker_width(0.5)
                    .style(color)
            }),
    )?;

    root.present()?;
    info!(path = %output_path.display(), "Monthly charges box plot saved");
    Ok(())
}

/// Bin values into `bins` equal-width buckets over `[0, upper]`.
/// Values above `upper` land in the last bucket.
pub fn histogram_bins(values: &[f64], bins: usize, upper: f64) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 || upper <= 0.0 {
        return counts;
    }
    let width = upper / bins as f64;
    for &value in values.iter().filter(|v| v.is_finite() && **v >= 0.0) {
        let bin = ((value / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}

/// Overlaid tenure histograms for churned and retained customers
pub fn create_tenure_histogram(stats: &DatasetStats, output_path: &Path) -> crate::Result<()> {
    let upper = stats
        .churned_tenures
        .iter()
        .chain(stats.retained_tenures.iter())
        .fold(1.0f64, |a, &b| a.max(b));
    let width = upper / TENURE_BINS as f64;

    let retained = histogram_bins(&stats.retained_tenures, TENURE_BINS, upper);
    let churned = histogram_bins(&stats.churned_tenures, TENURE_BINS, upper);
    let max_count = retained.iter().chain(churned.iter()).max().copied().unwrap_or(1).max(1) as f64;

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Tenure Distribution by Churn Status", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..upper, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Tenure (months)")
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (counts, color, label) in [
        (&retained, RETAINED_COLOR, "Retained"),
        (&churned, CHURNED_COLOR, "Churned"),
    ] {
        chart
            .draw_series(counts.iter().enumerate().map(|(i, &count)| {
                let left = i as f64 * width;
                Rectangle::new([(left, 0.0), (left + width, count as f64)], color.mix(0.5).filled())
            }))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "Tenure histogram saved");
    Ok(())
}

/// The `n` most important features, least important first
pub fn top_importances(importances: &[(Field, f64)], n: usize) -> Vec<(Field, f64)> {
    let mut sorted = importances.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
    let skip = sorted.len().saturating_sub(n);
    sorted.split_off(skip)
}

/// Horizontal bars of the top feature importances, most important on top
pub fn create_importance_chart(importances: &[(Field, f64)], output_path: &Path) -> crate::Result<()> {
    let top = top_importances(importances, TOP_FEATURES);
    let names: Vec<String> = top.iter().map(|(field, _)| field.name().to_string()).collect();
    let max_score = top.iter().map(|(_, s)| *s).fold(0.0f64, f64::max).max(f64::EPSILON);

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Top {} Most Important Features", top.len()),
            ("sans-serif", 26),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..(max_score * 1.15), -0.5f64..(top.len() as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(top.len().max(1))
        .y_label_formatter(&|y| category_label(&names, *y))
        .x_desc("Importance Score")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(top.iter().enumerate().map(|(i, (_, score))| {
        let y = i as f64;
        Rectangle::new([(0.0, y - 0.35), (*score, y + 0.35)], IMPORTANCE_COLOR.filled())
    }))?;

    chart.draw_series(top.iter().enumerate().map(|(i, (_, score))| {
        Text::new(format!("{:.3}", score), (*score, i as f64), ("sans-serif", 12))
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "Feature importance chart saved");
    Ok(())
}

/// Render all dataset charts into `output_dir`, returning the written paths
pub fn generate_dashboard_charts(stats: &DatasetStats, output_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let contract = output_dir.join("churn_by_contract.svg");
    create_contract_chart(stats, &contract)?;

    let payment = output_dir.join("churn_by_payment_method.svg");
    create_payment_chart(stats, &payment)?;

    let tenure = output_dir.join("tenure_distribution.svg");
    create_tenure_histogram(stats, &tenure)?;

    let distribution = output_dir.join("churn_distribution.svg");
    create_churn_distribution_chart(stats, &distribution)?;

    let charges = output_dir.join("monthly_charges_by_churn.svg");
    create_charges_boxplot(stats, &charges)?;

    Ok(vec![distribution, contract, tenure, charges, payment])
}

/// Print headline metrics and group breakdowns to the console
pub fn print_dashboard_summary(stats: &DatasetStats) {
    println!("\n=== Dataset Overview ===");
    println!("Total customers:     {}", stats.total_customers);
    println!(
        "Churned / retained:  {} / {}",
        stats.churned, stats.retained
    );
    println!("Churn rate:          {:.1}%", stats.churn_rate());
    println!("Avg tenure:          {:.0} months", stats.avg_tenure);
    println!("Avg monthly charges: ${:.0}", stats.avg_monthly_charges);

    println!("\nChurn by contract type:");
    println!("  {:<16} | {:>8} | {:>8} | {:>6}", "Contract", "Retained", "Churned", "Rate");
    println!("  {:-<16}-|-{:->8}-|-{:->8}-|-{:->6}", "", "", "", "");
    for group in &stats.contract_breakdown {
        println!(
            "  {:<16} | {:>8} | {:>8} | {:>5.1}%",
            group.key,
            group.retained,
            group.churned,
            group.churn_rate()
        );
    }

    println!("\nChurn rate by payment method:");
    for (method, rate) in &stats.payment_churn_rates {
        println!("  {:<26} {:>5.1}%", method, rate);
    }
}

fn print_profile(title: &str, profile: Option<&Profile>) {
    println!("\n{}", title);
    match profile {
        Some(p) => {
            println!("  Customers:               {}", p.customers);
            println!("  Avg tenure:              {:.1} months", p.avg_tenure);
            println!("  Avg monthly charges:     ${:.2}", p.avg_monthly_charges);
            println!("  Most common contract:    {}", p.top_contract);
            println!("  Most common internet:    {}", p.top_internet_service);
            println!("  Most common payment:     {}", p.top_payment_method);
        }
        None => println!("  No customers in this group"),
    }
}

/// Print churned vs retained customer profiles
pub fn print_profiles(stats: &DatasetStats) {
    println!("\n=== Customer Profiles ===");
    print_profile("Churned customers:", stats.churned_profile.as_ref());
    print_profile("Retained customers:", stats.retained_profile.as_ref());
}

/// Protective and risk factors as a plain-text panel
pub fn format_key_insights() -> String {
    let mut lines = vec!["Protective factors (lower churn risk):".to_string()];
    lines.extend(PROTECTIVE_FACTORS.iter().map(|factor| format!("  + {}", factor)));
    lines.push("Risk factors (higher churn risk):".to_string());
    lines.extend(RISK_FACTORS.iter().map(|factor| format!("  - {}", factor)));
    lines.join("\n")
}

pub fn print_key_insights() {
    println!("\n=== Key Insights ===");
    println!("{}", format_key_insights());
}

/// Print feature importances, most important first
pub fn print_importances(importances: &[(Field, f64)]) {
    println!("\n=== Top {} Feature Importances ===", TOP_FEATURES);
    for (field, score) in top_importances(importances, TOP_FEATURES).iter().rev() {
        println!("  {:<18} {:.3}", field.name(), score);
    }
}
