use crate::compute::Aggregates;
use anyhow::Context;
use log::info;
use serde::Serialize;
use std::{fs::File, path::Path};

/// Basic CSV exporter for one table.
pub(crate) fn write_table<W: std::io::Write, T: Serialize>(
    writer: W,
    rows: &[T],
) -> Result<(), anyhow::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_file<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<(), anyhow::Error> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_table(file, rows).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Exports every aggregate table as its own CSV file in `dir`, creating it if needed.
pub(crate) fn write_tables(dir: &Path, aggregates: &Aggregates) -> Result<(), anyhow::Error> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let overview = &aggregates.overview;
    write_file(dir, "category_sales.csv", &overview.categories)?;
    write_file(dir, "product_sales.csv", &overview.products)?;
    write_file(dir, "region_sales.csv", &overview.regions)?;
    write_file(dir, "monthly_sales_trend.csv", &overview.periods)?;
    write_file(dir, "customers.csv", &aggregates.customers)?;
    write_file(dir, "purchase_count_histogram.csv", &aggregates.purchase_histogram)?;
    write_file(dir, "product_periods.csv", &aggregates.product_periods)?;
    write_file(dir, "top_products.csv", &aggregates.top_products)?;
    write_file(dir, "product_growth.csv", &aggregates.growth)?;
    write_file(dir, "regional_preferences.csv", &aggregates.regional)?;
    write_file(dir, "region_category.csv", &aggregates.region_category)?;
    write_file(dir, "monthly_seasonality.csv", &aggregates.monthly)?;
    write_file(dir, "category_seasonality.csv", &aggregates.category_months)?;
    write_file(dir, "seasonal_peaks.csv", &aggregates.peaks)?;
    write_file(dir, "price_stats.csv", &aggregates.prices)?;
    write_file(dir, "price_points.csv", &aggregates.price_points)?;
    write_file(dir, "quantity_distribution.csv", &aggregates.quantity_histogram)?;
    write_file(dir, "price_quantity.csv", &aggregates.price_quantity)?;
    write_file(dir, "price_distribution.csv", &aggregates.price_histograms)?;
    Ok(())
}
