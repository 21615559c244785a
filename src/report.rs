use crate::{compute::Aggregates, data::month_name, product::ProductGrowth};
use rust_decimal::Decimal;
use std::fmt::{self, Write};

const GROWTH_LINES: usize = 5;
const PRICE_LINES: usize = 5;
const TOP_CUSTOMER_LINES: usize = 3;

/// `$1,234.56`
pub(crate) fn money(amount: Decimal) -> String {
    let digits = format!("{:.2}", amount.abs().round_dp(2));
    let (whole, cents) = digits.split_once('.').unwrap_or((&digits, "00"));
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// `12.34%`. A rate too large to scale by a hundred is shown as a multiple instead.
pub(crate) fn percent(rate: Decimal) -> String {
    match rate.checked_mul(Decimal::ONE_HUNDRED) {
        Some(scaled) => format!("{:.2}%", scaled.round_dp(2)),
        None => format!("{}x", rate.round_dp(2)),
    }
}

fn growth(product: &ProductGrowth) -> String {
    product
        .rate()
        .map_or_else(|_| "undefined (no first-half revenue)".to_owned(), percent)
}

/// Renders the plain-text insights report.
pub(crate) fn render_report(aggregates: &Aggregates) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let overview = &aggregates.overview;

    writeln!(out, "SALES SUMMARY")?;
    writeln!(out, "=============")?;
    writeln!(out, "Total revenue: {}", money(overview.total_revenue))?;
    writeln!(out, "Total transactions: {}", overview.transactions)?;
    writeln!(out, "Total units sold: {}", overview.units_sold)?;
    writeln!(out, "Average order value: {}", money(overview.avg_order_value))?;
    if let Some(peak) = overview.peak_period() {
        writeln!(
            out,
            "Peak sales month: {} {} ({})",
            month_name(peak.month),
            peak.year,
            money(peak.revenue)
        )?;
    }
    if let Some(best) = overview.best_product() {
        writeln!(out, "Best-selling product: {} ({})", best.product, money(best.revenue))?;
    }
    if let Some(best) = overview.best_category() {
        writeln!(
            out,
            "Most profitable category: {} ({})",
            best.category,
            money(best.revenue)
        )?;
    }
    if let Some(best) = overview.best_region() {
        writeln!(out, "Best performing region: {} ({})", best.region, money(best.revenue))?;
    }

    writeln!(out)?;
    writeln!(out, "1. CUSTOMER INSIGHTS")?;
    writeln!(out, "-------------------")?;
    let kpis = &aggregates.customer_kpis;
    writeln!(out, "Total unique customers: {}", kpis.customers)?;
    writeln!(
        out,
        "Average customer lifetime value: {}",
        money(kpis.mean_lifetime_value)
    )?;
    writeln!(
        out,
        "Average purchase frequency: {:.4} purchases per day",
        kpis.mean_purchase_frequency.round_dp(4)
    )?;
    writeln!(out, "Top {TOP_CUSTOMER_LINES} customers by revenue:")?;
    for (i, customer) in aggregates
        .top_customers
        .iter()
        .take(TOP_CUSTOMER_LINES)
        .enumerate()
    {
        writeln!(
            out,
            "  {}. Customer {}: {}",
            i + 1,
            customer.customer_id,
            money(customer.total_revenue)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "2. PRODUCT PERFORMANCE")?;
    writeln!(out, "---------------------")?;
    writeln!(out, "Top products by revenue:")?;
    for (i, product) in aggregates.top_products.iter().enumerate() {
        writeln!(out, "  {}. {}: {}", i + 1, product.product, money(product.revenue))?;
    }
    writeln!(out, "Monthly revenue of top products:")?;
    for product in &aggregates.top_products {
        let periods: Vec<String> = aggregates
            .product_periods
            .iter()
            .filter(|p| p.product == product.product)
            .map(|p| format!("{} {}", p.year_month(), money(p.revenue)))
            .collect();
        writeln!(out, "  {}: {}", product.product, periods.join(", "))?;
    }
    writeln!(out, "Top {GROWTH_LINES} products by growth rate:")?;
    for (i, product) in aggregates.growth.iter().take(GROWTH_LINES).enumerate() {
        writeln!(out, "  {}. {}: {}", i + 1, product.product, growth(product))?;
    }
    writeln!(out, "Bottom {GROWTH_LINES} products by growth rate:")?;
    let skip = aggregates.growth.len().saturating_sub(GROWTH_LINES);
    for (i, product) in aggregates.growth.iter().skip(skip).enumerate() {
        writeln!(out, "  {}. {}: {}", i + 1, product.product, growth(product))?;
    }

    writeln!(out)?;
    writeln!(out, "3. REGIONAL INSIGHTS")?;
    writeln!(out, "-------------------")?;
    writeln!(out, "Top product by region:")?;
    for preference in &aggregates.regional {
        writeln!(
            out,
            "  {}: {} ({})",
            preference.region,
            preference.top_product,
            money(preference.revenue)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "4. SEASONAL PATTERNS")?;
    writeln!(out, "-------------------")?;
    writeln!(out, "Peak sales month by category:")?;
    for peak in &aggregates.peaks {
        writeln!(
            out,
            "  {}: {} ({})",
            peak.category,
            peak.month_name,
            money(peak.revenue)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "5. PRICE ANALYSIS")?;
    writeln!(out, "----------------")?;
    writeln!(
        out,
        "Price ranges by product (top {PRICE_LINES} by average price):"
    )?;
    for stats in aggregates.prices.iter().take(PRICE_LINES) {
        writeln!(
            out,
            "  {}: {} - {} (avg: {})",
            stats.product,
            money(stats.min),
            money(stats.max),
            money(stats.mean)
        )?;
    }
    Ok(out)
}
