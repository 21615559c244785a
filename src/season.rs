use crate::{
    compute::{ensure_not_empty, first_max, revenue_by},
    data::{month_name, Error, SaleRecord},
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Revenue of a calendar month, all years folded together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MonthRevenue {
    pub month: u32,
    pub month_name: &'static str,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CategoryMonthRevenue {
    pub category: String,
    pub month: u32,
    pub month_name: &'static str,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SeasonalPeak {
    pub category: String,
    pub month: u32,
    pub month_name: &'static str,
    pub revenue: Decimal,
}

/// Months that have sales, January first.
pub(crate) fn monthly_seasonality(sales: &[SaleRecord]) -> Result<Vec<MonthRevenue>, Error> {
    ensure_not_empty(sales)?;
    Ok(revenue_by(sales, |s| (s.month(), s.month_name()))?
        .into_iter()
        .map(|((month, month_name), revenue)| MonthRevenue {
            month,
            month_name,
            revenue,
        })
        .collect())
}

pub(crate) fn category_months(
    sales: &[SaleRecord],
) -> Result<Vec<CategoryMonthRevenue>, Error> {
    ensure_not_empty(sales)?;
    Ok(revenue_by(sales, |s| (s.category.as_str(), s.month()))?
        .into_iter()
        .map(|((category, month), revenue)| CategoryMonthRevenue {
            category: category.to_owned(),
            month,
            month_name: month_name(month),
            revenue,
        })
        .collect())
}

/// Peak month of every category. On equal revenue the earlier month wins.
pub(crate) fn seasonal_peaks(sales: &[SaleRecord]) -> Result<Vec<SeasonalPeak>, Error> {
    let mut by_category: BTreeMap<String, Vec<(u32, Decimal)>> = BTreeMap::new();
    for row in category_months(sales)? {
        by_category
            .entry(row.category)
            .or_default()
            .push((row.month, row.revenue));
    }
    Ok(by_category
        .into_iter()
        .filter_map(|(category, months)| {
            first_max(months).map(|(month, revenue)| SeasonalPeak {
                category,
                month,
                month_name: month_name(month),
                revenue,
            })
        })
        .collect())
}
