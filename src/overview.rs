use crate::{
    compute::{add, first_max, revenue_by, sort_descending, sum},
    customer::customer_summaries,
    data::{Error, SaleRecord},
    product::{product_totals, ProductRevenue},
    region::{region_totals, RegionRevenue},
};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CategoryRevenue {
    pub category: String,
    pub revenue: Decimal,
}

/// Revenue of one (year, month) period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PeriodRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
}

/// Headline figures of the whole data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Overview {
    pub total_revenue: Decimal,
    pub transactions: usize,
    pub units_sold: i64,
    /// Mean over customers of each customer's mean sale revenue.
    pub avg_order_value: Decimal,
    /// Best first.
    pub categories: Vec<CategoryRevenue>,
    /// Best first.
    pub products: Vec<ProductRevenue>,
    /// In region name order.
    pub regions: Vec<RegionRevenue>,
    /// Chronological.
    pub periods: Vec<PeriodRevenue>,
}

impl Overview {
    pub fn best_product(&self) -> Option<&ProductRevenue> {
        self.products.first()
    }

    pub fn best_category(&self) -> Option<&CategoryRevenue> {
        self.categories.first()
    }

    pub fn best_region(&self) -> Option<&RegionRevenue> {
        first_max(self.regions.iter().map(|r| (r, r.revenue))).map(|(r, _)| r)
    }

    /// Period with the highest revenue, the earliest one on ties.
    pub fn peak_period(&self) -> Option<&PeriodRevenue> {
        first_max(self.periods.iter().map(|p| (p, p.revenue))).map(|(p, _)| p)
    }
}

pub(crate) fn overview(sales: &[SaleRecord]) -> Result<Overview, Error> {
    let customers = customer_summaries(sales)?;
    let avg_order_value = sum(customers.iter().map(|c| c.avg_order_value), "order value")?
        / Decimal::from(customers.len());

    let mut categories: Vec<CategoryRevenue> = revenue_by(sales, |s| s.category.as_str())?
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue {
            category: category.to_owned(),
            revenue,
        })
        .collect();
    sort_descending(&mut categories, |c| c.revenue);

    let periods = revenue_by(sales, |s| (s.year(), s.month()))?
        .into_iter()
        .map(|((year, month), revenue)| PeriodRevenue {
            year,
            month,
            revenue,
        })
        .collect();

    let mut total_revenue = Decimal::ZERO;
    let mut units_sold: i64 = 0;
    for sale in sales {
        total_revenue = add(total_revenue, sale.revenue()?, "revenue")?;
        units_sold = units_sold
            .checked_add(sale.quantity)
            .ok_or(Error::Overflow("units sold"))?;
    }

    Ok(Overview {
        total_revenue,
        transactions: sales.len(),
        units_sold,
        avg_order_value,
        categories,
        products: product_totals(sales)?,
        regions: region_totals(sales)?,
        periods,
    })
}
