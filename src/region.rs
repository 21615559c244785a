use crate::{
    compute::{ensure_not_empty, first_max, revenue_by},
    data::{Error, SaleRecord},
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RegionalPreference {
    pub region: String,
    pub top_product: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RegionCategoryRevenue {
    pub region: String,
    pub category: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RegionRevenue {
    pub region: String,
    pub revenue: Decimal,
}

/// Best selling product of every region, regions in name order. On equal revenue the
/// product whose name sorts first wins.
pub(crate) fn regional_preferences(
    sales: &[SaleRecord],
) -> Result<Vec<RegionalPreference>, Error> {
    ensure_not_empty(sales)?;
    let mut by_region: BTreeMap<&str, Vec<(&str, Decimal)>> = BTreeMap::new();
    for ((region, product), revenue) in
        revenue_by(sales, |s| (s.region.as_str(), s.product.as_str()))?
    {
        by_region.entry(region).or_default().push((product, revenue));
    }
    Ok(by_region
        .into_iter()
        .filter_map(|(region, products)| {
            first_max(products).map(|(product, revenue)| RegionalPreference {
                region: region.to_owned(),
                top_product: product.to_owned(),
                revenue,
            })
        })
        .collect())
}

/// Region × category revenue, one row per combination that has sales.
pub(crate) fn region_category_matrix(
    sales: &[SaleRecord],
) -> Result<Vec<RegionCategoryRevenue>, Error> {
    ensure_not_empty(sales)?;
    Ok(
        revenue_by(sales, |s| (s.region.as_str(), s.category.as_str()))?
            .into_iter()
            .map(|((region, category), revenue)| RegionCategoryRevenue {
                region: region.to_owned(),
                category: category.to_owned(),
                revenue,
            })
            .collect(),
    )
}

pub(crate) fn region_totals(sales: &[SaleRecord]) -> Result<Vec<RegionRevenue>, Error> {
    ensure_not_empty(sales)?;
    Ok(revenue_by(sales, |s| s.region.as_str())?
        .into_iter()
        .map(|(region, revenue)| RegionRevenue {
            region: region.to_owned(),
            revenue,
        })
        .collect())
}
