use crate::{
    compute::{add, ensure_not_empty, sort_descending, sum},
    data::{Error, SaleRecord},
};
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use std::collections::BTreeMap;

/// Unit price statistics of a product. `std_dev` is the sample standard deviation
/// (N−1 denominator) and is zero for a product sold only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PriceStats {
    pub product: String,
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
    pub std_dev: Decimal,
}

/// Units sold of a product at one given price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PricePointQuantity {
    pub product: String,
    pub price: Decimal,
    pub quantity: i64,
}

fn sample_std_dev(product: &str, prices: &[Decimal], mean: Decimal) -> Result<Decimal, Error> {
    if prices.len() < 2 {
        return Ok(Decimal::ZERO);
    }
    let mut squares = Decimal::ZERO;
    for price in prices {
        let deviation = *price - mean;
        let square = deviation
            .checked_mul(deviation)
            .ok_or(Error::Overflow("price variance"))?;
        squares = add(squares, square, "price variance")?;
    }
    (squares / Decimal::from(prices.len() - 1))
        .sqrt()
        .ok_or_else(|| Error::UndefinedMetric {
            metric: "std_dev",
            key: product.to_owned(),
        })
}

/// Price statistics per product, ordered by product name.
pub(crate) fn price_stats(sales: &[SaleRecord]) -> Result<Vec<PriceStats>, Error> {
    ensure_not_empty(sales)?;
    let mut prices: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
    for sale in sales {
        prices
            .entry(&sale.product)
            .or_default()
            .push(sale.sales_price);
    }
    prices
        .into_iter()
        .map(|(product, prices)| -> Result<PriceStats, Error> {
            let mean = sum(prices.iter().copied(), "mean price")? / Decimal::from(prices.len());
            Ok(PriceStats {
                product: product.to_owned(),
                min: prices.iter().copied().min().unwrap_or(mean),
                max: prices.iter().copied().max().unwrap_or(mean),
                mean,
                std_dev: sample_std_dev(product, &prices, mean)?,
            })
        })
        .collect()
}

/// Most expensive products (by mean price) first.
pub(crate) fn ranked_by_mean(mut stats: Vec<PriceStats>) -> Vec<PriceStats> {
    sort_descending(&mut stats, |s| s.mean);
    stats
}

/// Quantity sold per (product, price), ordered by product then price.
pub(crate) fn price_points(sales: &[SaleRecord]) -> Result<Vec<PricePointQuantity>, Error> {
    ensure_not_empty(sales)?;
    let mut points: BTreeMap<(&str, Decimal), i64> = BTreeMap::new();
    for sale in sales {
        let quantity = points
            .entry((sale.product.as_str(), sale.sales_price))
            .or_insert(0);
        *quantity = quantity
            .checked_add(sale.quantity)
            .ok_or(Error::Overflow("quantity"))?;
    }
    Ok(points
        .into_iter()
        .map(|((product, price), quantity)| PricePointQuantity {
            product: product.to_owned(),
            price,
            quantity,
        })
        .collect())
}
