use crate::{data::SaleRecord, price::PriceStats};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;

/// One bar of a distribution. The upper bound is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// A sale as a (price, quantity) point, tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PriceQuantityPoint {
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
}

/// One bar of the unit price distribution of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ProductPriceBin {
    pub product: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of `values` over `[min, max]`. When all values are equal the
/// range is widened by half a unit on both sides. No values or no bins give no bars.
pub(crate) fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let (low, high) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (high - low) / bins as f64;

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: low + width * i as f64,
            upper: if i + 1 == bins {
                high
            } else {
                low + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for value in values {
        let index = (((value - low) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }
    histogram
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Distribution of the quantity of every sale.
pub(crate) fn quantity_histogram(sales: &[SaleRecord], bins: usize) -> Vec<HistogramBin> {
    let quantities: Vec<f64> = sales.iter().map(|s| s.quantity as f64).collect();
    histogram(&quantities, bins)
}

/// Price against quantity for every sale, in file order.
pub(crate) fn price_quantity_points(sales: &[SaleRecord]) -> Vec<PriceQuantityPoint> {
    sales
        .iter()
        .map(|s| PriceQuantityPoint {
            category: s.category.clone(),
            price: s.sales_price,
            quantity: s.quantity,
        })
        .collect()
}

/// Unit price distribution of the first `products` entries of `ranked`, each over its
/// own price range.
pub(crate) fn price_histograms(
    sales: &[SaleRecord],
    ranked: &[PriceStats],
    products: usize,
    bins: usize,
) -> Vec<ProductPriceBin> {
    ranked
        .iter()
        .take(products)
        .flat_map(|stats| {
            let prices: Vec<f64> = sales
                .iter()
                .filter(|s| s.product == stats.product)
                .map(|s| to_f64(s.sales_price))
                .collect();
            histogram(&prices, bins)
                .into_iter()
                .map(|bin| ProductPriceBin {
                    product: stats.product.clone(),
                    lower: bin.lower,
                    upper: bin.upper,
                    count: bin.count,
                })
        })
        .collect()
}
