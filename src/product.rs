use crate::{
    compute::{add, ensure_not_empty, revenue_by, sort_descending},
    data::{Error, SaleRecord},
};
use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ProductPeriodRevenue {
    pub product: String,
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
}

impl ProductPeriodRevenue {
    /// `YYYY-MM` label of the period.
    pub fn year_month(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ProductRevenue {
    pub product: String,
    pub revenue: Decimal,
}

/// Revenue of a product before and after the median sale date. A product sold in only
/// one half still gets a row, with zero for the other half.
///
/// `growth_rate` is `None` when nothing was sold in the first half: there's no sensible
/// number to put there, so it stays a hole that `rate()` turns into an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ProductGrowthSerializer")]
pub(crate) struct ProductGrowth {
    pub product: String,
    pub first_half_revenue: Decimal,
    pub second_half_revenue: Decimal,
    pub growth_rate: Option<Decimal>,
}

impl ProductGrowth {
    fn new(
        product: String,
        first_half_revenue: Decimal,
        second_half_revenue: Decimal,
    ) -> Result<Self, Error> {
        let growth_rate = if first_half_revenue.is_zero() {
            None
        } else {
            let rate = (second_half_revenue - first_half_revenue)
                .checked_div(first_half_revenue)
                .ok_or(Error::Overflow("growth rate"))?;
            Some(rate)
        };
        Ok(Self {
            product,
            first_half_revenue,
            second_half_revenue,
            growth_rate,
        })
    }

    pub fn rate(&self) -> Result<Decimal, Error> {
        self.growth_rate.ok_or_else(|| Error::UndefinedMetric {
            metric: "growth_rate",
            key: self.product.clone(),
        })
    }
}

/// Proxy for serializing `ProductGrowth`, spelling out undefined growth rates.
#[derive(Serialize)]
pub(crate) struct ProductGrowthSerializer {
    pub product: String,
    pub first_half_revenue: Decimal,
    pub second_half_revenue: Decimal,
    pub growth_rate: String,
}

impl From<ProductGrowth> for ProductGrowthSerializer {
    fn from(growth: ProductGrowth) -> Self {
        Self {
            growth_rate: growth
                .growth_rate
                .map_or_else(|| "undefined".to_owned(), |rate| rate.to_string()),
            product: growth.product,
            first_half_revenue: growth.first_half_revenue,
            second_half_revenue: growth.second_half_revenue,
        }
    }
}

/// Revenue per (product, year, month), ordered by product then chronologically.
pub(crate) fn product_periods(sales: &[SaleRecord]) -> Result<Vec<ProductPeriodRevenue>, Error> {
    ensure_not_empty(sales)?;
    Ok(
        revenue_by(sales, |s| (s.product.as_str(), s.year(), s.month()))?
            .into_iter()
            .map(|((product, year, month), revenue)| ProductPeriodRevenue {
                product: product.to_owned(),
                year,
                month,
                revenue,
            })
            .collect(),
    )
}

/// All products by total revenue, best first; ties keep product name order.
pub(crate) fn product_totals(sales: &[SaleRecord]) -> Result<Vec<ProductRevenue>, Error> {
    ensure_not_empty(sales)?;
    let mut totals: Vec<ProductRevenue> = revenue_by(sales, |s| s.product.as_str())?
        .into_iter()
        .map(|(product, revenue)| ProductRevenue {
            product: product.to_owned(),
            revenue,
        })
        .collect();
    sort_descending(&mut totals, |p| p.revenue);
    Ok(totals)
}

pub(crate) fn top_products(sales: &[SaleRecord], k: usize) -> Result<Vec<ProductRevenue>, Error> {
    let mut totals = product_totals(sales)?;
    totals.truncate(k);
    Ok(totals)
}

/// Median of the sale dates. With an even number of sales it is the midpoint of the two
/// middle dates, which can fall at noon.
pub(crate) fn median_date(sales: &[SaleRecord]) -> Result<NaiveDateTime, Error> {
    ensure_not_empty(sales)?;
    let mut dates: Vec<NaiveDateTime> = sales
        .iter()
        .map(|s| s.date.and_time(NaiveTime::MIN))
        .collect();
    dates.sort_unstable();
    let mid = dates.len() / 2;
    if dates.len() % 2 == 1 {
        Ok(dates[mid])
    } else {
        let (low, high) = (dates[mid - 1], dates[mid]);
        Ok(low + (high - low) / 2)
    }
}

/// Splits sales at the median date (strictly before / on or after) and compares the
/// revenue of both halves per product. Ordered by product name.
pub(crate) fn product_growth(sales: &[SaleRecord]) -> Result<Vec<ProductGrowth>, Error> {
    let split = median_date(sales)?;
    let mut halves: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for sale in sales {
        let (first, second) = halves
            .entry(&sale.product)
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        let half = if sale.date.and_time(NaiveTime::MIN) < split {
            first
        } else {
            second
        };
        *half = add(*half, sale.revenue()?, "revenue")?;
    }
    halves
        .into_iter()
        .map(|(product, (first, second))| ProductGrowth::new(product.to_owned(), first, second))
        .collect()
}

/// Highest growth first, products with an undefined growth rate last. Ties keep their
/// incoming order.
pub(crate) fn ranked_by_growth(mut growth: Vec<ProductGrowth>) -> Vec<ProductGrowth> {
    growth.sort_by(|a, b| match (a.growth_rate, b.growth_rate) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    growth
}

#[cfg(test)]
mod tests {
    use super::{
        median_date, product_growth, product_periods, product_totals, ranked_by_growth,
        top_products, ProductGrowth,
    };
    use crate::{
        compute::tests::{fixture, sale},
        data::Error,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn periods_sum_to_product_totals() {
        let sales = fixture();
        let periods = product_periods(&sales).unwrap();
        for total in product_totals(&sales).unwrap() {
            let summed: Decimal = periods
                .iter()
                .filter(|p| p.product == total.product)
                .map(|p| p.revenue)
                .sum();
            assert_eq!(summed, total.revenue);
        }
        let laptop: Vec<_> = periods
            .iter()
            .filter(|p| p.product == "Laptop")
            .map(|p| (p.year_month(), p.revenue))
            .collect();
        assert_eq!(
            laptop,
            [
                ("2023-01".to_owned(), dec!(900)),
                ("2023-03".to_owned(), dec!(1700)),
                ("2024-02".to_owned(), dec!(950)),
            ]
        );
    }

    #[test]
    fn top_products_by_revenue() {
        let top = top_products(&fixture(), 3).unwrap();
        assert_eq!(
            top.iter().map(|p| p.product.as_str()).collect::<Vec<_>>(),
            ["Laptop", "Shirt", "Mouse"]
        );
        assert_eq!(top[0].revenue, dec!(3550));
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        let odd = vec![
            sale("2023-01-03", "A", "P", "C", "R", dec!(1), 1),
            sale("2023-01-01", "A", "P", "C", "R", dec!(1), 1),
            sale("2023-01-02", "A", "P", "C", "R", dec!(1), 1),
        ];
        assert_eq!(
            median_date(&odd).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        let even = vec![
            sale("2023-01-01", "A", "P", "C", "R", dec!(1), 1),
            sale("2023-01-02", "A", "P", "C", "R", dec!(1), 1),
        ];
        assert_eq!(
            median_date(&even).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
        );
        assert_eq!(median_date(&[]), Err(Error::EmptyDataset));
    }

    #[test]
    fn growth_halves_add_up() {
        let sales = fixture();
        let totals = product_totals(&sales).unwrap();
        for growth in product_growth(&sales).unwrap() {
            let total = totals.iter().find(|t| t.product == growth.product).unwrap();
            assert_eq!(
                growth.first_half_revenue + growth.second_half_revenue,
                total.revenue
            );
        }
    }

    #[test]
    fn growth_rates() {
        // Median falls between 2023-03-15 and 2023-06-01.
        let sales = fixture();
        let growth = product_growth(&sales).unwrap();
        let laptop = growth.iter().find(|g| g.product == "Laptop").unwrap();
        assert_eq!(laptop.first_half_revenue, dec!(2600));
        assert_eq!(laptop.second_half_revenue, dec!(950));
        assert_eq!(laptop.rate(), Ok((dec!(950) - dec!(2600)) / dec!(2600)));
        let jeans = growth.iter().find(|g| g.product == "Jeans").unwrap();
        assert_eq!(jeans.first_half_revenue, Decimal::ZERO);
        assert_eq!(
            jeans.rate(),
            Err(Error::UndefinedMetric {
                metric: "growth_rate",
                key: "Jeans".into()
            })
        );
    }

    #[test]
    fn zero_first_half_is_undefined() {
        let sales = vec![
            sale("2023-01-01", "A", "Old", "C", "R", dec!(10), 1),
            sale("2023-01-02", "A", "Old", "C", "R", dec!(10), 1),
            sale("2023-03-01", "A", "New", "C", "R", dec!(100), 1),
        ];
        let growth = product_growth(&sales).unwrap();
        assert_eq!(
            growth,
            [
                ProductGrowth {
                    product: "New".into(),
                    first_half_revenue: dec!(0),
                    second_half_revenue: dec!(100),
                    growth_rate: None,
                },
                ProductGrowth {
                    product: "Old".into(),
                    first_half_revenue: dec!(10),
                    second_half_revenue: dec!(10),
                    growth_rate: Some(dec!(0)),
                },
            ]
        );
        assert!(matches!(
            growth[0].rate(),
            Err(Error::UndefinedMetric { .. })
        ));
    }

    #[test]
    fn first_half_only_is_a_full_decline() {
        // Median is 2023-01-02: only "Gone" sells strictly before it.
        let sales = vec![
            sale("2023-01-01", "A", "Gone", "C", "R", dec!(10), 1),
            sale("2023-01-02", "A", "Stay", "C", "R", dec!(10), 1),
            sale("2023-03-01", "A", "Stay", "C", "R", dec!(10), 1),
        ];
        let growth = product_growth(&sales).unwrap();
        let gone = growth.iter().find(|g| g.product == "Gone").unwrap();
        assert_eq!(gone.first_half_revenue, dec!(10));
        assert_eq!(gone.second_half_revenue, Decimal::ZERO);
        assert_eq!(gone.rate(), Ok(dec!(-1)));
        let ranked = ranked_by_growth(growth);
        assert_eq!(
            ranked.iter().map(|g| g.product.as_str()).collect::<Vec<_>>(),
            ["Gone", "Stay"]
        );
    }

    #[test]
    fn tiny_first_half_overflows_the_rate() {
        assert_eq!(
            ProductGrowth::new("A".into(), dec!(0.0000000001), Decimal::MAX),
            Err(Error::Overflow("growth rate"))
        );
    }

    #[test]
    fn ranking_puts_undefined_last() {
        let ranked = ranked_by_growth(vec![
            ProductGrowth::new("A".into(), dec!(0), dec!(5)).unwrap(),
            ProductGrowth::new("B".into(), dec!(10), dec!(5)).unwrap(),
            ProductGrowth::new("C".into(), dec!(10), dec!(30)).unwrap(),
            ProductGrowth::new("D".into(), dec!(10), dec!(10)).unwrap(),
        ]);
        assert_eq!(
            ranked.iter().map(|g| g.product.as_str()).collect::<Vec<_>>(),
            ["C", "D", "B", "A"]
        );
    }
}
