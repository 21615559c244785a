use crate::{
    compute::{add, sort_descending, sum},
    data::{CustomerId, Error, SaleRecord},
    distribution::{histogram, HistogramBin},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CustomerSummary {
    pub customer_id: CustomerId,
    pub total_revenue: Decimal,
    pub avg_order_value: Decimal,
    pub first_purchase: NaiveDate,
    pub last_purchase: NaiveDate,
    pub purchase_count: usize,
    /// Days between the first purchase and the last sale of the whole data set.
    pub days_as_customer: i64,
    /// Purchases per day of tenure; zero for a customer whose tenure is zero days.
    pub purchase_frequency: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CustomerKpis {
    pub customers: usize,
    pub mean_lifetime_value: Decimal,
    pub mean_purchase_frequency: Decimal,
}

struct Tally {
    revenue: Decimal,
    count: usize,
    first: NaiveDate,
    last: NaiveDate,
}

/// Customer ids that are plain numbers sort by value ("9" before "10") and come before
/// any other id; those sort as text.
pub(crate) fn compare_customer_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// One summary per customer, ordered by `compare_customer_ids`.
pub(crate) fn customer_summaries(sales: &[SaleRecord]) -> Result<Vec<CustomerSummary>, Error> {
    let latest = sales
        .iter()
        .map(|s| s.date)
        .max()
        .ok_or(Error::EmptyDataset)?;

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    for sale in sales {
        let tally = tallies.entry(&sale.customer_id).or_insert(Tally {
            revenue: Decimal::ZERO,
            count: 0,
            first: sale.date,
            last: sale.date,
        });
        tally.revenue = add(tally.revenue, sale.revenue()?, "revenue")?;
        tally.count += 1;
        tally.first = tally.first.min(sale.date);
        tally.last = tally.last.max(sale.date);
    }

    let mut summaries: Vec<CustomerSummary> = tallies
        .into_iter()
        .map(|(id, tally)| {
            let days_as_customer = (latest - tally.first).num_days();
            let purchase_frequency = if days_as_customer == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(tally.count) / Decimal::from(days_as_customer)
            };
            CustomerSummary {
                customer_id: id.to_owned(),
                total_revenue: tally.revenue,
                avg_order_value: tally.revenue / Decimal::from(tally.count),
                first_purchase: tally.first,
                last_purchase: tally.last,
                purchase_count: tally.count,
                days_as_customer,
                purchase_frequency,
            }
        })
        .collect();
    summaries.sort_by(|a, b| compare_customer_ids(&a.customer_id, &b.customer_id));
    Ok(summaries)
}

/// The `n` best customers by total revenue; equal revenues keep the order of
/// `customer_summaries`.
pub(crate) fn top_customers(summaries: &[CustomerSummary], n: usize) -> Vec<CustomerSummary> {
    let mut ranked = summaries.to_vec();
    sort_descending(&mut ranked, |c| c.total_revenue);
    ranked.truncate(n);
    ranked
}

pub(crate) fn customer_kpis(summaries: &[CustomerSummary]) -> Result<CustomerKpis, Error> {
    if summaries.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let customers = Decimal::from(summaries.len());
    let lifetime = sum(summaries.iter().map(|c| c.total_revenue), "lifetime value")?;
    let frequency = sum(
        summaries.iter().map(|c| c.purchase_frequency),
        "purchase frequency",
    )?;
    Ok(CustomerKpis {
        customers: summaries.len(),
        mean_lifetime_value: lifetime / customers,
        mean_purchase_frequency: frequency / customers,
    })
}

/// Distribution of the number of purchases per customer.
pub(crate) fn purchase_count_histogram(
    summaries: &[CustomerSummary],
    bins: usize,
) -> Vec<HistogramBin> {
    let counts: Vec<f64> = summaries.iter().map(|c| c.purchase_count as f64).collect();
    histogram(&counts, bins)
}

#[cfg(test)]
mod tests {
    use super::{
        compare_customer_ids, customer_kpis, customer_summaries, purchase_count_histogram,
        top_customers,
    };
    use crate::{
        compute::tests::{fixture, sale},
        data::Error,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cmp::Ordering;

    #[test]
    fn same_day_customer() {
        let sales = vec![
            sale("2023-05-01", "A", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-01", "A", "Pad", "Office", "East", dec!(5), 2),
            sale("2023-05-01", "A", "Ink", "Office", "East", dec!(2.5), 4),
        ];
        let summaries = customer_summaries(&sales).unwrap();
        assert_eq!(summaries.len(), 1);
        let a = &summaries[0];
        assert_eq!(a.total_revenue, dec!(30));
        assert_eq!(a.avg_order_value, dec!(10));
        assert_eq!(a.purchase_count, 3);
        assert_eq!(a.days_as_customer, 0);
        assert_eq!(a.purchase_frequency, Decimal::ZERO);
    }

    #[test]
    fn tenure_is_relative_to_latest_sale() {
        let sales = fixture();
        let summaries = customer_summaries(&sales).unwrap();
        let c2 = summaries.iter().find(|c| c.customer_id == "C2").unwrap();
        assert_eq!(c2.first_purchase, NaiveDate::from_ymd_opt(2023, 1, 20).unwrap());
        assert_eq!(c2.last_purchase, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        // 2023-01-20 to 2024-02-10
        assert_eq!(c2.days_as_customer, 386);
        assert_eq!(c2.purchase_frequency, dec!(2) / dec!(386));
        assert_eq!(c2.total_revenue, dec!(190));
        assert_eq!(c2.avg_order_value, dec!(95));
    }

    #[test]
    fn totals_match_direct_sums() {
        let sales = fixture();
        for summary in customer_summaries(&sales).unwrap() {
            let direct: Decimal = sales
                .iter()
                .filter(|s| s.customer_id == summary.customer_id)
                .map(|s| s.revenue().unwrap())
                .sum();
            assert_eq!(summary.total_revenue, direct);
            assert!(summary.purchase_frequency >= Decimal::ZERO);
        }
    }

    #[test]
    fn top_customers_ranking() {
        let sales = vec![
            sale("2023-05-01", "A", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-02", "B", "Pen", "Office", "East", dec!(30), 1),
            sale("2023-05-03", "C", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-04", "D", "Pen", "Office", "East", dec!(20), 1),
        ];
        let summaries = customer_summaries(&sales).unwrap();
        let top: Vec<_> = top_customers(&summaries, 3)
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(top, ["B", "D", "A"]);
        assert_eq!(top_customers(&summaries, 10).len(), 4);
    }

    #[test]
    fn numeric_ids_sort_by_value() {
        let sales = vec![
            sale("2023-05-01", "100", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-02", "Z9", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-03", "9", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-04", "10", "Pen", "Office", "East", dec!(10), 1),
            sale("2023-05-05", "A1", "Pen", "Office", "East", dec!(10), 1),
        ];
        let summaries = customer_summaries(&sales).unwrap();
        assert_eq!(
            summaries.iter().map(|c| c.customer_id.as_str()).collect::<Vec<_>>(),
            ["9", "10", "100", "A1", "Z9"]
        );
        // equal revenues: ties follow the same order
        let top: Vec<_> = top_customers(&summaries, 3)
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(top, ["9", "10", "100"]);
        assert_eq!(compare_customer_ids("007", "7"), Ordering::Less);
        assert_eq!(compare_customer_ids("7", "007"), Ordering::Greater);
    }

    #[test]
    fn kpis() {
        let summaries = customer_summaries(&fixture()).unwrap();
        let kpis = customer_kpis(&summaries).unwrap();
        assert_eq!(kpis.customers, 4);
        assert_eq!(kpis.mean_lifetime_value, dec!(4150) / dec!(4));
        assert_eq!(customer_kpis(&[]), Err(Error::EmptyDataset));
    }

    #[test]
    fn histogram() {
        let sales = vec![
            sale("2023-05-01", "A", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-01", "B", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-01", "C", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-02", "C", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-01", "D", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-02", "D", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-03", "D", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-04", "D", "Pen", "Office", "East", dec!(1), 1),
            sale("2023-05-05", "D", "Pen", "Office", "East", dec!(1), 1),
        ];
        // purchase counts: 1, 1, 2, 5
        let summaries = customer_summaries(&sales).unwrap();
        let histogram = purchase_count_histogram(&summaries, 4);
        assert_eq!(
            histogram.iter().map(|b| b.count).collect::<Vec<_>>(),
            [2, 1, 0, 1]
        );
        assert_eq!(histogram[0].lower, 1.0);
        assert_eq!(histogram[3].upper, 5.0);

        let single = purchase_count_histogram(&summaries[..1], 2);
        assert_eq!(single.iter().map(|b| b.count).collect::<Vec<_>>(), [0, 1]);
        assert!(purchase_count_histogram(&[], 4).is_empty());
    }

    #[test]
    fn empty_dataset() {
        assert_eq!(customer_summaries(&[]), Err(Error::EmptyDataset));
    }
}
