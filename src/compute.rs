use crate::{
    customer::{customer_kpis, customer_summaries, purchase_count_histogram, top_customers},
    customer::{CustomerKpis, CustomerSummary},
    data::{Error, SaleRecord},
    distribution::{price_histograms, price_quantity_points, quantity_histogram},
    distribution::{HistogramBin, PriceQuantityPoint, ProductPriceBin},
    overview::{overview, Overview},
    price::{price_points, price_stats, ranked_by_mean, PricePointQuantity, PriceStats},
    product::{product_growth, product_periods, ranked_by_growth, top_products},
    product::{ProductGrowth, ProductPeriodRevenue, ProductRevenue},
    read::SaleUser,
    region::{region_category_matrix, regional_preferences},
    region::{RegionCategoryRevenue, RegionalPreference},
    season::{category_months, monthly_seasonality, seasonal_peaks},
    season::{CategoryMonthRevenue, MonthRevenue, SeasonalPeak},
};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// This is where the loaded sales are stored, in file order. Once loading is done
/// nothing mutates it anymore: every aggregator only ever sees `&[SaleRecord]`.
#[derive(Debug, Default)]
pub(crate) struct Sales {
    pub records: Vec<SaleRecord>,
}

impl Sales {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validation of a single sale. Empty identifiers are treated like a missing column,
/// prices and quantities can be zero but not negative, and their product must fit in a
/// `Decimal`.
impl SaleUser for Sales {
    fn use_sale(&mut self, sale: SaleRecord) -> Result<(), Error> {
        let fields = [
            ("Customer_ID", &sale.customer_id),
            ("Product", &sale.product),
            ("Category", &sale.category),
            ("Region", &sale.region),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(Error::MissingField(*name));
        }
        if sale.sales_price < Decimal::ZERO {
            return Err(Error::NegativePrice(sale.sales_price));
        }
        if sale.quantity < 0 {
            return Err(Error::NegativeQuantity(sale.quantity));
        }
        sale.revenue()?;
        self.records.push(sale);
        Ok(())
    }
}

/// Knobs for the presentation-oriented views; the aggregates themselves don't depend
/// on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnalysisSettings {
    pub top_customers: usize,
    pub top_products: usize,
    /// Bins of the purchase count and quantity distributions.
    pub histogram_bins: usize,
    /// How many of the most expensive products get a price distribution.
    pub price_products: usize,
    pub price_bins: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_customers: 10,
            top_products: 3,
            histogram_bins: 20,
            price_products: 3,
            price_bins: 10,
        }
    }
}

/// Every table derived from one set of sales. The passes are independent of each
/// other and all read the same slice.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Aggregates {
    pub overview: Overview,
    pub customers: Vec<CustomerSummary>,
    pub customer_kpis: CustomerKpis,
    pub top_customers: Vec<CustomerSummary>,
    pub purchase_histogram: Vec<HistogramBin>,
    pub product_periods: Vec<ProductPeriodRevenue>,
    pub top_products: Vec<ProductRevenue>,
    /// Ranked by growth rate, undefined rates last.
    pub growth: Vec<ProductGrowth>,
    pub regional: Vec<RegionalPreference>,
    pub region_category: Vec<RegionCategoryRevenue>,
    pub monthly: Vec<MonthRevenue>,
    pub category_months: Vec<CategoryMonthRevenue>,
    pub peaks: Vec<SeasonalPeak>,
    /// Ranked by mean price.
    pub prices: Vec<PriceStats>,
    pub price_points: Vec<PricePointQuantity>,
    pub quantity_histogram: Vec<HistogramBin>,
    pub price_quantity: Vec<PriceQuantityPoint>,
    pub price_histograms: Vec<ProductPriceBin>,
}

impl Aggregates {
    pub fn compute(sales: &[SaleRecord], settings: &AnalysisSettings) -> Result<Self, Error> {
        ensure_not_empty(sales)?;

        debug!("Computing overview");
        let overview = overview(sales)?;

        debug!("Computing customer summaries");
        let customers = customer_summaries(sales)?;
        let customer_kpis = customer_kpis(&customers)?;
        let top = top_customers(&customers, settings.top_customers);
        let purchase_histogram = purchase_count_histogram(&customers, settings.histogram_bins);

        debug!("Computing product performance");
        let product_periods = product_periods(sales)?;
        let top_products = top_products(sales, settings.top_products)?;
        let growth = ranked_by_growth(product_growth(sales)?);

        debug!("Computing regional preferences");
        let regional = regional_preferences(sales)?;
        let region_category = region_category_matrix(sales)?;

        debug!("Computing seasonality");
        let monthly = monthly_seasonality(sales)?;
        let category_months = category_months(sales)?;
        let peaks = seasonal_peaks(sales)?;

        debug!("Computing price statistics");
        let prices = ranked_by_mean(price_stats(sales)?);
        let price_points = price_points(sales)?;

        debug!("Computing distributions");
        let quantity_histogram = quantity_histogram(sales, settings.histogram_bins);
        let price_quantity = price_quantity_points(sales);
        let price_histograms =
            price_histograms(sales, &prices, settings.price_products, settings.price_bins);

        Ok(Self {
            overview,
            customers,
            customer_kpis,
            top_customers: top,
            purchase_histogram,
            product_periods,
            top_products,
            growth,
            regional,
            region_category,
            monthly,
            category_months,
            peaks,
            prices,
            price_points,
            quantity_histogram,
            price_quantity,
            price_histograms,
        })
    }
}

pub(crate) fn ensure_not_empty(sales: &[SaleRecord]) -> Result<(), Error> {
    if sales.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(())
}

/// `total + amount`, failing with `Error::Overflow(what)` instead of panicking.
pub(crate) fn add(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal, Error> {
    total.checked_add(amount).ok_or(Error::Overflow(what))
}

pub(crate) fn sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, Error> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| add(total, value, what))
}

/// Sums revenue per key. Keys come back in ascending order, which is what every
/// "first maximum wins" selection below relies on for its tie-break.
pub(crate) fn revenue_by<'a, K: Ord>(
    sales: &'a [SaleRecord],
    key: impl Fn(&'a SaleRecord) -> K,
) -> Result<BTreeMap<K, Decimal>, Error> {
    let mut sums = BTreeMap::new();
    for sale in sales {
        let total = sums.entry(key(sale)).or_insert(Decimal::ZERO);
        *total = add(*total, sale.revenue()?, "revenue")?;
    }
    Ok(sums)
}

/// First entry holding the greatest revenue; later entries must be strictly greater to
/// replace it.
pub(crate) fn first_max<K>(
    entries: impl IntoIterator<Item = (K, Decimal)>,
) -> Option<(K, Decimal)> {
    entries.into_iter().fold(None, |best, (key, revenue)| match best {
        Some((_, top)) if revenue <= top => best,
        _ => Some((key, revenue)),
    })
}

/// Stable sort, greatest first: equal values keep their incoming order.
pub(crate) fn sort_descending<T>(items: &mut [T], value: impl Fn(&T) -> Decimal) {
    items.sort_by(|a, b| value(b).cmp(&value(a)));
}
