use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

pub type CustomerId = String;

pub const SIGNIFICANT_DIGITS: u32 = 4;

/// Columns the input file must carry in its header line; any other column is ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "Customer_ID",
    "Product",
    "Category",
    "Region",
    "Sales",
    "Quantity",
];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Accepted date layouts, tried in order. Slashed dates are always month-first.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One line of the sales file. Like the total of an account, `revenue` isn't stored:
/// it is a "virtual" field computed from `sales_price` and `quantity` every time it's
/// asked for, so the two can never drift apart. Same goes for the calendar fields.
/// A product that doesn't fit in a `Decimal` is an `Error::Overflow`.
///
/// `sales_price` and `quantity` are deserialized as signed values so that a negative
/// number is reported as such instead of as an obscure parse failure; the loader's
/// `SaleUser` is where they get rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct SaleRecord {
    #[serde(rename = "Date", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "Customer_ID")]
    pub customer_id: CustomerId,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Sales")]
    pub sales_price: Decimal,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

impl SaleRecord {
    pub fn revenue(&self) -> Result<Decimal, Error> {
        self.sales_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(Error::Overflow("revenue"))
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month())
    }
}

/// Three-letter English abbreviation of a 1-based month number.
pub(crate) fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_date(&s).ok_or_else(|| de::Error::custom(format!("unrecognized date {s:?}")))
}

/// Errors of the loading and aggregation stages. `UndefinedMetric` is mostly raised by
/// the accessors callers use when they want a plain number out of a value the
/// aggregators keep as `None`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Row {row}: {reason}")]
    Parse { row: u64, reason: String },
    #[error("Missing column {0:?} in header")]
    MissingColumn(&'static str),
    #[error("Field {0:?} is empty")]
    MissingField(&'static str),
    #[error("Sales price must not be negative (got {0})")]
    NegativePrice(Decimal),
    #[error("Quantity must not be negative (got {0})")]
    NegativeQuantity(i64),
    #[error("Dataset contains no valid records")]
    EmptyDataset,
    #[error("Metric {metric} is undefined for {key:?}")]
    UndefinedMetric { metric: &'static str, key: String },
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}
