use crate::data::{Error, SaleRecord, REQUIRED_COLUMNS, SIGNIFICANT_DIGITS};
use log::{info, warn};

/// Trait for doing something with a `SaleRecord` read from a CSV file.
/// Used to fill the `Sales` table the aggregators work on, but also used for mock
/// tests to check we get the correct results from reading a CSV stream.
pub(crate) trait SaleUser {
    fn use_sale(&mut self, sale: SaleRecord) -> Result<(), Error>;
}

/// What to do with a row that can't be turned into a `SaleRecord`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadMode {
    /// Abort the whole load on the first bad row.
    #[default]
    FailFast,
    /// Skip bad rows and list them in the `LoadReport`.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejected {
    pub row: u64,
    pub reason: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<Rejected>,
}

/// CSV importer for `SaleRecord`s. The header line is mandatory and must name every
/// one of `REQUIRED_COLUMNS`; rows are handed to `user` in file order.
///
/// Row numbers in errors are line numbers in the file, the header being line 1.
pub(crate) fn read_sales<R: std::io::Read, U: SaleUser>(
    reader: R,
    user: &mut U,
    mode: LoadMode,
) -> Result<LoadReport, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::MissingColumn(column));
        }
    }

    let mut report = LoadReport::default();
    for result in rdr.records() {
        let outcome = result.map_err(csv_error).and_then(|record| {
            let row = record.position().map_or(0, |p| p.line());
            let mut sale: SaleRecord =
                record
                    .deserialize(Some(&headers))
                    .map_err(|e| Error::Parse {
                        row,
                        reason: e.to_string(),
                    })?;
            sale.sales_price.rescale(SIGNIFICANT_DIGITS);
            user.use_sale(sale).map_err(|e| Error::Parse {
                row,
                reason: e.to_string(),
            })
        });
        match (outcome, mode) {
            (Ok(()), _) => report.accepted += 1,
            (Err(Error::Parse { row, reason }), LoadMode::Lenient) => {
                let rejected = Rejected { row, reason };
                warn!("Skipped row {}: {}", rejected.row, rejected.reason);
                report.rejected.push(rejected);
            }
            (Err(e), _) => return Err(e),
        }
    }
    info!(
        "Loaded {} sales ({} rows rejected)",
        report.accepted,
        report.rejected.len()
    );
    Ok(report)
}

fn csv_error(e: csv::Error) -> Error {
    Error::Parse {
        row: e.position().map_or(0, |p| p.line()),
        reason: e.to_string(),
    }
}
