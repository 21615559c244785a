use anyhow::Context;
use clap::Parser;
use compute::{Aggregates, AnalysisSettings, Sales};
use log::info;
use read::{read_sales, LoadMode};
use report::render_report;
use std::path::PathBuf;
use write::write_tables;

mod compute;
mod customer;
mod data;
mod distribution;
mod overview;
mod price;
mod product;
mod read;
mod region;
mod report;
mod season;
mod write;

/// Descriptive analysis of a sales CSV file
/// (columns Date, Customer_ID, Product, Category, Region, Sales, Quantity).
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The path to the sales CSV file
    input: PathBuf,

    /// Skip malformed rows instead of aborting on the first one
    #[arg(long)]
    lenient: bool,

    /// Also export every table as CSV, plus the report as insights.txt, into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// How many customers to list in the top customers view
    #[arg(long, default_value_t = 10)]
    top_customers: usize,

    /// How many products to follow month by month
    #[arg(long, default_value_t = 3)]
    top_products: usize,

    /// Number of bins of the purchase count and quantity distributions
    #[arg(long, default_value_t = 20)]
    histogram_bins: usize,

    /// How many of the most expensive products get a price distribution
    #[arg(long, default_value_t = 3)]
    price_products: usize,

    /// Number of bins of each price distribution
    #[arg(long, default_value_t = 10)]
    price_bins: usize,
}

impl Args {
    fn load_mode(&self) -> LoadMode {
        if self.lenient {
            LoadMode::Lenient
        } else {
            LoadMode::FailFast
        }
    }

    fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            top_customers: self.top_customers,
            top_products: self.top_products,
            histogram_bins: self.histogram_bins,
            price_products: self.price_products,
            price_bins: self.price_bins,
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Args::parse();

    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let mut sales = Sales::new();
    read_sales(file, &mut sales, args.load_mode())?;

    let aggregates = Aggregates::compute(&sales.records, &args.settings())?;
    let report = render_report(&aggregates)?;
    print!("{report}");

    if let Some(dir) = &args.out_dir {
        write_tables(dir, &aggregates)?;
        let path = dir.join("insights.txt");
        std::fs::write(&path, &report).with_context(|| format!("writing {}", path.display()))?;
        info!("Results saved to {}", dir.display());
    }
    Ok(())
}
