use serde::Serialize;
use stockingest_lib::{BatchReport, CompanyMetadata, StockRow, Ticker};
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct ReportRow {
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Submitted")]
    #[serde(rename = "Submitted")]
    submitted: usize,
    #[tabled(rename = "Completed")]
    #[serde(rename = "Completed")]
    completed: usize,
    #[tabled(rename = "Succeeded")]
    #[serde(rename = "Succeeded")]
    succeeded: usize,
    #[tabled(rename = "Failed")]
    #[serde(rename = "Failed")]
    failed: usize,
}

#[derive(Tabled, Serialize)]
struct StockTableRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Company")]
    #[serde(rename = "Company")]
    company: String,
    #[tabled(rename = "Sector")]
    #[serde(rename = "Sector")]
    sector: String,
    #[tabled(rename = "Industry")]
    #[serde(rename = "Industry")]
    industry: String,
    #[tabled(rename = "Market Cap")]
    #[serde(rename = "Market Cap")]
    market_cap: String,
    #[tabled(rename = "Prices")]
    #[serde(rename = "Prices")]
    prices: i64,
    #[tabled(rename = "Last Price")]
    #[serde(rename = "Last Price")]
    last_price: String,
    #[tabled(rename = "Metadata Refreshed")]
    #[serde(rename = "Metadata Refreshed")]
    refreshed: String,
}

#[derive(Tabled, Serialize)]
struct SeedRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Company")]
    #[serde(rename = "Company")]
    company: String,
    #[tabled(rename = "Sector")]
    #[serde(rename = "Sector")]
    sector: String,
    #[tabled(rename = "Market Cap")]
    #[serde(rename = "Market Cap")]
    market_cap: String,
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Formats a dollar amount as e.g. `$3.50T`, `$812.4B`, `$95.0M`.
fn format_market_cap(value: Option<i64>) -> String {
    let Some(v) = value else {
        return "-".to_string();
    };
    let v = v as f64;
    if v >= 1e12 {
        format!("${:.2}T", v / 1e12)
    } else if v >= 1e9 {
        format!("${:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.1}M", v / 1e6)
    } else {
        format!("${:.0}", v)
    }
}

fn build_report_rows(report: &BatchReport) -> Vec<ReportRow> {
    let (status, summary) = match report {
        BatchReport::Completed { summary } => ("completed", Some(summary)),
        BatchReport::Interrupted { summary } => ("interrupted", Some(summary)),
        BatchReport::Skipped => ("skipped (already running)", None),
    };
    let summary = summary.copied().unwrap_or_default();
    vec![ReportRow {
        status: status.to_string(),
        submitted: summary.submitted,
        completed: summary.completed,
        succeeded: summary.succeeded(),
        failed: summary.failed,
    }]
}

fn build_stock_rows(stocks: &[StockRow]) -> Vec<StockTableRow> {
    stocks
        .iter()
        .map(|s| StockTableRow {
            ticker: s.ticker.clone(),
            company: dash(s.company_name.as_deref()),
            sector: dash(s.sector.as_deref()),
            industry: dash(s.industry.as_deref()),
            market_cap: format_market_cap(s.market_cap),
            prices: s.price_count,
            last_price: dash(s.last_price_date.as_deref()),
            refreshed: dash(s.last_metadata_refresh.as_deref()),
        })
        .collect()
}

fn build_seed_rows(rows: &[(Ticker, CompanyMetadata)]) -> Vec<SeedRow> {
    rows.iter()
        .map(|(ticker, meta)| SeedRow {
            ticker: ticker.to_string(),
            company: dash(meta.company_name.as_deref()),
            sector: dash(meta.sector.as_deref()),
            market_cap: format_market_cap(meta.market_cap),
        })
        .collect()
}

pub fn print_report_table(report: &BatchReport) {
    println!("{}", Table::new(build_report_rows(report)));
}

pub fn print_stocks_table(stocks: &[StockRow]) {
    println!("{}", Table::new(build_stock_rows(stocks)));
}

pub fn print_seed_table(rows: &[(Ticker, CompanyMetadata)]) {
    println!("{}", Table::new(build_seed_rows(rows)));
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
