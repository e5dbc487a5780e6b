use chrono::NaiveDate;
use clap::Parser;
use dayahead_application::PriceRepository;
use dayahead_domain::{Market, TargetDay};
use dayahead_infrastructure::CsvPriceRepository;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "verify-prices")]
#[command(about = "Inspect a stored day-ahead price file", long_about = None)]
struct Cli {
    /// Delivery day, YYYY-MM-DD
    #[arg(short, long)]
    date: String,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let date = NaiveDate::parse_from_str(&cli.date, "%Y-%m-%d")?;
    let market = Market::FINLAND;
    let day = TargetDay::new(date, market.timezone());
    let repository = CsvPriceRepository::new(cli.data_dir);
    let path = repository.artifact_path(&market, &day);

    println!("Verifying price file: {}", path.display());

    let rows = repository.load(&market, &day).await?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        println!("\nFile has no price rows");
        return Ok(());
    };

    let expected_hours = day.window()?.hours();
    let min = rows.iter().map(|r| r.price).min().unwrap_or_default();
    let max = rows.iter().map(|r| r.price).max().unwrap_or_default();
    let mean = rows.iter().map(|r| r.price).sum::<Decimal>() / Decimal::from(rows.len());
    let off_day = rows
        .iter()
        .filter(|r| !day.contains(&r.timestamp))
        .count();

    println!("\nRows:");
    println!("  - Count: {} (day spans {}h)", rows.len(), expected_hours);
    println!("  - First: {}", first.timestamp.to_rfc3339());
    println!("  - Last:  {}", last.timestamp.to_rfc3339());
    println!("  - Outside {}: {}", date, off_day);

    println!("\nPrices:");
    println!("  - Min:  {}", min);
    println!("  - Max:  {}", max);
    println!("  - Mean: {}", mean.round_dp(2));

    if off_day > 0 {
        return Err(format!("{} rows fall outside {}", off_day, date).into());
    }

    println!("\nPrice file is valid");
    Ok(())
}
