use clap::Parser;
use logsift::{analysis, export, ingest, FilterSpec};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// One-shot traffic report over a Combined Log Format access log.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Access log to analyze.
    log: PathBuf,

    /// Number of entries in the top-N tables.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Only count requests with this method (case-insensitive).
    #[arg(long)]
    method: Option<String>,

    /// Only count this status family, given as its first digit (4 for 4xx).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=9))]
    status_family: Option<u16>,

    /// Only count paths containing this substring (case-insensitive).
    #[arg(long)]
    path_contains: Option<String>,

    /// Inclusive lower time bound, e.g. '10/Oct/2023:00:00:00 -0700'.
    #[arg(long)]
    from: Option<String>,

    /// Inclusive upper time bound, same format as --from.
    #[arg(long)]
    to: Option<String>,

    /// Drop requests whose user agent looks like a crawler.
    #[arg(long)]
    exclude_bots: bool,

    /// Also write the filtered entries to this CSV file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), logsift::Error> {
    let spec = FilterSpec {
        from: args.from.as_deref().map(analysis::parse_bound).transpose()?,
        to: args.to.as_deref().map(analysis::parse_bound).transpose()?,
        method: args.method,
        status_family: args.status_family,
        path_contains: args.path_contains,
        exclude_bots: args.exclude_bots,
    };

    let report = ingest::ingest(&args.log)?;
    println!(
        "Parsed {} entries, skipped {} lines.",
        report.entries.len(),
        report.rejections.len()
    );
    for rejection in report.rejections.iter().take(5) {
        eprintln!("  {rejection}");
    }

    let entries = analysis::filter(&report.entries, &spec);

    println!("\n--- Summary ---");
    println!("Total hits        : {}", analysis::total_hits(&entries));
    println!("Unique visitors   : {}", analysis::unique_visitors(&entries));
    println!("Bandwidth (bytes) : {}", analysis::total_bytes(&entries));

    println!("\n--- Status codes ---");
    for (family, count) in analysis::status_families(&entries) {
        println!("{}xx : {count}", family / 100);
    }
    for (code, count) in analysis::status_buckets(&entries) {
        println!("{code} : {count}");
    }

    print_top("Top paths", analysis::top_paths(&entries, args.top));
    print_top("Top referers", analysis::top_referers(&entries, args.top));
    print_top("Top user agents", analysis::top_user_agents(&entries, args.top));

    println!("\n--- Hits per day ---");
    for (day, count) in analysis::hits_per_day(&entries) {
        println!("{day} : {count}");
    }

    println!("\n--- Hits per hour ---");
    for (hour, count) in analysis::hits_per_hour(&entries).iter().enumerate() {
        println!("{hour:02} : {count}");
    }

    if let Some(out) = &args.export {
        export::export_csv(&entries, out)?;
        println!("\nExported {} rows to {}", entries.len(), out.display());
    }
    Ok(())
}

fn print_top(title: &str, rows: Vec<(String, u64)>) {
    println!("\n--- {title} ---");
    if rows.is_empty() {
        println!("(none)");
    }
    for (rank, (value, count)) in rows.iter().enumerate() {
        println!("{:2}) {count:7}  {value}", rank + 1);
    }
}
