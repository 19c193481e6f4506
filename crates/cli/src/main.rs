//! PageSpeed Report CLI entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = pagespeed_report_cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
