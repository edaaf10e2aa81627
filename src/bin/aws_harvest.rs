//! Harvest AWS EC2 and Lightsail instance details from a logged-in
//! console session and export them as JSON or CSV.

use std::path::PathBuf;

use clap::Parser;

use aws_harvest::{
    BrowserSession, HarvestResults, LaunchOptions, Result, Scraper, ServiceFilter,
};

#[derive(Parser, Debug)]
#[command(
    name = "aws-harvest",
    about = "Harvest AWS EC2/Lightsail instance details from the console UI",
    version
)]
struct Args {
    /// Service to harvest: ec2, lightsail or all
    #[arg(long, default_value = "all")]
    service: ServiceFilter,

    /// AWS region (defaults to whatever the console session lands on)
    #[arg(long)]
    region: Option<String>,

    /// Output file path; a .csv extension selects CSV, anything else JSON
    #[arg(long, default_value = "aws-instances.json")]
    output: PathBuf,

    /// Seconds to wait for the console login
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Run the browser headless (only useful with a pre-authenticated
    /// user data directory)
    #[arg(long)]
    headless: bool,

    /// Verbose debug logging
    #[arg(long)]
    debug: bool,
}

const RULE: &str = "──────────────────────────────────────────────────";

fn banner(args: &Args) {
    println!("\n🚀 aws-harvest\n");
    println!("{RULE}");
    println!("Service: {}", args.service);
    println!("Region: {}", args.region.as_deref().unwrap_or("default"));
    println!("Output: {}", args.output.display());
    println!("Headless: {}", args.headless);
    println!("{RULE}\n");
}

fn summary(results: &HarvestResults) {
    println!("\n📊 Summary");
    println!("{RULE}");
    println!("EC2 instances: {}", results.ec2.len());
    println!("Lightsail instances: {}", results.lightsail.len());
    println!("Total: {}", results.ec2.len() + results.lightsail.len());
    println!("{RULE}\n");
}

fn run(args: &Args) -> Result<()> {
    let session = BrowserSession::launch(LaunchOptions::default().headless(args.headless))?;
    let scraper = Scraper::new(session).with_region(args.region.clone());

    scraper.open_console()?;
    scraper.wait_for_login(args.timeout)?;

    let results = scraper.harvest(args.service)?;
    results.write(&args.output)?;
    log::info!("Results saved to {}", args.output.display());

    summary(&results);
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    banner(&args);

    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
