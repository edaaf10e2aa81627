//! # aws-harvest
//!
//! A Rust library and CLI for harvesting AWS EC2 and Lightsail instance
//! details straight from the console UI via the Chrome DevTools Protocol
//! (CDP). No AWS API credentials required, just a logged-in console
//! session.
//!
//! ## Features
//!
//! - **Browser Session Management**: Launch or connect to Chrome/Chromium
//!   instances with anti-automation-detection arguments
//! - **DOM Snapshots**: Serialize console detail pages (including the EC2
//!   compute iframe) into an owned element tree
//! - **Field Extraction**: Labeled-field strategies, resource-id and
//!   address pattern scanners, table role classification
//! - **Record Aggregation**: Merge per-tab partials into one instance
//!   record with Details-tab precedence
//! - **Reports**: Emoji-sectioned email bodies with composer dispatch and
//!   a URL-length clipboard fallback
//! - **Export**: JSON and flattened CSV output
//!
//! ## CLI
//!
//! ```bash
//! # Harvest everything in the default region into aws-instances.json
//! cargo run --bin aws-harvest
//!
//! # EC2 only, specific region, CSV output
//! cargo run --bin aws-harvest -- --service ec2 --region eu-west-1 --output fleet.csv
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use aws_harvest::{BrowserSession, LaunchOptions, Scraper, ServiceFilter};
//!
//! # fn main() -> aws_harvest::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let scraper = Scraper::new(session).with_region(Some("us-east-1".to_string()));
//!
//! scraper.open_console()?;
//! scraper.wait_for_login(300)?;
//!
//! let results = scraper.harvest(ServiceFilter::All)?;
//! results.write(std::path::Path::new("aws-instances.json"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Formatting a record as an email
//!
//! ```rust,no_run
//! use aws_harvest::format::{compose_report, Composer};
//! # use aws_harvest::record::{AccountInfo, InstanceRecord, Service};
//! # let record = InstanceRecord::new("i-0abc12345def67890", Service::Ec2);
//! # let account = AccountInfo::default();
//! let action = compose_report(&record, &account, Composer::Gmail);
//! println!("open {}", action.url());
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Browser session management and configuration
//! - [`dom`]: DOM snapshots, element tree and table views
//! - [`extract`]: Field extraction, pattern scanners and record aggregation
//! - [`record`]: The instance record data model
//! - [`scrape`]: The harvest driver (login wait, instance lists, tab walks)
//! - [`format`]: Email body/subject formatting and composer dispatch
//! - [`export`]: JSON/CSV result export
//! - [`error`]: Error types and result alias

pub mod browser;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod format;
pub mod record;
pub mod scrape;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{Document, ElementNode, TableRow, TableView};
pub use error::{HarvestError, Result};
pub use export::{HarvestResults, ScrapeOutcome};
pub use record::{AccountInfo, InstanceRecord, Service};
pub use scrape::{Scraper, ServiceFilter, SettlePolicy};
