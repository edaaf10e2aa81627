//! Console scraping driver.
//!
//! Ties the browser session to the extractors: wait for a human login,
//! discover account and region, walk instance lists and pull every detail
//! tab per instance. One broken instance or tab degrades to a stub or an
//! empty partial instead of failing the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::Tab;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::browser::BrowserSession;
use crate::dom::Document;
use crate::error::{HarvestError, Result};
use crate::export::{HarvestResults, ScrapeOutcome};
use crate::extract::{self, aggregate, ec2, lightsail};
use crate::record::{AccountInfo, Ec2Tabs, InstanceRecord, LightsailTabs};

pub const AWS_CONSOLE_URL: &str = "https://console.aws.amazon.com/";
pub const LIGHTSAIL_CONSOLE_URL: &str =
    "https://lightsail.aws.amazon.com/ls/webapp/home/instances";

static REGION_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"region=([a-z]{2}-[a-z]+-\d)").unwrap());
static REGION_IN_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]{2}-[a-z]+-\d)\.console\.aws\.amazon\.com").unwrap());

/// Which consoles a run should harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceFilter {
    Ec2,
    Lightsail,
    #[default]
    All,
}

impl ServiceFilter {
    pub fn includes_ec2(&self) -> bool {
        matches!(self, ServiceFilter::Ec2 | ServiceFilter::All)
    }

    pub fn includes_lightsail(&self) -> bool {
        matches!(self, ServiceFilter::Lightsail | ServiceFilter::All)
    }
}

impl std::str::FromStr for ServiceFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ec2" => Ok(ServiceFilter::Ec2),
            "lightsail" => Ok(ServiceFilter::Lightsail),
            "all" => Ok(ServiceFilter::All),
            other => Err(format!("unknown service '{other}', expected ec2|lightsail|all")),
        }
    }
}

impl std::fmt::Display for ServiceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceFilter::Ec2 => "ec2",
            ServiceFilter::Lightsail => "lightsail",
            ServiceFilter::All => "all",
        };
        f.write_str(name)
    }
}

/// How long to let the console settle after each kind of navigation.
/// The console renders asynchronously, so snapshots taken too early see
/// empty tables.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    /// After a full page navigation
    pub page: Duration,
    /// After switching detail tabs in place
    pub tab_switch: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            page: Duration::from_secs(3),
            tab_switch: Duration::from_millis(2500),
        }
    }
}

impl SettlePolicy {
    /// No waiting at all; for tests
    pub fn zero() -> Self {
        Self { page: Duration::ZERO, tab_switch: Duration::ZERO }
    }
}

/// EC2 console list URL for a region (regionless console default when absent)
pub fn ec2_list_url(region: Option<&str>) -> String {
    match region {
        Some(region) => format!(
            "https://{region}.console.aws.amazon.com/ec2/home?region={region}#Instances:"
        ),
        None => "https://console.aws.amazon.com/ec2/home#Instances:".to_string(),
    }
}

/// EC2 instance detail page URL
pub fn ec2_detail_url(region: Option<&str>, instance_id: &str) -> String {
    match region {
        Some(region) => format!(
            "https://{region}.console.aws.amazon.com/ec2/home?region={region}#InstanceDetails:instanceId={instance_id}"
        ),
        None => format!(
            "https://console.aws.amazon.com/ec2/home#InstanceDetails:instanceId={instance_id}"
        ),
    }
}

/// Lightsail instance list URL
pub fn lightsail_list_url(region: Option<&str>) -> String {
    match region {
        Some(region) => format!("https://lightsail.aws.amazon.com/ls/webapp/{region}/instances"),
        None => LIGHTSAIL_CONSOLE_URL.to_string(),
    }
}

/// Lightsail detail tab URL (`connect`, `storage`, `networking`, …)
pub fn lightsail_tab_url(region: &str, name: &str, tab: &str) -> String {
    format!(
        "https://lightsail.aws.amazon.com/ls/webapp/{region}/instances/{}/{tab}",
        urlencoding::encode(name)
    )
}

/// Instance ids found anywhere in a list page snapshot
pub fn ec2_ids_from(doc: &Document) -> Vec<String> {
    extract::patterns::scan_instance_ids(&doc.visible_text())
}

/// Instance names parsed from `/instances/{name}` links on a list page
pub fn lightsail_names_from(doc: &Document) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for link in doc.find_all(|n| n.is_tag("a") && n.attr_contains("href", "/instances/")) {
        let Some(href) = link.attr("href") else { continue };
        let Some(rest) = href.split("/instances/").nth(1) else { continue };
        let Some(raw) = rest.split(['/', '?', '#']).next() else { continue };
        if raw.is_empty() {
            continue;
        }
        let name = urlencoding::decode(raw)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Drives one harvest run over a logged-in console session
pub struct Scraper {
    session: BrowserSession,
    settle: SettlePolicy,
    region: Option<String>,
}

impl Scraper {
    pub fn new(session: BrowserSession) -> Self {
        Self { session, settle: SettlePolicy::default(), region: None }
    }

    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Open the console landing page
    pub fn open_console(&self) -> Result<()> {
        self.session.navigate(AWS_CONSOLE_URL)?;
        self.session.wait_for_navigation()?;
        Ok(())
    }

    /// Poll until the user has logged in to the console, checking every
    /// two seconds and reporting progress every thirty.
    pub fn wait_for_login(&self, timeout_secs: u64) -> Result<()> {
        log::info!("Waiting for you to log in to the AWS console (timeout {timeout_secs}s)");
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);
        let mut last_report = 0;

        while start.elapsed() < timeout {
            if let Ok(tab) = self.session.tab() {
                let url = tab.get_url();
                let on_console = !url.contains("signin")
                    && !url.contains("login")
                    && (url.contains("console.aws.amazon.com")
                        || url.contains("lightsail.aws.amazon.com"));
                if on_console && self.logged_in_markers(&tab) {
                    log::info!("Login detected");
                    return Ok(());
                }
            }

            std::thread::sleep(Duration::from_secs(2));
            let elapsed = start.elapsed().as_secs();
            if elapsed / 30 > last_report {
                last_report = elapsed / 30;
                log::info!("Still waiting for login, {}s remaining", timeout_secs.saturating_sub(elapsed));
            }
        }

        Err(HarvestError::LoginTimeout(timeout_secs))
    }

    fn logged_in_markers(&self, tab: &Arc<Tab>) -> bool {
        let js = r#"
            (function() {
                return document.querySelector('[data-testid="awsc-nav-account-menu-button"]') !== null ||
                    document.querySelector('#nav-usernameMenu') !== null ||
                    document.querySelector('[data-testid="account-menu-button"]') !== null ||
                    document.body.innerHTML.includes('aws-account-info') ||
                    document.body.innerHTML.includes('Account ID');
            })()
        "#;
        self.session.eval_bool(tab, js).unwrap_or(false)
    }

    /// Account id, display name and region from the console chrome:
    /// the `awsc-session-data` meta JSON first, nav menu text second.
    pub fn account_info(&self) -> AccountInfo {
        let mut account = AccountInfo { region: self.region.clone(), ..Default::default() };

        let Ok(tab) = self.session.tab() else { return account };

        let meta_js = r#"
            (function() {
                const meta = document.querySelector('meta[name="awsc-session-data"]');
                return meta ? (meta.getAttribute('content') || '') : '';
            })()
        "#;
        if let Ok(Some(raw)) = self.session.eval_string(&tab, meta_js) {
            if let Ok(session) = serde_json::from_str::<serde_json::Value>(&raw) {
                account.id = session
                    .get("accountId")
                    .and_then(|v| v.as_str())
                    .and_then(extract::patterns::first_account_id);
                account.name = session
                    .get("displayName")
                    .and_then(|v| v.as_str())
                    .and_then(|s| {
                        // Display names arrive percent-encoded
                        let decoded = urlencoding::decode(s)
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|_| s.to_string());
                        extract::field::presence(&decoded)
                    });
                if account.region.is_none() {
                    account.region = session
                        .get("infrastructureRegion")
                        .or_else(|| session.get("region"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                }
            }
        }

        if account.id.is_none() || account.name.is_none() {
            let js = r#"
                (function() {
                    const btn = document.querySelector('[data-testid="awsc-nav-account-menu-button"]') ||
                        document.querySelector('#nav-usernameMenu');
                    return btn ? (btn.textContent || '') : '';
                })()
            "#;
            if let Ok(Some(text)) = self.session.eval_string(&tab, js) {
                // Account ids render with dashes (1234-5678-9012)
                let decoded = urlencoding::decode(&text)
                    .map(|c| c.into_owned())
                    .unwrap_or(text);
                if account.id.is_none() {
                    let undashed = decoded.replace('-', "");
                    account.id = extract::patterns::first_account_id(&undashed);
                }
                if account.name.is_none() {
                    let name = decoded
                        .split('@')
                        .next()
                        .unwrap_or("")
                        .trim()
                        .trim_end_matches('/');
                    if !name.is_empty() && extract::patterns::first_account_id(name).is_none() {
                        account.name = Some(name.to_string());
                    }
                }
            }
        }

        if account.region.is_none() {
            account.region = self.current_region(&tab);
        }
        account
    }

    /// Region from the URL, falling back to the regions menu button
    fn current_region(&self, tab: &Arc<Tab>) -> Option<String> {
        let url = tab.get_url();
        if let Some(caps) = REGION_IN_URL.captures(&url).or_else(|| REGION_IN_HOST.captures(&url)) {
            return Some(caps[1].to_string());
        }
        let js = r#"
            (function() {
                const btn = document.querySelector('[data-testid="awsc-nav-regions-menu-button"]');
                return btn ? (btn.textContent || '').trim() : '';
            })()
        "#;
        self.session
            .eval_string(tab, js)
            .ok()
            .flatten()
            .and_then(|s| crate::extract::field::presence(&s))
    }

    /// Activate a detail tab in place: test id first, text match fallback,
    /// no-op when already selected. Returns whether the tab was found.
    pub fn activate_tab(&self, tab: &Arc<Tab>, name: &str) -> Result<bool> {
        let needle = name.to_lowercase().replace(['"', '\\'], "");
        let js = format!(
            r#"
            (function() {{
                const byTestId = document.querySelector('[data-testid="{needle}"]');
                const target = byTestId ||
                    Array.from(document.querySelectorAll('button, [role="tab"]'))
                        .find((t) => (t.textContent || '').toLowerCase().includes('{needle}'));
                if (!target) return false;
                if (target.getAttribute('aria-selected') !== 'true') {{
                    target.click();
                }}
                return true;
            }})()
            "#
        );
        let found = self.session.eval_bool(tab, &js)?;
        if found {
            std::thread::sleep(self.settle.tab_switch);
        }
        Ok(found)
    }

    /// Instance ids from the EC2 list page
    pub fn list_ec2_instances(&self) -> Result<Vec<String>> {
        log::info!("Navigating to the EC2 console");
        self.session.navigate(&ec2_list_url(self.region.as_deref()))?;
        self.session.wait_for_navigation()?;
        std::thread::sleep(self.settle.page);

        let doc = self.session.snapshot()?;
        let ids = ec2_ids_from(&doc);
        log::info!("Found {} EC2 instances", ids.len());
        Ok(ids)
    }

    /// Instance names from the Lightsail list page
    pub fn list_lightsail_instances(&self) -> Result<Vec<String>> {
        log::info!("Navigating to the Lightsail console");
        self.session.navigate(&lightsail_list_url(self.region.as_deref()))?;
        self.session.wait_for_navigation()?;
        std::thread::sleep(self.settle.page);

        let doc = self.session.snapshot()?;
        let names = lightsail_names_from(&doc);
        log::info!("Found {} Lightsail instances", names.len());
        Ok(names)
    }

    /// Scrape every tab of one EC2 instance detail page
    pub fn scrape_ec2_instance(
        &self,
        instance_id: &str,
        account: &AccountInfo,
    ) -> Result<InstanceRecord> {
        self.session
            .navigate(&ec2_detail_url(self.region.as_deref(), instance_id))?;
        self.session.wait_for_navigation()?;
        std::thread::sleep(self.settle.page);

        let mut tabs = Ec2Tabs::default();
        let session_tab = self.session.tab()?;

        // The Details tab is the landing view
        tabs.details = self.tab_snapshot("details").map(|d| ec2::extract_details(&d))
            .unwrap_or_default();

        if self.switch_to(&session_tab, "security") {
            tabs.security = self.tab_snapshot("security").map(|d| ec2::extract_security(&d))
                .unwrap_or_default();
        }
        if self.switch_to(&session_tab, "networking") {
            tabs.networking = self.tab_snapshot("networking").map(|d| ec2::extract_networking(&d))
                .unwrap_or_default();
        }
        if self.switch_to(&session_tab, "storage") {
            tabs.storage = self.tab_snapshot("storage").map(|d| ec2::extract_storage(&d))
                .unwrap_or_default();
        }
        if self.switch_to(&session_tab, "tags") {
            tabs.tags = self.tab_snapshot("tags").map(|d| extract::extract_tags(&d))
                .unwrap_or_default();
        }

        // Fall back to the page identity when the label extraction missed
        if tabs.details.instance_id.is_none() {
            tabs.details.instance_id = Some(instance_id.to_string());
        }

        aggregate::build_ec2_record(tabs, account)
    }

    /// Scrape every tab of one Lightsail instance, navigating per tab
    pub fn scrape_lightsail_instance(
        &self,
        name: &str,
        account: &AccountInfo,
    ) -> Result<InstanceRecord> {
        let region = self
            .region
            .clone()
            .or_else(|| account.region.clone())
            .unwrap_or_else(|| "us-east-1".to_string());

        let mut tabs = LightsailTabs::default();

        self.goto_lightsail_tab(&region, name, "connect")?;
        tabs.connect = self.tab_snapshot("connect").map(|d| lightsail::extract_connect(&d))
            .unwrap_or_default();

        if self.goto_lightsail_tab(&region, name, "storage").is_ok() {
            tabs.storage = self.tab_snapshot("storage").map(|d| lightsail::extract_storage(&d))
                .unwrap_or_default();
        }
        if self.goto_lightsail_tab(&region, name, "networking").is_ok() {
            tabs.networking = self
                .tab_snapshot("networking")
                .map(|d| lightsail::extract_networking(&d))
                .unwrap_or_default();
        }
        if self.goto_lightsail_tab(&region, name, "domains").is_ok() {
            tabs.domains = self.tab_snapshot("domains").map(|d| lightsail::extract_domains(&d))
                .unwrap_or_default();
        }
        if self.goto_lightsail_tab(&region, name, "tags").is_ok() {
            tabs.tags = self.tab_snapshot("tags").map(|d| extract::extract_tags(&d))
                .unwrap_or_default();
        }

        if tabs.connect.name.is_none() {
            tabs.connect.name = Some(name.to_string());
        }

        aggregate::build_lightsail_record(tabs, account)
    }

    fn goto_lightsail_tab(&self, region: &str, name: &str, tab: &str) -> Result<()> {
        self.session.navigate(&lightsail_tab_url(region, name, tab))?;
        self.session.wait_for_navigation()?;
        std::thread::sleep(self.settle.tab_switch);
        Ok(())
    }

    /// Activate a tab, logging instead of failing when it is missing
    fn switch_to(&self, session_tab: &Arc<Tab>, name: &str) -> bool {
        match self.activate_tab(session_tab, name) {
            Ok(true) => true,
            Ok(false) => {
                log::warn!("Tab '{name}' not found on this page");
                false
            }
            Err(e) => {
                log::warn!("Could not activate tab '{name}': {e}");
                false
            }
        }
    }

    /// Snapshot the page for one tab, logging failures
    fn tab_snapshot(&self, name: &str) -> Option<Document> {
        match self.session.snapshot() {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("Snapshot of '{name}' tab failed: {e}");
                None
            }
        }
    }

    /// Harvest every instance the filter selects. Individual failures
    /// become stub entries so the run always produces a document.
    pub fn harvest(&self, filter: ServiceFilter) -> Result<HarvestResults> {
        let account = self.account_info();
        let region = self.region.clone().or_else(|| account.region.clone());
        let mut results = HarvestResults::new(region.as_deref());

        if filter.includes_ec2() {
            let ids = self.list_ec2_instances()?;
            for (i, id) in ids.iter().enumerate() {
                log::info!("Extracting {} ({}/{})", id, i + 1, ids.len());
                match self.scrape_ec2_instance(id, &account) {
                    Ok(record) => results.ec2.push(record.into()),
                    Err(e) => {
                        log::error!("Failed to extract {id}: {e}");
                        results.ec2.push(ScrapeOutcome::Failure {
                            instance_id: id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        if filter.includes_lightsail() {
            let names = self.list_lightsail_instances()?;
            for (i, name) in names.iter().enumerate() {
                log::info!("Extracting {} ({}/{})", name, i + 1, names.len());
                match self.scrape_lightsail_instance(name, &account) {
                    Ok(record) => results.lightsail.push(record.into()),
                    Err(e) => {
                        log::error!("Failed to extract {name}: {e}");
                        results.lightsail.push(ScrapeOutcome::Failure {
                            instance_id: name.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(results)
    }
}
