use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, Tab};

use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::dom::Document;
use crate::error::{HarvestError, Result};

/// CSS class of the share buttons the companion extension injects next to
/// instance names in the console list views
pub const SHARE_BUTTON_CLASS: &str = "aws-share-button-v1";

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A console login can take a while; don't let the session idle out
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }
        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }
        launch_opts.sandbox = options.sandbox;

        let browser =
            Browser::new(launch_opts).map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| HarvestError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url)
            .map_err(|e| HarvestError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking document visibility and focus
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // First pass: check for both visibility and focus (strongest signal)
        for tab in &tabs {
            let result =
                tab.evaluate("document.visibilityState === 'visible' && document.hasFocus()", false);
            match result {
                Ok(remote_object) => {
                    if let Some(value) = remote_object.value {
                        if value.as_bool().unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Failed to check tab status: {}", e);
                    continue;
                }
            }
        }

        // Second pass: visibility only
        for tab in &tabs {
            let result = tab.evaluate("document.visibilityState === 'visible'", false);
            match result {
                Ok(remote_object) => {
                    if let Some(value) = remote_object.value {
                        if value.as_bool().unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                }
                Err(_) => continue,
            }
        }

        Err(HarvestError::TabOperationFailed("No active tab found".to_string()))
    }

    /// The active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Create a new tab
    pub fn new_tab(&self) -> Result<Arc<Tab>> {
        self.browser
            .new_tab()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to create tab: {}", e)))
    }

    /// Navigate to a URL using the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| HarvestError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| HarvestError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Snapshot the active tab's DOM
    pub fn snapshot(&self) -> Result<Document> {
        Document::from_tab(&self.tab()?)
    }

    /// Evaluate JS in a tab expecting a boolean result
    pub fn eval_bool(&self, tab: &Arc<Tab>, expression: &str) -> Result<bool> {
        let result = tab
            .evaluate(expression, false)
            .map_err(|e| HarvestError::EvalFailed(e.to_string()))?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Evaluate JS in a tab expecting a string result
    pub fn eval_string(&self, tab: &Arc<Tab>, expression: &str) -> Result<Option<String>> {
        let result = tab
            .evaluate(expression, false)
            .map_err(|e| HarvestError::EvalFailed(e.to_string()))?;
        Ok(result
            .value
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Evaluate JS in a tab expecting a number result
    pub fn eval_u64(&self, tab: &Arc<Tab>, expression: &str) -> Result<u64> {
        let result = tab
            .evaluate(expression, false)
            .map_err(|e| HarvestError::EvalFailed(e.to_string()))?;
        Ok(result.value.and_then(|v| v.as_u64()).unwrap_or(0))
    }

    /// Count the share buttons the companion extension injected into the
    /// current page
    pub fn share_button_count(&self) -> Result<u64> {
        let tab = self.tab()?;
        let expression = format!(
            "document.querySelectorAll('.{SHARE_BUTTON_CLASS}').length"
        );
        self.eval_u64(&tab, &expression)
    }

    /// Pulse-highlight the injected share buttons for six seconds and
    /// return how many were found
    pub fn highlight_share_buttons(&self) -> Result<u64> {
        let tab = self.tab()?;
        let js = format!(
            r#"
            (function() {{
                const buttons = document.querySelectorAll('.{SHARE_BUTTON_CLASS}');
                buttons.forEach((btn) => {{
                    btn.style.animation = 'pulse 2s infinite';
                    btn.style.border = '2px solid #FFD700';
                }});
                if (!document.getElementById('pulse-animation')) {{
                    const style = document.createElement('style');
                    style.id = 'pulse-animation';
                    style.textContent = `
                        @keyframes pulse {{
                            0% {{ transform: scale(1); }}
                            50% {{ transform: scale(1.05); }}
                            100% {{ transform: scale(1); }}
                        }}
                    `;
                    document.head.appendChild(style);
                }}
                setTimeout(() => {{
                    buttons.forEach((btn) => {{
                        btn.style.animation = '';
                        btn.style.border = '';
                    }});
                }}, 6000);
                return buttons.length;
            }})()
            "#
        );
        self.eval_u64(&tab, &js)
    }

    /// Close the browser by closing every tab; the process exits when the
    /// Browser instance is dropped
    pub fn close(&self) -> Result<()> {
        let tabs = self.get_tabs()?;
        for tab in tabs {
            let _ = tab.close(false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_launch_and_close() {
        let session = BrowserSession::launch(LaunchOptions::default().headless(true)).unwrap();
        assert!(!session.get_tabs().unwrap().is_empty());
        session.close().unwrap();
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_navigate_and_snapshot() {
        let session = BrowserSession::launch(LaunchOptions::default().headless(true)).unwrap();
        session.navigate("about:blank").unwrap();
        session.wait_for_navigation().unwrap();
        let doc = session.snapshot().unwrap();
        assert_eq!(doc.root.tag_name, "body");
        session.close().unwrap();
    }
}
