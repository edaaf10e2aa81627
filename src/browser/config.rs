//! Browser launch and connection configuration.

use std::path::PathBuf;

/// Options for launching a Chrome/Chromium instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window. Harvesting needs a real login, so
    /// the default is a visible browser.
    pub headless: bool,

    /// Window dimensions
    pub window_width: u32,
    pub window_height: u32,

    /// Path to the Chrome binary (auto-detected when `None`)
    pub chrome_path: Option<PathBuf>,

    /// User data directory, for reusing an existing console session
    pub user_data_dir: Option<PathBuf>,

    /// Chrome sandbox
    pub sandbox: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1600,
            window_height: 1000,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
        }
    }
}

impl LaunchOptions {
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// Options for attaching to an already-running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL, e.g. `ws://127.0.0.1:9222/devtools/browser/…`
    pub ws_url: String,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_window_visible() {
        let options = LaunchOptions::default();
        assert!(!options.headless);
        assert!(options.sandbox);
    }

    #[test]
    fn test_builder_chain() {
        let options = LaunchOptions::default()
            .headless(true)
            .window_size(1280, 800)
            .user_data_dir("/tmp/profile");
        assert!(options.headless);
        assert_eq!(options.window_width, 1280);
        assert_eq!(options.user_data_dir, Some(PathBuf::from("/tmp/profile")));
    }
}
