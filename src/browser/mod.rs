//! Browser session management over the Chrome DevTools Protocol.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::{BrowserSession, SHARE_BUTTON_CLASS};
