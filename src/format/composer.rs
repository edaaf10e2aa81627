//! Mail composer dispatch.
//!
//! The report opens in the user's preferred mail client via a compose
//! URL. Web clients get their own URL scheme; desktop clients all go
//! through `mailto:`. Browsers reject very long URLs, so an over-budget
//! compose request degrades to "copy body to clipboard, open the composer
//! with the subject only".

use urlencoding::encode;

/// Compose URLs beyond this length get the clipboard fallback
pub const MAX_URL_LENGTH: usize = 7500;

/// Supported mail composers. Desktop clients (Thunderbird, Outlook for
/// Office, Apple Mail, Evolution, KMail) and unknown names all map to
/// [`Composer::Mailto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composer {
    #[default]
    Gmail,
    Outlook,
    Yahoo,
    Protonmail,
    Aol,
    Icloud,
    Mailto,
}

impl Composer {
    /// Parse a persisted composer name. Unknown names fall back to
    /// `mailto:`, which every platform can handle.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gmail" => Composer::Gmail,
            "outlook" => Composer::Outlook,
            "yahoo" => Composer::Yahoo,
            "protonmail" => Composer::Protonmail,
            "aol" => Composer::Aol,
            "icloud" => Composer::Icloud,
            _ => Composer::Mailto,
        }
    }

    /// Compose URL carrying both subject and body
    pub fn compose_url(&self, subject: &str, body: &str) -> String {
        let sub = encode(subject);
        let b = encode(body);
        match self {
            Composer::Gmail => {
                format!("https://mail.google.com/mail/?view=cm&su={sub}&body={b}")
            }
            Composer::Outlook => format!(
                "https://outlook.live.com/mail/0/deeplink/compose?subject={sub}&body={b}"
            ),
            Composer::Yahoo => {
                format!("https://compose.mail.yahoo.com/?subject={sub}&body={b}")
            }
            Composer::Protonmail => {
                format!("https://mail.proton.me/compose?subject={sub}&body={b}")
            }
            Composer::Aol => format!(
                "https://mail.aol.com/webmail-std/en-us/suite#compose?subject={sub}&body={b}"
            ),
            Composer::Icloud => {
                format!("https://www.icloud.com/mail/#compose?subject={sub}&body={b}")
            }
            Composer::Mailto => format!("mailto:?subject={sub}&body={b}"),
        }
    }
}

/// What the caller should do to hand the report to the mail client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    /// URL fits the budget; open it as-is
    Open { url: String },
    /// URL too long: put `clipboard` on the clipboard, then open `url`
    /// (subject only) so the user can paste the body
    CopyAndOpen { url: String, clipboard: String },
}

impl ComposeAction {
    pub fn url(&self) -> &str {
        match self {
            ComposeAction::Open { url } => url,
            ComposeAction::CopyAndOpen { url, .. } => url,
        }
    }
}

/// Build the compose action for a subject/body pair. `full_body`, when
/// given, is what lands on the clipboard in the fallback case; it may be
/// richer than the `body` embedded in the URL.
pub fn plan_compose(
    composer: Composer,
    subject: &str,
    body: &str,
    full_body: Option<&str>,
) -> ComposeAction {
    let url = composer.compose_url(subject, body);
    if url.len() <= MAX_URL_LENGTH {
        return ComposeAction::Open { url };
    }
    let short_url = url
        .split("&body=")
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mailto:?subject={}", encode(subject)));
    ComposeAction::CopyAndOpen {
        url: short_url,
        clipboard: full_body.unwrap_or(body).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown_names() {
        assert_eq!(Composer::parse("gmail"), Composer::Gmail);
        assert_eq!(Composer::parse("ProtonMail"), Composer::Protonmail);
        assert_eq!(Composer::parse("thunderbird"), Composer::Mailto);
        assert_eq!(Composer::parse("apple-mail"), Composer::Mailto);
        assert_eq!(Composer::parse("something-else"), Composer::Mailto);
        assert_eq!(Composer::default(), Composer::Gmail);
    }

    #[test]
    fn test_gmail_url_shape() {
        let url = Composer::Gmail.compose_url("Hi there", "line 1\nline 2");
        assert!(url.starts_with("https://mail.google.com/mail/?view=cm&su=Hi%20there&body="));
        assert!(url.contains("line%201%0Aline%202"));
    }

    #[test]
    fn test_short_body_opens_directly() {
        let action = plan_compose(Composer::Gmail, "subject", "short body", None);
        match action {
            ComposeAction::Open { url } => assert!(url.len() <= MAX_URL_LENGTH),
            other => panic!("expected Open, got {other:?}"),
        }
    }

    #[test]
    fn test_long_body_copies_and_strips_body_param() {
        let body = "x".repeat(MAX_URL_LENGTH);
        let full = "the full report";
        let action = plan_compose(Composer::Gmail, "subject", &body, Some(full));
        match action {
            ComposeAction::CopyAndOpen { url, clipboard } => {
                assert_eq!(url, "https://mail.google.com/mail/?view=cm&su=subject");
                assert_eq!(clipboard, full);
            }
            other => panic!("expected CopyAndOpen, got {other:?}"),
        }
    }

    #[test]
    fn test_mailto_fallback_keeps_subject() {
        let body = "y".repeat(MAX_URL_LENGTH);
        let action = plan_compose(Composer::Mailto, "hello world", &body, None);
        match action {
            ComposeAction::CopyAndOpen { url, clipboard } => {
                assert_eq!(url, "mailto:?subject=hello%20world");
                assert_eq!(clipboard, body);
            }
            other => panic!("expected CopyAndOpen, got {other:?}"),
        }
    }
}
