use serde::{Deserialize, Serialize};

/// Coarse browser family; the only part of a user agent that is retained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
    Opera,
    Other,
}

impl BrowserFamily {
    /// Reduces a raw user-agent header to its browser family.
    ///
    /// Order matters: Edge and Opera advertise "Chrome", Chrome advertises
    /// "Safari".
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("Edg/") || user_agent.contains("Edge/") {
            Self::Edge
        } else if user_agent.contains("OPR/") || user_agent.contains("Opera") {
            Self::Opera
        } else if user_agent.contains("Firefox/") || user_agent.contains("FxiOS/") {
            Self::Firefox
        } else if user_agent.contains("Chrome/") || user_agent.contains("CriOS/") {
            Self::Chrome
        } else if user_agent.contains("Safari/") {
            Self::Safari
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
            Self::Firefox => "firefox",
            Self::Safari => "safari",
            Self::Opera => "opera",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_families() {
        let cases = [
            (
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                BrowserFamily::Chrome,
            ),
            (
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
                BrowserFamily::Edge,
            ),
            (
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
                BrowserFamily::Safari,
            ),
            (
                "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0",
                BrowserFamily::Firefox,
            ),
            (
                "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36 OPR/105.0",
                BrowserFamily::Opera,
            ),
            ("curl/8.4.0", BrowserFamily::Other),
        ];

        for (ua, expected) in cases {
            assert_eq!(BrowserFamily::from_user_agent(ua), expected, "ua: {}", ua);
        }
    }
}
