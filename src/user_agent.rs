//! User-Agent string shared by the listing and payload HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/terorie/artlist-crawler";

/// Default User-Agent for every request (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("artlist-crawler/{version} (+{PROJECT_UA_URL})")
}
