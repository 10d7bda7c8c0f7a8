//! Web page title lookup.

use scraper::{Html, Selector};
use tracing::info;

use crate::error::{ReportError, Result};

/// Returned by [`fetch_title`] when the page has no usable `<title>`.
pub const NO_TITLE: &str = "No title found";

/// Returns the trimmed text of the first `<title>` element, if any.
///
/// ```
/// use u_report::scrape::extract_title;
///
/// let html = "<html><head><title> Example Domain </title></head></html>";
/// assert_eq!(extract_title(html).as_deref(), Some("Example Domain"));
/// assert_eq!(extract_title("<p>no head</p>"), None);
/// ```
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

/// Fetches `url` and returns its title, or [`NO_TITLE`].
///
/// Transport failures and non-2xx statuses are [`ReportError::Http`].
pub async fn fetch_title(url: &str) -> Result<String> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| ReportError::Http(format!("failed to fetch URL: {e}")))?;

    if !response.status().is_success() {
        return Err(ReportError::Http(format!(
            "HTTP error {}: {url}",
            response.status()
        )));
    }

    let html = response
        .text()
        .await
        .map_err(|e| ReportError::Http(format!("failed to read response body: {e}")))?;

    let title = extract_title(&html).unwrap_or_else(|| NO_TITLE.to_string());
    info!(url, title = %title, "page title fetched");
    Ok(title)
}
