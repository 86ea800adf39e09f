//! Locates the online member count in a group page.
//!
//! Two strategies run in order. The primary one looks inside the navigation
//! link that points at the online-members view; the fallback scans every
//! typography element for an "Online" label and reads the element right
//! before it. Selectors live in [`ExtractorRules`].

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::ScraperError;

pub const ONLINE_LINK_SELECTOR: &str = r#"a[href*="/members?t=online"]"#;
pub const TYPOGRAPHY_SELECTOR: &str = "div.styled__TypographyWrapper-sc-70zmwu-0";
pub const ONLINE_LABEL: &str = "Online";

static DEFAULT_ONLINE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(ONLINE_LINK_SELECTOR).expect("valid online link selector")
});
static DEFAULT_TYPOGRAPHY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(TYPOGRAPHY_SELECTOR).expect("valid typography selector"));

/// Matching rules for the two extraction strategies.
#[derive(Debug, Clone)]
pub struct ExtractorRules {
    online_link: Selector,
    label_scan: Selector,
    label: String,
}

impl ExtractorRules {
    /// Builds rules from raw CSS selectors and the label text that follows
    /// the count in the fallback scan.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if either selector does not
    /// parse.
    pub fn new(online_link: &str, label_scan: &str, label: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            online_link: parse_selector(online_link)?,
            label_scan: parse_selector(label_scan)?,
            label: label.trim().to_string(),
        })
    }
}

impl Default for ExtractorRules {
    fn default() -> Self {
        Self {
            online_link: DEFAULT_ONLINE_LINK.clone(),
            label_scan: DEFAULT_TYPOGRAPHY.clone(),
            label: ONLINE_LABEL.to_string(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct CountExtractor {
    rules: ExtractorRules,
}

impl CountExtractor {
    #[must_use]
    pub fn new(rules: ExtractorRules) -> Self {
        Self { rules }
    }

    /// Returns the online member count from `body`, or `None` when neither
    /// strategy finds a non-negative integer.
    #[must_use]
    pub fn extract(&self, body: &str) -> Option<u32> {
        let document = Html::parse_document(body);

        if let Some(count) = self.extract_from_online_link(&document) {
            tracing::debug!(count, "count found inside online-members link");
            return Some(count);
        }

        tracing::debug!("online-members link yielded nothing, scanning labels");
        let count = self.extract_from_label_scan(&document);
        if let Some(count) = count {
            tracing::debug!(count, "count found next to online label");
        }
        count
    }

    /// First descendant text node of the first online-members link that is a
    /// plain non-negative integer.
    fn extract_from_online_link(&self, document: &Html) -> Option<u32> {
        let link = document.select(&self.rules.online_link).next()?;
        link.text().find_map(parse_count)
    }

    /// Scans label elements in document order; the first label whose text is
    /// "Online" (any case) with a numeric predecessor wins.
    fn extract_from_label_scan(&self, document: &Html) -> Option<u32> {
        let texts: Vec<String> = document
            .select(&self.rules.label_scan)
            .map(normalized_text)
            .collect();

        texts.windows(2).find_map(|pair| {
            if pair[1].eq_ignore_ascii_case(&self.rules.label) {
                parse_count(&pair[0])
            } else {
                None
            }
        })
    }
}

/// Concatenates an element's text nodes, each trimmed.
fn normalized_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
