//! DOM fragment scanning.
//!
//! Applies the fixed selector heuristics from [`crate::keywords`] to
//! an HTML fragment and yields candidate alert texts. The watcher
//! that feeds fragments in is responsible for stamping what it has
//! already processed; this module is stateless.

use crate::keywords::{is_likely_alert, ALERT_SELECTORS};
use scraper::{Html, Selector};
use tracing::debug;

/// Fragment scanner holding the compiled selector list.
pub struct FragmentScanner {
    selectors: Vec<Selector>,
}

impl Default for FragmentScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentScanner {
    pub fn new() -> Self {
        let selectors = ALERT_SELECTORS
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    debug!(selector = s, error = ?e, "skipping unparsable selector");
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    /// Scan an HTML fragment for candidate alert texts.
    ///
    /// Texts of selector-matched elements are returned in document
    /// order, whitespace-squeezed and deduplicated within the scan.
    /// When no selector matches, the whole fragment's text is
    /// returned as a single candidate if it reads like an alert.
    pub fn scan(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_fragment(html);
        let mut candidates: Vec<String> = Vec::new();

        for selector in &self.selectors {
            for element in doc.select(selector) {
                let text = squeeze_whitespace(element.text());
                if text.chars().count() < 3 {
                    continue;
                }
                if !candidates.contains(&text) {
                    candidates.push(text);
                }
            }
        }

        if candidates.is_empty() {
            let text = squeeze_whitespace(
                doc.root_element().text(),
            );
            if text.chars().count() >= 3 && is_likely_alert(&text) {
                candidates.push(text);
            }
        }

        candidates
    }
}

/// Collapse runs of whitespace into single spaces and trim.
fn squeeze_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for part in parts {
        for word in part.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selector_match() {
        let scanner = FragmentScanner::new();
        let html = r#"<div class="tv-toast">BUY signal triggered for XAUUSD at 2650.50</div>"#;
        let candidates = scanner.scan(html);
        assert_eq!(
            candidates,
            vec!["BUY signal triggered for XAUUSD at 2650.50".to_string()]
        );
    }

    #[test]
    fn test_data_name_selector() {
        let scanner = FragmentScanner::new();
        let html = r#"<div data-name="alert-item"><span>XAUUSD</span> <span>crossing 2650</span></div>"#;
        let candidates = scanner.scan(html);
        assert_eq!(candidates, vec!["XAUUSD crossing 2650".to_string()]);
    }

    #[test]
    fn test_substring_class_selector() {
        let scanner = FragmentScanner::new();
        let html = r#"<div class="chart-notification-bubble">做空 XAUUSD 仓位=0.05</div>"#;
        let candidates = scanner.scan(html);
        assert_eq!(candidates, vec!["做空 XAUUSD 仓位=0.05".to_string()]);
    }

    #[test]
    fn test_unmatched_fragment_keyword_fallback() {
        let scanner = FragmentScanner::new();
        // No selector hit, but the text reads like an alert.
        let html = "<p>price broke resistance on EURUSD</p>";
        let candidates = scanner.scan(html);
        assert_eq!(
            candidates,
            vec!["price broke resistance on EURUSD".to_string()]
        );
    }

    #[test]
    fn test_plain_markup_ignored() {
        let scanner = FragmentScanner::new();
        assert!(scanner.scan("<p>lorem ipsum dolor</p>").is_empty());
        assert!(scanner.scan("<div class=\"tv-toast\">ab</div>").is_empty());
    }

    #[test]
    fn test_duplicate_texts_collapsed() {
        let scanner = FragmentScanner::new();
        // Same element matches both the role and class selectors.
        let html = r#"<div role="alert" class="tv-toast">sell EURUSD</div>"#;
        let candidates = scanner.scan(html);
        assert_eq!(candidates.len(), 1);
    }
}
