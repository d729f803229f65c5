//! Data-driven keyword and selector tables.
//!
//! The classification rules and selector heuristics live here as
//! plain data so the classifier can be unit-tested in isolation from
//! the observation mechanism.

use chartwatch_core::AlertKind;

/// One classification rule: any keyword hit assigns the kind.
#[derive(Debug, Clone, Copy)]
pub struct KindRule {
    pub kind: AlertKind,
    pub keywords: &'static [&'static str],
}

/// Ordered classification rules; the first matching rule wins.
/// Keywords are matched case-insensitively against the alert text.
pub const KIND_RULES: &[KindRule] = &[
    KindRule {
        kind: AlertKind::Buy,
        keywords: &["buy", "long", "买入", "做多"],
    },
    KindRule {
        kind: AlertKind::Sell,
        keywords: &["sell", "short", "卖出", "做空"],
    },
    KindRule {
        kind: AlertKind::Alert,
        keywords: &["alert", "trigger", "警报", "提醒", "触发"],
    },
];

/// Keywords that mark an arbitrary DOM fragment as alert-like even
/// when no known selector matched it.
pub const LIKELY_ALERT_KEYWORDS: &[&str] = &[
    "alert",
    "警报",
    "提醒",
    "notification",
    "triggered",
    "触发",
    "buy",
    "sell",
    "买入",
    "卖出",
    "做多",
    "做空",
    "price",
    "价格",
    "target",
    "目标",
    "stop",
    "止损",
    "breakout",
    "突破",
    "support",
    "支撑",
    "resistance",
    "阻力",
];

/// CSS selectors that identify alert-bearing elements on the
/// charting platform. Heuristic and intentionally broad: toast and
/// notification containers plus the platform's own alert widgets.
pub const ALERT_SELECTORS: &[&str] = &[
    // Platform alert widgets
    r#"[data-name="alerts-dialog"]"#,
    r#"[data-name="alerts-popup"]"#,
    r#"[data-name="alert-item"]"#,
    r#"[data-name="notification-popup"]"#,
    // Toast / notification containers
    ".js-toast",
    ".toast-wrapper",
    ".tv-toast",
    ".tv-notification",
    r#"[class*="toast"]"#,
    r#"[class*="notification"]"#,
    r#"[class*="alert"]"#,
    ".notification-popup",
    ".alert-popup",
    // ARIA roles
    r#"[role="alert"]"#,
    r#"[role="notification"]"#,
];

/// Classify alert text into a direction. Case-insensitive scan over
/// [`KIND_RULES`]; the first matching rule wins.
pub fn classify(text: &str) -> AlertKind {
    let lower = text.to_lowercase();
    for rule in KIND_RULES {
        if rule.keywords.iter().any(|k| lower.contains(k)) {
            return rule.kind;
        }
    }
    AlertKind::Unknown
}

/// Whether a fragment's text reads like an alert at all.
pub fn is_likely_alert(text: &str) -> bool {
    let lower = text.to_lowercase();
    LIKELY_ALERT_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_english() {
        assert_eq!(classify("BUY signal triggered"), AlertKind::Buy);
        assert_eq!(classify("Sell now"), AlertKind::Sell);
        assert_eq!(classify("Price alert on BTCUSD"), AlertKind::Alert);
        assert_eq!(classify("nothing interesting"), AlertKind::Unknown);
    }

    #[test]
    fn test_classify_chinese() {
        assert_eq!(classify("做空 XAUUSD 仓位=0.05"), AlertKind::Sell);
        assert_eq!(classify("做多 EURUSD"), AlertKind::Buy);
        assert_eq!(classify("警报: 价格突破"), AlertKind::Alert);
    }

    #[test]
    fn test_first_rule_wins() {
        // Contains both buy and sell keywords; buy is listed first.
        assert_eq!(classify("buy then sell"), AlertKind::Buy);
        // "trigger" alone is Alert even though it also reads like noise.
        assert_eq!(classify("triggered for XAUUSD"), AlertKind::Alert);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("LONG position opened"), AlertKind::Buy);
        assert_eq!(classify("Short squeeze"), AlertKind::Sell);
    }

    #[test]
    fn test_likely_alert() {
        assert!(is_likely_alert("price broke resistance"));
        assert!(is_likely_alert("突破支撑位"));
        assert!(!is_likely_alert("lorem ipsum dolor"));
    }
}
