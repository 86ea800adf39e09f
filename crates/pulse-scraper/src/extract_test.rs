use super::*;

const TYPO: &str = "styled__TypographyWrapper-sc-70zmwu-0";

fn typo(text: &str) -> String {
    format!(r#"<div class="{TYPO}">{text}</div>"#)
}

fn page(inner: &str) -> String {
    format!("<html><body>{inner}</body></html>")
}

fn online_link(inner: &str) -> String {
    format!(r#"<a href="/my-group/-/members?t=online">{inner}</a>"#)
}

#[test]
fn primary_reads_count_inside_online_link() {
    let html = page(&online_link(&format!("{}{}", typo("42"), typo("Online"))));
    assert_eq!(CountExtractor::default().extract(&html), Some(42));
}

#[test]
fn primary_takes_first_integer_text_node_in_subtree() {
    let html = page(&online_link(
        r#"<span>Members</span><div><span> 7 </span><span>19</span></div><span>Online</span>"#,
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(7));
}

#[test]
fn primary_accepts_zero() {
    let html = page(&online_link(&format!("{}{}", typo("0"), typo("Online"))));
    assert_eq!(CountExtractor::default().extract(&html), Some(0));
}

#[test]
fn primary_wins_over_fallback() {
    let html = page(&format!(
        "{}{}{}",
        typo("5"),
        typo("Online"),
        online_link(&format!("{}{}", typo("42"), typo("Online")))
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(42));
}

#[test]
fn fallback_used_when_link_has_no_number() {
    let html = page(&format!(
        "{}{}{}",
        online_link(&typo("Online")),
        typo("128"),
        typo("Online")
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(128));
}

#[test]
fn fallback_reads_number_before_label() {
    for count in ["1", "9", "42", "1000", "2147483647", "007"] {
        let html = page(&format!(
            "{}{}{}{}",
            typo("Members"),
            typo("900"),
            typo(count),
            typo("Online")
        ));
        assert_eq!(
            CountExtractor::default().extract(&html),
            Some(count.parse::<u32>().unwrap()),
            "count {count}"
        );
    }
}

#[test]
fn fallback_label_match_is_case_insensitive_and_trimmed() {
    let html = page(&format!("{}{}", typo("12"), typo("  ONLINE ")));
    assert_eq!(CountExtractor::default().extract(&html), Some(12));
}

#[test]
fn fallback_normalizes_nested_text() {
    let html = page(&format!(
        r#"<div class="{TYPO}"><span> 3</span><span>4 </span></div>{}"#,
        typo("<b>On</b><i>line</i>")
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(34));
}

#[test]
fn fallback_takes_first_matching_label_in_document_order() {
    let html = page(&format!(
        "{}{}{}{}",
        typo("11"),
        typo("Online"),
        typo("22"),
        typo("Online")
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(11));
}

#[test]
fn fallback_skips_label_with_non_numeric_predecessor() {
    let html = page(&format!(
        "{}{}{}{}",
        typo("Admins"),
        typo("Online"),
        typo("8"),
        typo("Online")
    ));
    assert_eq!(CountExtractor::default().extract(&html), Some(8));
}

#[test]
fn fallback_ignores_label_as_first_element() {
    let html = page(&typo("Online"));
    assert_eq!(CountExtractor::default().extract(&html), None);
}

#[test]
fn fallback_ignores_elements_without_typography_class() {
    let html = page(r#"<div class="other">42</div><div class="other">Online</div>"#);
    assert_eq!(CountExtractor::default().extract(&html), None);
}

#[test]
fn negative_and_formatted_numbers_are_rejected() {
    for text in ["-3", "1,204", "4.5", "12k", ""] {
        let html = page(&format!("{}{}", typo(text), typo("Online")));
        assert_eq!(
            CountExtractor::default().extract(&html),
            None,
            "text {text:?}"
        );
    }
}

#[test]
fn count_overflowing_u32_is_rejected() {
    let html = page(&format!("{}{}", typo("99999999999"), typo("Online")));
    assert_eq!(CountExtractor::default().extract(&html), None);
}

#[test]
fn empty_or_unrelated_page_yields_none() {
    assert_eq!(CountExtractor::default().extract(""), None);
    assert_eq!(
        CountExtractor::default().extract("<html><body><h1>Log in</h1></body></html>"),
        None
    );
}

#[test]
fn custom_rules_swap_matching_without_touching_callers() {
    let rules = ExtractorRules::new("nav a.online", "span.stat", "Active").unwrap();
    let extractor = CountExtractor::new(rules);

    let html = page(r#"<span class="stat">17</span><span class="stat">active</span>"#);
    assert_eq!(extractor.extract(&html), Some(17));

    let html = page(r#"<nav><a class="online"><em>23</em> Active</a></nav>"#);
    assert_eq!(extractor.extract(&html), Some(23));
}

#[test]
fn invalid_selector_is_rejected() {
    let err = ExtractorRules::new("a[=x]", TYPOGRAPHY_SELECTOR, ONLINE_LABEL).unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidSelector { ref selector, .. } if selector == "a[=x]"),
        "expected InvalidSelector, got: {err:?}"
    );
}

#[test]
fn invalid_label_scan_selector_is_rejected() {
    let err = ExtractorRules::new(ONLINE_LINK_SELECTOR, "??", ONLINE_LABEL).unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidSelector { ref selector, .. } if selector == "??"),
        "expected InvalidSelector, got: {err:?}"
    );
}

#[test]
fn parse_count_requires_plain_digits() {
    assert_eq!(parse_count(" 15 "), Some(15));
    assert_eq!(parse_count("+15"), None);
    assert_eq!(parse_count("١٢"), None);
}
