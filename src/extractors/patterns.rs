//! Ordered pattern rules for pulling identifiers and media URLs out of text.
//!
//! Rule order encodes priority: the most specific pattern comes first and the generic
//! fallback last. Nothing here performs I/O and a miss is reported as `None`, never as an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Substrings at least one of which an accepted media URL must contain
pub const MEDIA_URL_MARKERS: &[&str] = &["douyinvod", "amazonaws", "snssdk", "mp4"];

/// Path fragment of the overlay variant and its clean sibling
pub const WATERMARK_SEGMENT: &str = "playwm";
pub const CLEAN_SEGMENT: &str = "play";

/// Title the site serves on pages that carry no useful title
pub const GENERIC_SITE_TITLE: &str = "抖音";

/// A named regex together with the capture group that holds the value of interest
pub struct PatternRule {
    pub name: &'static str,
    regex: Regex,
    group: usize,
}

impl PatternRule {
    /// Compile a rule. Only called on the static rule tables below.
    fn new(name: &'static str, pattern: &str, group: usize) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule {name}: {e}")),
            group,
        }
    }
}

/// A value captured by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'t> {
    pub rule: &'static str,
    pub value: &'t str,
}

pub static IDENTIFIER_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new("video_path", r"/video/(\d+)", 1),
        PatternRule::new("item_ids_query", r"item_ids=(\d+)", 1),
        PatternRule::new("modal_id_query", r"modal_id=(\d+)", 1),
        PatternRule::new("video_segment", r"video/(\d+)", 1),
        PatternRule::new("long_digit_run", r"(\d{15,})", 1),
    ]
});

pub static MEDIA_URL_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "play_addr_url_list",
            r#""play_addr":\{"uri":"([^"]+)","url_list":\["([^"]+)""#,
            2,
        ),
        PatternRule::new("play_addr_camel", r#""playAddr":"([^"]+)""#, 1),
        PatternRule::new("download_addr_camel", r#""downloadAddr":"([^"]+)""#, 1),
        PatternRule::new("douyinvod_host", r#"https://[^"]*\.douyinvod\.com[^"]*"#, 0),
        PatternRule::new("amazonaws_host", r#"https://[^"]*\.amazonaws\.com[^"]*"#, 0),
        PatternRule::new("mp4_extension", r#"https://[^"]*\.mp4[^"]*"#, 0),
    ]
});

pub static EMBEDDED_JSON_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "render_data",
            r#"(?s)<script id="RENDER_DATA" type="application/json">(.*?)</script>"#,
            1,
        ),
        PatternRule::new(
            "ssr_hydrated_data",
            r"(?s)window\._SSR_HYDRATED_DATA\s*=\s*(\{.*?\})</script>",
            1,
        ),
    ]
});

static TITLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<title>(.*?)</title>").unwrap_or_else(|e| panic!("invalid title rule: {e}"))
});

static SHARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s"'<>，。！]+"#).unwrap_or_else(|e| panic!("invalid share url rule: {e}"))
});

static BARE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{15,}$").unwrap_or_else(|e| panic!("invalid bare identifier rule: {e}"))
});

/// Every capture of every rule, rule by rule, each rule in document order
pub fn all_matches<'a>(text: &'a str, rules: &'a [PatternRule]) -> impl Iterator<Item = RuleMatch<'a>> + 'a {
    rules.iter().flat_map(move |rule| {
        rule.regex
            .captures_iter(text)
            .filter_map(move |caps| caps.get(rule.group))
            .map(move |m| RuleMatch {
                rule: rule.name,
                value: m.as_str(),
            })
    })
}

/// First capture of the first rule that matches at all
pub fn first_match<'a>(text: &'a str, rules: &'a [PatternRule]) -> Option<RuleMatch<'a>> {
    all_matches(text, rules).next()
}

/// First capture, across the pooled matches of all rules, that passes `accept`
pub fn first_accepted<'a, F>(text: &'a str, rules: &'a [PatternRule], accept: F) -> Option<RuleMatch<'a>>
where
    F: Fn(&str) -> bool,
{
    all_matches(text, rules).find(|m| accept(m.value))
}

/// Extract the numeric video identifier from a (resolved) link
pub fn extract_identifier(link: &str) -> Option<RuleMatch<'_>> {
    first_match(link, &IDENTIFIER_RULES)
}

/// Text that is nothing but a video identifier, as pasted without any link
pub fn is_bare_identifier(text: &str) -> bool {
    BARE_IDENTIFIER.is_match(text)
}

/// Find the first media URL in a page body that passes the acceptance predicate
pub fn extract_media_url(body: &str) -> Option<RuleMatch<'_>> {
    first_accepted(body, &MEDIA_URL_RULES, is_accepted_media_url)
}

/// Acceptance predicate shared by page scraping and tree search
pub fn is_accepted_media_url(url: &str) -> bool {
    url.starts_with("http") && MEDIA_URL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Decode HTML entities and the escaped slashes that script blobs carry
pub fn normalize_escapes(raw: &str) -> String {
    html_escape::decode_html_entities(raw)
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\/", "/")
        .replace("\\u0026", "&")
}

pub fn is_watermarked(url: &str) -> bool {
    url.contains(WATERMARK_SEGMENT)
}

/// Rewrite the overlay variant of a media URL to its clean sibling.
///
/// The rewritten URL is not probed; the site is assumed to serve both variants.
pub fn remove_watermark(url: &str) -> String {
    url.replace(WATERMARK_SEGMENT, CLEAN_SEGMENT)
}

/// Page `<title>`, unless it is missing, empty, or just the site name
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_TAG.captures(html)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw);
    let title = decoded.trim();
    // "<title> - 抖音" carries the real title in front of the site name
    let title = title
        .strip_suffix(GENERIC_SITE_TITLE)
        .and_then(|rest| rest.trim_end().strip_suffix('-'))
        .map(str::trim)
        .unwrap_or(title);

    if title.is_empty() || title == GENERIC_SITE_TITLE {
        None
    } else {
        Some(title.to_string())
    }
}

/// Pull the first http(s) URL out of pasted share text
pub fn find_share_url(text: &str) -> Option<&str> {
    SHARE_URL.find(text).map(|m| m.as_str())
}
