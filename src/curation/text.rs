//! URL and text canonicalization.
//!
//! - [`normalize_url`] strips tracking query parameters so the same post
//!   reached through different campaigns collapses to one canonical URL.
//! - [`normalize_title`] folds case and whitespace into a comparison key.
//! - [`normalize_text`] cleans display text (NFC, collapsed whitespace, trimmed).

use unicode_normalization::UnicodeNormalization;
use url::Url;

/// Query keys removed by [`normalize_url`]. Matched case-insensitively.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "utm_name",
    "utm_reader",
    "utm_brand",
    "utm_social",
    "utm_social-type",
    "fbclid",
    "gclid",
    "gclsrc",
    "dclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "_gl",
    "yclid",
    "igshid",
    "twclid",
    "li_fat_id",
    "trk",
    "trkcampaign",
    "sc_channel",
    "sc_campaign",
    "sc_content",
    "sc_geo",
    "sc_country",
    "sc_outcome",
    "ref_src",
];

/// Returns `true` if `key` is a known tracking parameter.
pub fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
}

/// Strip tracking parameters from a URL.
///
/// Remaining parameters keep their original order and encoding. Any absolute
/// URL comes back in its parsed serialization (lowercased host, `/` for an
/// empty path), so spellings of the same resource agree. Input that does not
/// parse as an absolute URL is returned exactly as given. Idempotent.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("https://example.com/post?utm_source=x&id=5"),
///     "https://example.com/post?id=5"
/// );
/// ```
pub fn normalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url.trim()) else {
        return url.to_string();
    };
    let Some(query) = parsed.query() else {
        return parsed.to_string();
    };

    let segments: Vec<&str> = query.split('&').collect();
    let kept: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|segment| !is_tracking_param(&segment_key(segment)))
        .collect();

    if kept.len() == segments.len() {
        return parsed.to_string();
    }

    let kept: Vec<&str> = kept.into_iter().filter(|s| !s.is_empty()).collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let joined = kept.join("&");
        parsed.set_query(Some(&joined));
    }
    parsed.to_string()
}

/// Decoded key of one `key=value` query segment.
fn segment_key(segment: &str) -> String {
    let raw = segment.split('=').next().unwrap_or_default();
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|k| k.into_owned())
        .unwrap_or(raw)
}

/// Comparison key for titles: lowercase, whitespace runs collapsed, trimmed.
///
/// Never used as display text.
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}

/// Display-text cleanup: NFC, whitespace runs collapsed to one space, trimmed.
pub fn normalize_text(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    collapse_whitespace(&nfc)
}

/// `Some(normalized)` unless the input is absent or blank.
pub fn normalize_optional(text: Option<&str>) -> Option<String> {
    text.map(normalize_text).filter(|t| !t.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
