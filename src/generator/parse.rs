//! Splitting model output back into post sections.
//!
//! The model is asked for `[HOOK]`, `[VALUE]`, `[CTA]` and `[HASHTAGS]`
//! blocks. Models do not always comply, so any missing section falls back to
//! paragraph-based splitting of the untagged text.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// LinkedIn's hard limit is 3000; posts are cut to leave a little room.
pub const MAX_POST_CHARS: usize = 3000;
pub const TRUNCATED_POST_CHARS: usize = 2990;
pub const MAX_HASHTAGS: usize = 3;

static HOOK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[HOOK\]").expect("valid regex"));
static HOOK: Lazy<Regex> = Lazy::new(|| section_regex("HOOK"));
static VALUE: Lazy<Regex> = Lazy::new(|| section_regex("VALUE"));
static CTA: Lazy<Regex> = Lazy::new(|| section_regex("CTA"));
static HASHTAGS: Lazy<Regex> = Lazy::new(|| section_regex("HASHTAGS"));
static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("valid regex"));

fn section_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"(?is)\[{tag}\](.*?)\[/{tag}\]")).expect("valid regex")
}

/// Hook, value and call-to-action of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSections {
    pub hook: String,
    pub value: String,
    pub cta: String,
}

/// Drop anything the model wrote before its first `[HOOK]` tag.
pub fn strip_filler_before_hook(response: &str) -> &str {
    match HOOK_OPEN.find(response) {
        Some(m) => &response[m.start()..],
        None => response,
    }
}

fn tagged(text: &str, re: &Regex) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Split a response into sections, tags first, paragraphs as fallback.
pub fn parse_response(response: &str) -> PostSections {
    if response.trim().is_empty() {
        return PostSections::default();
    }
    let text = strip_filler_before_hook(response);

    let hook = tagged(text, &HOOK);
    let value = tagged(text, &VALUE);
    let cta = tagged(text, &CTA);

    if let (Some(hook), Some(value), Some(cta)) = (&hook, &value, &cta) {
        return PostSections {
            hook: hook.clone(),
            value: value.clone(),
            cta: cta.clone(),
        };
    }

    let missing: Vec<&str> = [("HOOK", &hook), ("VALUE", &value), ("CTA", &cta)]
        .iter()
        .filter(|(_, s)| s.is_none())
        .map(|(name, _)| *name)
        .collect();
    warn!(missing = ?missing, "Missing tags in response; falling back to paragraphs");

    let fallback = parse_paragraphs(text);
    PostSections {
        hook: hook.unwrap_or(fallback.hook),
        value: value.unwrap_or(fallback.value),
        cta: cta.unwrap_or(fallback.cta),
    }
}

/// Paragraph split: first paragraph is the hook, last the CTA, the rest the
/// value. Trailing hashtag lines are ignored.
pub fn parse_paragraphs(response: &str) -> PostSections {
    let text = response.trim();
    if text.is_empty() {
        return PostSections::default();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut content_lines: Vec<&str> = Vec::new();
    let mut in_hashtags = false;
    for line in lines.iter().rev() {
        let stripped = line.trim();
        let is_tag_line = !stripped.is_empty()
            && (stripped.starts_with('#') || (in_hashtags && all_hashtags(stripped)));
        if is_tag_line {
            in_hashtags = true;
        } else {
            in_hashtags = false;
            content_lines.push(line);
        }
    }
    content_lines.reverse();
    let content = content_lines.join("\n");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in content.trim().split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    match paragraphs.len() {
        0 => PostSections::default(),
        1 => PostSections {
            value: paragraphs.remove(0),
            ..Default::default()
        },
        2 => PostSections {
            hook: paragraphs[0].clone(),
            value: paragraphs[1].clone(),
            cta: String::new(),
        },
        n => PostSections {
            hook: paragraphs[0].clone(),
            value: paragraphs[1..n - 1].join("\n\n"),
            cta: paragraphs[n - 1].clone(),
        },
    }
}

fn all_hashtags(line: &str) -> bool {
    line.split_whitespace().all(|w| w.starts_with('#'))
}

/// At most three hashtags (with `#`), from the `[HASHTAGS]` block if present,
/// otherwise the first distinct ones anywhere in the text.
pub fn extract_hashtags(response: &str) -> Vec<String> {
    if let Some(block) = tagged(response, &HASHTAGS) {
        return HASHTAG
            .find_iter(&block)
            .map(|m| m.as_str().to_string())
            .take(MAX_HASHTAGS)
            .collect();
    }

    let mut unique: Vec<String> = Vec::new();
    for m in HASHTAG.find_iter(response) {
        let tag = m.as_str().to_string();
        if !unique.contains(&tag) {
            unique.push(tag);
        }
        if unique.len() == MAX_HASHTAGS {
            break;
        }
    }
    unique
}

/// Assemble the publishable post text.
pub fn compose_post(sections: &PostSections, hashtags: &[String]) -> String {
    let mut parts: Vec<&str> = [&sections.hook, &sections.value, &sections.cta]
        .into_iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let tags = hashtags.join(" ");
    if !tags.is_empty() {
        parts.push(&tags);
    }
    parts.join("\n\n")
}

/// Cut a post of [`MAX_POST_CHARS`] or more down to [`TRUNCATED_POST_CHARS`],
/// keeping whole lines from the top and re-appending the hashtags.
pub fn truncate_post(text: &str, hashtags: &[String]) -> String {
    if text.chars().count() < MAX_POST_CHARS {
        return text.to_string();
    }

    let tag_text = hashtags.join(" ");
    let tag_space = if tag_text.is_empty() {
        0
    } else {
        tag_text.chars().count() + 2
    };
    let content_space = TRUNCATED_POST_CHARS.saturating_sub(tag_space);

    let mut kept: Vec<String> = Vec::new();
    let mut used = 0usize;
    for line in text.split('\n') {
        let stripped = line.trim();
        if !stripped.is_empty() && all_hashtags(stripped) {
            continue;
        }
        let len = line.chars().count() + 1;
        if used + len <= content_space {
            kept.push(line.to_string());
            used += len;
        } else {
            if kept.is_empty() {
                let remaining = content_space.saturating_sub(3);
                kept.push(line.chars().take(remaining).collect::<String>() + "...");
            }
            break;
        }
    }

    let mut result = kept.join("\n").trim().to_string();
    if !tag_text.is_empty() {
        result.push_str("\n\n");
        result.push_str(&tag_text);
    }
    result
}
