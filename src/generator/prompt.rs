//! Prompt construction for LinkedIn post drafting.
//!
//! Posts follow the Hook-Value-CTA framework. The model is asked to wrap each
//! section in `[HOOK]…[/HOOK]` style tags so [`super::parse`] can split them
//! back out.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::warn;

use crate::curation::dates::format_date;
use crate::models::ScoredArticle;

/// System instructions: audience, tone and output rules.
pub const SYSTEM_PROMPT: &str = "You are a LinkedIn content strategist specializing in cloud security and enterprise technology.
Your audience includes CIOs, CISOs, CTOs, and IT Directors in regulated industries
(finance, healthcare, government, professional services).

Write in a professional yet engaging tone. Be concise and actionable.
Focus on security-first messaging paired with practical modernization guidance.

CRITICAL OUTPUT RULES:
- NEVER use conversational filler like \"Here is the post:\", \"Sure!\", \"Certainly!\", or similar preambles
- Begin your output IMMEDIATELY with the [HOOK] tag
- Use the exact tag format specified in the prompt";

/// Themes that switch on the security emphasis block.
pub const SECURITY_TOPICS: &[&str] = &[
    "cloud_security",
    "identity_and_access",
    "governance_and_compliance",
    "data_protection",
    "auditing_and_retention",
    "devsecops",
];

const SECURITY_FRAMING: &str = "SECURITY EMPHASIS:
This article covers security or compliance topics. Ensure the post:
- Leads with security implications and risk considerations
- Emphasizes protection, compliance, and risk mitigation benefits
- Frames modernization through a security-first lens
- Highlights actionable security guidance for IT leaders

";

/// Opening style requested for the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStyle {
    StatisticHeavy,
    Contrarian,
    BoldPrediction,
}

impl HookStyle {
    pub const ALL: [HookStyle; 3] = [
        HookStyle::StatisticHeavy,
        HookStyle::Contrarian,
        HookStyle::BoldPrediction,
    ];

    /// Statistics are rationed to roughly one post in seven.
    pub fn weight(self) -> u32 {
        match self {
            HookStyle::StatisticHeavy => 1,
            HookStyle::Contrarian | HookStyle::BoldPrediction => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HookStyle::StatisticHeavy => "Statistic-heavy",
            HookStyle::Contrarian => "Contrarian",
            HookStyle::BoldPrediction => "Bold Prediction",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            HookStyle::StatisticHeavy => "Lead with a compelling number or data point",
            HookStyle::Contrarian => "Challenge conventional wisdom or common assumptions",
            HookStyle::BoldPrediction => "Make a confident forecast about the future",
        }
    }

    /// Weighted random pick.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> HookStyle {
        Self::ALL
            .choose_weighted(rng, |s| s.weight())
            .copied()
            .unwrap_or(HookStyle::Contrarian)
    }
}

/// Keeps the article context within the model's budget.
///
/// Tokens are estimated at four characters each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextManager {
    pub max_tokens: usize,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self { max_tokens: 10_000 }
    }
}

impl ContextManager {
    pub const CHARS_PER_TOKEN: usize = 4;

    #[cfg(test)]
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / Self::CHARS_PER_TOKEN
    }

    /// Article fields as a `Label: value` block, and whether it had to be cut.
    pub fn prepare_content(&self, article: &ScoredArticle) -> (String, bool) {
        let a = &article.article;
        let mut lines = vec![
            format!("Title: {}", a.title),
            format!("Source: {}", a.source),
        ];
        if let Some(date) = &a.published_date {
            lines.push(format!("Published: {}", format_date(date)));
        }
        if let Some(author) = &a.author {
            lines.push(format!("Author: {author}"));
        }
        lines.push(format!("Summary: {}", article.summary));
        lines.push(format!("Key Topics: {}", join_topics(article)));
        lines.push(format!("Why It Matters: {}", article.why_it_matters));
        lines.push(format!("LinkedIn Angle: {}", article.suggested_angle));

        let content = lines.join("\n");
        let estimated = self.estimate_tokens(&content);
        if estimated <= self.max_tokens {
            return (content, false);
        }

        warn!(
            title = %a.title,
            estimated_tokens = estimated,
            max_tokens = self.max_tokens,
            "Article context exceeds token budget; truncating"
        );
        (self.summarize_for_context(&content, self.max_tokens), true)
    }

    /// Fit `text` into `target_tokens`.
    ///
    /// Title, source, summary and topic lines are kept first; the remaining
    /// lines are added in order while they fit. Anything still too long is
    /// cut with a trailing `...`.
    pub fn summarize_for_context(&self, text: &str, target_tokens: usize) -> String {
        if target_tokens == 0 {
            return String::new();
        }
        let target_chars = target_tokens * Self::CHARS_PER_TOKEN;
        if text.chars().count() <= target_chars {
            return text.to_string();
        }

        const PRIORITY: [&str; 4] = ["Title:", "Source:", "Summary:", "Key Topics:"];
        let (priority, other): (Vec<&str>, Vec<&str>) = text
            .split('\n')
            .partition(|line| PRIORITY.iter().any(|p| line.starts_with(p)));

        let mut result = priority.join("\n");
        for line in other {
            let candidate = if result.is_empty() {
                line.to_string()
            } else {
                format!("{result}\n{line}")
            };
            if candidate.chars().count() > target_chars {
                break;
            }
            result = candidate;
        }

        if result.chars().count() > target_chars {
            let keep = target_chars.saturating_sub(3);
            result = result.chars().take(keep).collect::<String>() + "...";
        }
        result
    }
}

fn join_topics(article: &ScoredArticle) -> String {
    if article.key_topics.is_empty() {
        "General".to_string()
    } else {
        article
            .key_topics
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builds the user prompt for one article.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    pub context: ContextManager,
}

impl PromptBuilder {
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// Prompt for `article` using the given hook style.
    pub fn build(&self, article: &ScoredArticle, style: HookStyle) -> String {
        let (context, _) = self.context.prepare_content(article);
        let hashtags = article
            .suggested_hashtags
            .iter()
            .map(|t| format!("#{}", t.trim_start_matches('#')))
            .collect::<Vec<_>>()
            .join(" ");
        let security_framing = if has_security_topic(article) {
            SECURITY_FRAMING
        } else {
            ""
        };

        format!(
            "Create a LinkedIn post about the following article using the Hook-Value-CTA framework:

ARTICLE INFORMATION:
{context}

FRAMEWORK REQUIREMENTS:

1. HOOK (1-2 sentences): USE THIS HOOK STYLE: {style_label} - {style_description}

   CRITICAL VARIETY RULE: DO NOT use a statistic for more than one out of every four posts. Use a Bold Prediction or a Contrarian opening for the others. Avoid starting with a question.

2. VALUE (3-5 sentences): Provide the core insight:
   - What's the key announcement or update?
   - What's the practical implication for security teams?
   - What action should leaders consider?

3. CTA (1-2 sentences): End with engagement:
   - Ask a question to spark discussion
   - Invite readers to share their experience
   - Suggest a specific next step

FORMAT REQUIREMENTS:
- Use line breaks between sections for readability
- Keep total length under 2800 characters (leave room for hashtags)
- Include EXACTLY 3 hashtags at the end - select the 3 most relevant from: {hashtags}
- Use emojis sparingly (1-2 max) if they add value

{security_framing}OUTPUT FORMAT (MANDATORY):
Wrap each section in explicit tags. Do NOT include any text before [HOOK].

[HOOK]
Your attention-grabbing opening here
[/HOOK]

[VALUE]
Your core insight content here
[/VALUE]

[CTA]
Your call-to-action here
[/CTA]

[HASHTAGS]
#Hashtag1 #Hashtag2 #Hashtag3
[/HASHTAGS]

HASHTAG REQUIREMENT:
Include exactly 3 hashtags from: {hashtags}",
            style_label = style.label(),
            style_description = style.description(),
        )
    }
}

fn has_security_topic(article: &ScoredArticle) -> bool {
    article
        .key_topics
        .iter()
        .any(|t| SECURITY_TOPICS.contains(&t.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedArticle;
    use chrono::Utc;
    use std::collections::{BTreeSet, HashMap};

    fn sample(topics: &[&str]) -> ScoredArticle {
        ScoredArticle {
            article: NormalizedArticle {
                source: "AWS News Blog".to_string(),
                title: "New IAM feature".to_string(),
                canonical_url: "https://aws.amazon.com/blogs/aws/iam".to_string(),
                published_date: None,
                author: Some("Jane Doe".to_string()),
                summary_text: None,
            },
            summary: "IAM gets a new feature.".to_string(),
            key_topics: topics.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            why_it_matters: "It matters.".to_string(),
            suggested_angle: "Discuss it.".to_string(),
            suggested_hashtags: vec!["IAM".to_string(), "ZeroTrust".to_string()],
            score_overall: 70.0,
            score_recency: 70.0,
            score_relevance: 70.0,
            collected_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_contains_article_and_framework() {
        let prompt = PromptBuilder::default().build(&sample(&["identity_and_access"]), HookStyle::Contrarian);
        assert!(prompt.contains("Title: New IAM feature"));
        assert!(prompt.contains("Source: AWS News Blog"));
        assert!(prompt.contains("Author: Jane Doe"));
        assert!(prompt.contains("Key Topics: identity_and_access"));
        assert!(prompt.contains("USE THIS HOOK STYLE: Contrarian"));
        assert!(prompt.contains("#IAM #ZeroTrust"));
        assert!(prompt.contains("SECURITY EMPHASIS"));
        assert!(prompt.contains("[HASHTAGS]"));
    }

    #[test]
    fn test_no_security_block_without_security_topics() {
        let prompt = PromptBuilder::default().build(&sample(&[]), HookStyle::BoldPrediction);
        assert!(!prompt.contains("SECURITY EMPHASIS"));
        assert!(prompt.contains("Key Topics: General"));
        assert!(prompt.contains("Bold Prediction - Make a confident forecast"));
    }

    #[test]
    fn test_system_prompt_names_audience() {
        let system = PromptBuilder::default().system_prompt();
        assert!(system.contains("CISOs"));
        assert!(system.contains("[HOOK]"));
    }

    #[test]
    fn test_hook_style_weights() {
        let mut rng = rand::rng();
        let mut counts: HashMap<HookStyle, usize> = HashMap::new();
        for _ in 0..2000 {
            *counts.entry(HookStyle::pick(&mut rng)).or_default() += 1;
        }
        let stats = counts.get(&HookStyle::StatisticHeavy).copied().unwrap_or(0);
        let contrarian = counts.get(&HookStyle::Contrarian).copied().unwrap_or(0);
        // Expected ~286 vs ~857.
        assert!(stats < contrarian);
        assert!(stats > 0);
    }

    #[test]
    fn test_estimate_tokens() {
        let cm = ContextManager::default();
        assert_eq!(cm.estimate_tokens(""), 0);
        assert_eq!(cm.estimate_tokens("Hello"), 1);
        assert_eq!(cm.estimate_tokens("Hello world!"), 3);
    }

    #[test]
    fn test_prepare_content_within_budget() {
        let (content, truncated) = ContextManager::default().prepare_content(&sample(&["devsecops"]));
        assert!(!truncated);
        assert!(content.starts_with("Title: New IAM feature\nSource: AWS News Blog"));
    }

    #[test]
    fn test_prepare_content_truncates() {
        let mut article = sample(&[]);
        article.summary = "word ".repeat(200);
        let (content, truncated) = ContextManager::new(50).prepare_content(&article);
        assert!(truncated);
        assert!(content.chars().count() <= 200);
        assert!(content.starts_with("Title:"));
        assert!(content.ends_with("..."));
    }

    #[test]
    fn test_summarize_keeps_priority_lines() {
        let cm = ContextManager::default();
        let text = "Author: someone with a long name\nTitle: T\nSource: S\nWhy It Matters: W";
        let out = cm.summarize_for_context(text, 6);
        assert_eq!(out, "Title: T\nSource: S");
        assert_eq!(cm.summarize_for_context("anything", 0), "");
    }
}
