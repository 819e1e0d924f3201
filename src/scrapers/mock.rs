//! Canned articles for `--mock` runs.
//!
//! The sample set is dated relative to the run so it always falls inside the
//! recency window. It carries one duplicate by URL (tracking parameters only)
//! and one by title so every pipeline stage has work to do.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{FetchError, SourceFetcher};
use crate::models::RawArticle;

/// Returns a fixed list of articles.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    name: String,
    articles: Vec<RawArticle>,
}

impl MockFetcher {
    pub fn new(name: &str, articles: Vec<RawArticle>) -> Self {
        Self {
            name: name.to_string(),
            articles,
        }
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        Ok(self.articles.iter().take(limit).cloned().collect())
    }
}

fn sample(
    source: &str,
    title: &str,
    url: &str,
    published: DateTime<Utc>,
    author: Option<&str>,
    teaser: &str,
) -> RawArticle {
    RawArticle {
        source: source.to_string(),
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        published_date: Some(published.to_rfc2822()),
        author: author.map(str::to_string),
        teaser: Some(teaser.to_string()),
    }
}

/// One mock fetcher per production source, dated relative to `now`.
pub fn sample_fetchers(now: DateTime<Utc>) -> Vec<Box<dyn SourceFetcher>> {
    let aws = "AWS News Blog";
    let purview = "Microsoft Purview Blog";
    let days = |n: i64| now - Duration::days(n);

    let aws_articles = vec![
        sample(
            aws,
            "IAM Access Analyzer now flags unused permissions across your organization",
            "https://aws.amazon.com/blogs/aws/iam-access-analyzer-unused-permissions/?utm_source=rss&utm_medium=feed",
            days(1),
            Some("Jane Doe"),
            "Today we are launching organization-wide findings for unused roles and access keys. Security teams can enforce least privilege with one policy. The feature is available in all commercial regions.",
        ),
        sample(
            aws,
            "IAM Access Analyzer now flags unused permissions across your organization",
            "https://aws.amazon.com/about-aws/whats-new/2024/01/iam-access-analyzer-unused-permissions/",
            days(1),
            Some("Jane Doe"),
            "Same announcement, cross-posted to What's New.",
        ),
        sample(
            aws,
            "Amazon GuardDuty adds runtime monitoring for container workloads",
            "https://aws.amazon.com/blogs/aws/guardduty-runtime-monitoring-containers/",
            days(3),
            None,
            "GuardDuty now detects threats inside EKS and ECS containers. Findings flow to Security Hub for incident response.",
        ),
        sample(
            aws,
            "AWS Backup introduces logically air-gapped vaults for ransomware recovery",
            "https://aws.amazon.com/blogs/aws/aws-backup-air-gapped-vaults/",
            days(6),
            Some("Sam Roe"),
            "Air-gapped vaults keep immutable copies with encryption and retention locks. Compliance teams get audit-ready reports.",
        ),
        sample(
            aws,
            "Join us at the re:Invent community meetup",
            "https://aws.amazon.com/blogs/aws/reinvent-community-meetup/",
            days(2),
            None,
            "Come meet the team and enjoy some snacks.",
        ),
    ];

    let purview_articles = vec![
        sample(
            purview,
            "Data Loss Prevention policies now cover Microsoft 365 Copilot",
            "https://techcommunity.microsoft.com/blog/microsoft-purview-blog/dlp-copilot/4012345",
            days(2),
            Some("Purview Team"),
            "DLP policies can now block sensitive data from Copilot responses. Sensitivity labels and encryption are honored end to end.",
        ),
        sample(
            purview,
            "DLP policies now cover Microsoft 365 Copilot!",
            "https://techcommunity.microsoft.com/blog/microsoft-purview-blog/dlp-copilot/4012345?utm_source=newsletter&utm_campaign=jan",
            days(2),
            Some("Purview Team"),
            "Newsletter copy of the same announcement.",
        ),
        sample(
            purview,
            "eDiscovery Premium gets faster audit log retention searches",
            "https://techcommunity.microsoft.com/blog/microsoft-purview-blog/ediscovery-audit/4012399",
            days(9),
            None,
            "Audit log searches over long retention periods are now up to five times faster for compliance investigations.",
        ),
        sample(
            purview,
            "Insider Risk Management: new adaptive protection for regulated industries",
            "https://techcommunity.microsoft.com/blog/microsoft-purview-blog/insider-risk-adaptive/4012400",
            days(14),
            Some("Alex Kim"),
            "Adaptive protection tunes DLP enforcement to each user's risk level. Governance teams can review alerts with full context.",
        ),
    ];

    vec![
        Box::new(MockFetcher::new(aws, aws_articles)),
        Box::new(MockFetcher::new(purview, purview_articles)),
    ]
}
