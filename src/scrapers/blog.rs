//! RSS/Atom blog fetcher with an HTML fallback.
//!
//! A [`BlogFetcher`] is driven by a [`BlogProfile`]: where the feed lives,
//! where the HTML index lives, and which CSS selectors pick posts out of the
//! index page. Feed teasers are HTML; they are reduced to plain text and
//! capped at [`MAX_TEASER_CHARS`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{FetchError, SourceFetcher};
use crate::config::FetchSettings;
use crate::models::RawArticle;
use crate::retry::Backoff;

pub const MAX_TEASER_CHARS: usize = 500;
const CLIENT_USER_AGENT: &str = "ContentAgent/1.0 (Blog Scraper)";
const CLIENT_ACCEPT: &str = "application/rss+xml, application/xml, text/html";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Where a blog lives and how to read its HTML index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogProfile {
    pub name: &'static str,
    pub feed_url: &'static str,
    pub html_url: &'static str,
    /// Relative links on the index page are resolved against this.
    pub base_url: &'static str,
    pub post_selector: &'static str,
    pub title_selector: &'static str,
    pub date_selector: &'static str,
    pub author_selector: &'static str,
    pub teaser_selector: &'static str,
}

impl BlogProfile {
    pub fn aws_news_blog() -> Self {
        Self {
            name: "AWS News Blog",
            feed_url: "https://aws.amazon.com/blogs/aws/feed/",
            html_url: "https://aws.amazon.com/blogs/aws/",
            base_url: "https://aws.amazon.com",
            post_selector: "article, .blog-post, .lb-post",
            title_selector: "h2 a, h3 a, .blog-post-title a, a.title",
            date_selector: "time, .date, .post-date, .lb-post-date",
            author_selector: ".author, .post-author, .lb-post-author",
            teaser_selector: "p, .excerpt, .teaser, .lb-post-excerpt",
        }
    }

    pub fn purview_blog() -> Self {
        Self {
            name: "Microsoft Purview Blog",
            feed_url: "https://techcommunity.microsoft.com/plugins/custom/microsoft/o365/custom-blog-rss?tid=-1817042702966616498&board=MicrosoftPurviewBlog&size=50",
            html_url: "https://techcommunity.microsoft.com/category/microsoftpurview/blog/microsoftpurviewblog",
            base_url: "https://techcommunity.microsoft.com",
            post_selector: "article, .blog-post, .message-subject, [data-testid='blog-article'], .lia-message-body-content",
            title_selector: "h2 a, h3 a, .message-subject a, a.page-link, [data-testid='blog-title'] a, .lia-link-navigation",
            date_selector: "time, .date, .post-date, .DateTime, [data-testid='blog-date'], .lia-message-posted-on",
            author_selector: ".author, .post-author, .user-name, [data-testid='blog-author'], .lia-user-name-link",
            teaser_selector: "p, .excerpt, .teaser, .message-body, [data-testid='blog-excerpt'], .lia-message-body",
        }
    }

    /// The two production sources.
    pub fn defaults() -> Vec<Self> {
        vec![Self::aws_news_blog(), Self::purview_blog()]
    }
}

/// Fetches one blog.
#[derive(Debug, Clone)]
pub struct BlogFetcher {
    profile: BlogProfile,
    client: Client,
    request_delay: StdDuration,
    backoff: Backoff,
}

impl BlogFetcher {
    pub fn new(profile: BlogProfile, settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(CLIENT_ACCEPT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            profile,
            client,
            request_delay: StdDuration::from_secs_f64(settings.request_delay_seconds.max(0.0)),
            backoff: Backoff::for_fetch(settings.max_retries),
        })
    }

    /// GET `url` as text, politely delayed and retried.
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.backoff
            .retry(
                url,
                move || async move {
                    sleep(self.request_delay).await;
                    let resp = self.client.get(url).send().await.map_err(|err| FetchError::Http {
                        url: url.to_string(),
                        err,
                    })?;
                    let status = resp.status();
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    resp.text().await.map_err(|err| FetchError::Http {
                        url: url.to_string(),
                        err,
                    })
                },
                FetchError::is_retryable,
            )
            .await
    }

    #[instrument(level = "info", skip_all, fields(source = self.profile.name))]
    async fn fetch_feed(&self, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        let xml = self.get_text(self.profile.feed_url).await?;
        let articles = parse_feed(self.profile.name, &xml, limit)?;
        debug!(count = articles.len(), "Parsed feed");
        Ok(articles)
    }

    #[instrument(level = "info", skip_all, fields(source = self.profile.name))]
    async fn fetch_html(&self, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        let html = self.get_text(self.profile.html_url).await?;
        let articles = parse_index_html(&self.profile, &html, limit)?;
        debug!(count = articles.len(), "Parsed HTML index");
        Ok(articles)
    }
}

#[async_trait]
impl SourceFetcher for BlogFetcher {
    fn source_name(&self) -> &str {
        self.profile.name
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        match self.fetch_feed(limit).await {
            Ok(articles) if !articles.is_empty() => {
                info!(source = self.profile.name, count = articles.len(), "Fetched from feed");
                return Ok(articles);
            }
            Ok(_) => warn!(source = self.profile.name, "Feed empty; falling back to HTML"),
            Err(e) => {
                warn!(source = self.profile.name, error = %e, "Feed failed; falling back to HTML")
            }
        }

        let articles = self.fetch_html(limit).await?;
        if articles.is_empty() {
            return Err(FetchError::Empty);
        }
        info!(source = self.profile.name, count = articles.len(), "Fetched from HTML");
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    /// `dc:date`; elements match by local name.
    date: Option<String>,
    /// `dc:creator`
    creator: Option<String>,
    author: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomPerson>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    name: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an RSS 2.0 or Atom document into at most `limit` articles.
///
/// Entries without a title or link are skipped.
pub fn parse_feed(source: &str, xml: &str, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
    let rss_at = xml.find("<rss");
    let atom_at = xml.find("<feed");
    let is_atom = match (rss_at, atom_at) {
        (Some(r), Some(a)) => a < r,
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (None, None) => return Err(FetchError::Feed("not an RSS or Atom document".to_string())),
    };

    let articles = if is_atom {
        let feed: AtomFeed =
            quick_xml::de::from_str(xml).map_err(|e| FetchError::Feed(e.to_string()))?;
        feed.entries
            .into_iter()
            .filter_map(|e| atom_entry(source, e))
            .take(limit)
            .collect()
    } else {
        let rss: Rss = quick_xml::de::from_str(xml).map_err(|e| FetchError::Feed(e.to_string()))?;
        rss.channel
            .items
            .into_iter()
            .filter_map(|i| rss_item(source, i))
            .take(limit)
            .collect()
    };
    Ok(articles)
}

fn rss_item(source: &str, item: RssItem) -> Option<RawArticle> {
    let title = non_blank(item.title)?;
    let url = non_blank(item.link)?;
    Some(RawArticle {
        source: source.to_string(),
        title: Some(title),
        url: Some(url),
        published_date: non_blank(item.pub_date).or(non_blank(item.date)),
        author: non_blank(item.creator).or(non_blank(item.author)),
        teaser: item.description.as_deref().and_then(html_to_text),
    })
}

fn atom_entry(source: &str, entry: AtomEntry) -> Option<RawArticle> {
    let title = non_blank(entry.title.map(|t| t.text))?;
    let url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
        .or(entry.links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|h| !h.is_empty())?;
    let teaser = entry
        .summary
        .or(entry.content)
        .and_then(|t| html_to_text(&t.text));
    Some(RawArticle {
        source: source.to_string(),
        title: Some(title),
        url: Some(url),
        published_date: non_blank(entry.published).or(non_blank(entry.updated)),
        author: entry.authors.into_iter().find_map(|a| non_blank(a.name)),
        teaser,
    })
}

/// Strip markup from an HTML fragment, collapse whitespace and cap the
/// length. `None` when nothing but markup is left.
pub fn html_to_text(fragment: &str) -> Option<String> {
    let parsed = Html::parse_fragment(fragment);
    let text = element_text(parsed.root_element());
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(MAX_TEASER_CHARS).collect())
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|_| FetchError::Selector(css.to_string()))
}

/// Scrape an index page using the profile's selectors.
pub fn parse_index_html(
    profile: &BlogProfile,
    html: &str,
    limit: usize,
) -> Result<Vec<RawArticle>, FetchError> {
    let base = Url::parse(profile.base_url)?;
    let post_sel = selector(profile.post_selector)?;
    let title_sel = selector(profile.title_selector)?;
    let date_sel = selector(profile.date_selector)?;
    let author_sel = selector(profile.author_selector)?;
    let teaser_sel = selector(profile.teaser_selector)?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();
    for post in document.select(&post_sel).take(limit) {
        let Some(title_el) = post.select(&title_sel).next() else {
            continue;
        };
        let title = element_text(title_el);
        let href = title_el.value().attr("href").unwrap_or("").trim();
        if title.is_empty() || href.is_empty() {
            continue;
        }
        let url = match base.join(href) {
            Ok(u) => u.to_string(),
            Err(e) => {
                debug!(%href, error = %e, "Skipping unresolvable link");
                continue;
            }
        };

        let published_date = post.select(&date_sel).next().and_then(|d| {
            d.value()
                .attr("datetime")
                .map(str::to_string)
                .or_else(|| Some(element_text(d)))
                .filter(|s| !s.is_empty())
        });
        let author = post
            .select(&author_sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
        let teaser = post
            .select(&teaser_sel)
            .next()
            .map(|t| element_text(t).chars().take(MAX_TEASER_CHARS).collect::<String>())
            .filter(|s| !s.is_empty());

        articles.push(RawArticle {
            source: profile.name.to_string(),
            title: Some(title),
            url: Some(url),
            published_date,
            author,
            teaser,
        });
    }
    Ok(articles)
}
