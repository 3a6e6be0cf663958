//! Web search by scraping a public results page
//!
//! No API keys: the results page is fetched like a browser would and the
//! title/snippet pairs are pulled out with regexes. Search engines change
//! their markup and throttle scrapers, so every failure degrades to an empty
//! result instead of an error.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(p|div|br|h[1-6]|li|tr)[^>]*>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

static DIV_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<div\b[^>]*\bclass="([^"]*)"[^>]*>"#).expect("valid regex"));
static DIV_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?div\b[^>]*>").expect("valid regex"));
static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h3\b[^>]*>(.*?)</h3>").expect("valid regex"));
static DDG_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^[^>]*>(.*?)</a>").expect("valid regex"));
static DDG_SNIPPET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#).expect("valid regex"));

/// Convert HTML to plain text (basic implementation)
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");

    // Replace common block elements with newlines
    let text = BLOCK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");

    let text = MULTI_NEWLINE.replace_all(&text, "\n\n");
    let text = MULTI_SPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Plain text squeezed onto one line
fn inline_text(html: &str) -> String {
    html_to_text(html).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Which results page to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Off,
    Google,
    #[serde(alias = "ddg")]
    #[value(name = "duckduckgo", alias = "ddg")]
    DuckDuckGo,
}

impl SearchEngine {
    pub fn name(&self) -> &'static str {
        match self {
            SearchEngine::Off => "off",
            SearchEngine::Google => "google",
            SearchEngine::DuckDuckGo => "duckduckgo",
        }
    }

    pub fn search_url(&self) -> Option<&'static str> {
        match self {
            SearchEngine::Off => None,
            SearchEngine::Google => Some("https://www.google.com/search"),
            SearchEngine::DuckDuckGo => Some("https://html.duckduckgo.com/html/"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, SearchEngine::Off)
    }
}

/// One scraped result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Search that never fails: problems come back as an empty string
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> String;
}

/// Scraper for Google or DuckDuckGo HTML results
pub struct ScrapingSearch {
    engine: SearchEngine,
    base_url: String,
    limit: usize,
    http_client: Client,
}

impl ScrapingSearch {
    /// Returns `None` for `SearchEngine::Off`
    pub fn new(engine: SearchEngine, limit: usize, timeout: Duration) -> Option<Self> {
        let base_url = engine.search_url()?;
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            engine,
            base_url: base_url.to_string(),
            limit,
            http_client,
        })
    }

    /// Point at another results URL (a mirror, or a test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn engine(&self) -> SearchEngine {
        self.engine
    }

    async fn fetch(&self, query: &str) -> anyhow::Result<String> {
        let url = format!("{}?q={}", self.base_url, urlencoding::encode(query));
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned HTTP {}", self.engine.name(), status.as_u16());
        }
        Ok(response.text().await?)
    }

    /// Parse a results page into at most `limit` hits
    pub fn parse(&self, html: &str) -> Vec<SearchHit> {
        let hits = match self.engine {
            SearchEngine::Google => parse_google(html),
            SearchEngine::DuckDuckGo => parse_duckduckgo(html),
            SearchEngine::Off => Vec::new(),
        };
        hits.into_iter().take(self.limit).collect()
    }
}

#[async_trait]
impl WebSearch for ScrapingSearch {
    async fn search(&self, query: &str) -> String {
        debug!("Executing web search: {} via {}", query, self.engine.name());

        match self.fetch(query).await {
            Ok(html) => {
                let hits = self.parse(&html);
                debug!("{} usable results from {}", hits.len(), self.engine.name());
                format_hits(&hits)
            }
            Err(e) => {
                warn!("Error searching {}: {}", self.engine.name(), e);
                String::new()
            }
        }
    }
}

/// `"{title}: {snippet}"` per hit, separated by a blank line
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("{}: {}", h.title, h.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn has_class(classes: &str, wanted: &[&str]) -> bool {
    classes.split_whitespace().any(|c| wanted.contains(&c))
}

/// Result blocks are `div.g`; the title is the block's `h3`, the snippet the
/// first `div.s` (older markup) or `div.VwiC3b` inside it.
fn parse_google(html: &str) -> Vec<SearchHit> {
    let starts: Vec<usize> = DIV_OPEN_RE
        .captures_iter(html)
        .filter(|c| has_class(&c[1], &["g"]))
        .filter_map(|c| c.get(0).map(|m| m.start()))
        .collect();

    let mut hits = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(html.len());
        let block = &html[*start..end];

        let title = H3_RE
            .captures(block)
            .map(|c| inline_text(&c[1]))
            .unwrap_or_default();

        let snippet = DIV_OPEN_RE
            .captures_iter(block)
            .find(|c| has_class(&c[1], &["s", "VwiC3b"]))
            .and_then(|c| c.get(0))
            .map(|m| inline_text(div_inner(&block[m.end()..])))
            .unwrap_or_default();

        if !title.is_empty() && !snippet.is_empty() {
            hits.push(SearchHit { title, snippet });
        }
    }
    hits
}

/// Contents of a div whose opening tag was just consumed, up to its
/// matching close tag. Unclosed markup runs to the end of `rest`.
fn div_inner(rest: &str) -> &str {
    let mut depth = 0usize;
    for tag in DIV_TAG_RE.find_iter(rest) {
        if tag.as_str().starts_with("</") {
            if depth == 0 {
                return &rest[..tag.start()];
            }
            depth -= 1;
        } else {
            depth += 1;
        }
    }
    rest
}

fn parse_duckduckgo(html: &str) -> Vec<SearchHit> {
    html.split("class=\"result__a\"")
        .skip(1)
        .filter_map(|chunk| {
            let title = inline_text(&DDG_TITLE_RE.captures(chunk)?[1]);
            let snippet = inline_text(&DDG_SNIPPET_RE.captures(chunk)?[1]);
            (!title.is_empty() && !snippet.is_empty()).then_some(SearchHit { title, snippet })
        })
        .collect()
}
