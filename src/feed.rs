//! "Recent searches" live feed.
//!
//! Polls the recent-searches endpoint and re-renders the list into its own
//! surface. Failures never escape: the list degrades to a short message and
//! the next tick tries again.

use crate::page::ProfilePage;
use crate::render::escape_html;
use crate::surface::Surface;
use crate::{OverlayConfig, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long ago a search happened, as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimeAgo {
    Structured { key: String, value: Option<i64> },
    /// Older servers send a preformatted string
    Legacy(String),
}

impl TimeAgo {
    /// Bucket the age of `timestamp` the way the server does.
    pub fn since(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (now - timestamp).num_seconds();
        let (key, value) = if secs < 60 {
            ("just_now", None)
        } else if secs < 3600 {
            ("minutes_ago", Some(secs / 60))
        } else if secs < 86_400 {
            ("hours_ago", Some(secs / 3600))
        } else {
            ("days_ago", Some(secs / 86_400))
        };
        TimeAgo::Structured {
            key: key.to_string(),
            value,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimeAgo::Legacy(s) => s.clone(),
            TimeAgo::Structured { key, value } => {
                let unit = match key.as_str() {
                    "just_now" => return "just now".to_string(),
                    "minutes_ago" => "minutes ago",
                    "hours_ago" => "hours ago",
                    "days_ago" => "days ago",
                    other => other,
                };
                match value {
                    Some(v) => format!("{} {}", v, unit),
                    None => unit.to_string(),
                }
            }
        }
    }
}

fn default_true() -> bool {
    true
}

fn lenient_id<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// One entry of the feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecentSearch {
    #[serde(default, deserialize_with = "lenient_id")]
    pub steam_id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub has_bans: bool,
    /// ISO-8601, with or without an offset (naive times are UTC)
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub time_ago: Option<TimeAgo>,
}

impl RecentSearch {
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc())
            })
            .ok()
    }

    /// The server's label, or one computed from the timestamp.
    pub fn time_label(&self, now: DateTime<Utc>) -> String {
        match (&self.time_ago, self.parsed_timestamp()) {
            (Some(t), _) => t.label(),
            (None, Some(ts)) => TimeAgo::since(ts, now).label(),
            (None, None) => String::new(),
        }
    }

    /// Profile URL used when the entry is clicked.
    pub fn profile_url(&self) -> String {
        ProfilePage::url_for_steam_id(&self.steam_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecentSearches {
    #[serde(default)]
    pub searches: Vec<RecentSearch>,
}

/// Backend for the feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_recent(&self) -> Result<RecentSearches>;
}

#[cfg(feature = "http")]
#[async_trait]
impl FeedSource for crate::source::HttpStatsSource {
    async fn fetch_recent(&self) -> Result<RecentSearches> {
        let req = self
            .client()
            .get(self.recent_searches_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout());
        let resp = self
            .with_headers(req)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::Error::Status {
                status: status.as_u16(),
                detail: None,
            });
        }
        let body = resp.bytes().await.map_err(|e| self.request_error(e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

pub const NO_SEARCHES: &str = "No searches yet";
pub const LOADING_ERROR: &str = "Loading error";

/// Render the feed list.
pub fn render_entries(entries: &[RecentSearch], asset_base_url: &str, now: DateTime<Utc>) -> String {
    let base = asset_base_url.trim_end_matches('/');
    if entries.is_empty() {
        return format!(r#"<div class="no-searches">{}</div>"#, NO_SEARCHES);
    }

    let mut html = String::new();
    for e in entries {
        let nickname = escape_html(e.nickname.as_deref().unwrap_or("-"));

        let avatar = match e.avatar.as_deref().filter(|a| !a.is_empty()) {
            Some(src) => format!(
                r#"<img src="{}" alt="{}" class="recent-search-avatar">"#,
                escape_html(src),
                nickname
            ),
            None => r#"<div class="recent-search-avatar-placeholder"></div>"#.to_string(),
        };

        let level = if e.has_bans {
            format!(
                r#"<div class="recent-search-level banned" title="Player has active bans"><img src="{}/invalid.svg" alt="Banned"></div>"#,
                base
            )
        } else if let Some(l) = e.level.filter(|l| *l > 0) {
            format!(
                r#"<div class="recent-search-level" title="Level {0}"><img src="{1}/lvl{0}.svg" alt="Level {0}"></div>"#,
                l, base
            )
        } else {
            String::new()
        };

        let flag = e
            .country
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| {
                format!(
                    r#"<img src="{}/flags/{}.svg" alt="{}" class="recent-search-flag">"#,
                    base,
                    escape_html(&c.to_lowercase()),
                    escape_html(c)
                )
            })
            .unwrap_or_default();

        html.push_str(&format!(
            concat!(
                r#"<div class="recent-search-item" data-steam-id="{}" data-profile-url="{}">"#,
                r#"<div class="recent-search-info">"#,
                r#"<div class="recent-search-status {}"></div>"#,
                "{}",
                r#"<div class="recent-search-player-info">"#,
                r#"<div class="recent-search-nickname" title="{}">{}</div>"#,
                "{}{}",
                "</div></div>",
                r#"<div class="recent-search-time">{}</div>"#,
                "</div>"
            ),
            escape_html(&e.steam_id),
            escape_html(&e.profile_url()),
            if e.success { "success" } else { "failed" },
            avatar,
            nickname,
            nickname,
            level,
            flag,
            escape_html(&e.time_label(now))
        ));
    }
    html
}

/// Polls the feed endpoint and keeps a surface up to date.
pub struct RecentFeed {
    source: Arc<dyn FeedSource>,
    surface: Arc<dyn Surface>,
    asset_base_url: String,
    interval: Duration,
}

impl RecentFeed {
    pub fn new(config: &OverlayConfig, source: Arc<dyn FeedSource>, surface: Arc<dyn Surface>) -> Self {
        Self {
            source,
            surface,
            asset_base_url: config.asset_base_url.clone(),
            interval: Duration::from_millis(config.feed_interval_ms),
        }
    }

    /// Fetch and render once. Returns the number of entries shown, or `None`
    /// when the fetch failed and the error message was rendered instead.
    pub async fn refresh(&self) -> Option<usize> {
        match self.source.fetch_recent().await {
            Ok(list) => {
                debug!("recent searches: {} entries", list.searches.len());
                self.surface
                    .mount(&render_entries(&list.searches, &self.asset_base_url, Utc::now()));
                Some(list.searches.len())
            }
            Err(e) => {
                warn!("Error loading recent searches: {}", e);
                self.surface
                    .mount(&format!(r#"<div class="no-searches">{}</div>"#, LOADING_ERROR));
                None
            }
        }
    }

    /// Refresh immediately and then on every interval until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("recent searches feed stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ago = |secs: i64| TimeAgo::since(now - chrono::Duration::seconds(secs), now).label();
        assert_eq!(ago(30), "just now");
        assert_eq!(ago(125), "2 minutes ago");
        assert_eq!(ago(3 * 3600 + 5), "3 hours ago");
        assert_eq!(ago(2 * 86_400 + 10), "2 days ago");
    }

    #[test]
    fn decodes_structured_and_legacy_time_ago() {
        let list: RecentSearches = serde_json::from_str(
            r#"{"searches":[
                {"steam_id":"76561197960287930","nickname":"a","time_ago":{"key":"hours_ago","value":5}},
                {"steam_id":76561197960287931,"nickname":"b","time_ago":"yesterday","success":false}
            ]}"#,
        )
        .unwrap();
        let now = Utc::now();
        assert_eq!(list.searches[0].time_label(now), "5 hours ago");
        assert_eq!(list.searches[1].time_label(now), "yesterday");
        assert_eq!(list.searches[1].steam_id, "76561197960287931");
        assert!(!list.searches[1].success);
    }

    #[test]
    fn label_falls_back_to_naive_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let e: RecentSearch = serde_json::from_str(
            r#"{"steam_id":"1","timestamp":"2024-05-01T11:50:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(e.time_label(now), "10 minutes ago");
    }

    #[test]
    fn empty_list_renders_placeholder() {
        assert!(render_entries(&[], "/static", Utc::now()).contains(NO_SEARCHES));
    }

    #[test]
    fn banned_entry_shows_badge_instead_of_level() {
        let e = RecentSearch {
            steam_id: "76561197960287930".into(),
            nickname: Some("x".into()),
            avatar: None,
            level: Some(8),
            country: Some("SE".into()),
            has_bans: true,
            timestamp: None,
            success: true,
            time_ago: None,
        };
        let html = render_entries(&[e], "/static/", Utc::now());
        assert!(html.contains("invalid.svg"));
        assert!(!html.contains("lvl8.svg"));
        assert!(html.contains("/static/flags/se.svg"));
        assert!(html.contains("https://steamcommunity.com/profiles/76561197960287930"));
    }
}
