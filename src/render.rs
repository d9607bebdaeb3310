//! HTML fragments for the profile overlay.
//!
//! Every fragment is a complete replacement for the overlay container; the
//! surface swaps it in wholesale.

use crate::model::{Ban, ProfileResponse};
use crate::Error;
use chrono::NaiveDate;

/// Class of the box that wraps every overlay fragment.
pub const STATS_BOX_CLASS: &str = "facex_stats_box";
/// Class of the row that only a rendered result carries.
pub const STATS_ROW_CLASS: &str = "facex_stats";

/// Escape text for inclusion in element content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Placeholder for a missing value.
pub(crate) const MISSING: &str = "-";

fn or_missing<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

// `0` is treated like a missing value on the overlay.
fn nonzero_f64(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0)
}

fn percent(v: Option<f64>) -> String {
    match nonzero_f64(v) {
        Some(v) => format!("{}%", v),
        None => MISSING.to_string(),
    }
}

/// Reformat a `dd.mm.yyyy` ban end date as `dd Month yyyy`. Unparsable input
/// is returned unchanged.
pub fn format_ban_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%d.%m.%Y") {
        Ok(d) => d.format("%d %B %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// One-line description of a ban, e.g. `cheating (until 05 May 2025)`.
pub fn ban_summary(ban: &Ban) -> String {
    let reason = ban.reason.as_deref().unwrap_or("Unknown");
    match ban.formatted_end.as_deref().filter(|s| !s.is_empty()) {
        Some(end) => format!("{} (until {})", reason, format_ban_date(end)),
        None => format!("{} (permanent)", reason),
    }
}

/// Builds overlay fragments against a static asset host.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    asset_base_url: String,
}

impl OverlayRenderer {
    pub fn new(asset_base_url: impl Into<String>) -> Self {
        let mut asset_base_url = asset_base_url.into();
        while asset_base_url.ends_with('/') {
            asset_base_url.pop();
        }
        Self { asset_base_url }
    }

    fn frame(&self, inner: &str) -> String {
        format!(
            concat!(
                r#"<div class="profile_customization">"#,
                r#"<div class="profile_customization_header">Faceit Stats</div>"#,
                r#"<div class="profile_customization_block">"#,
                r#"<div class="{}">{}</div>"#,
                r#"</div></div>"#
            ),
            STATS_BOX_CLASS, inner
        )
    }

    fn message(&self, class: &str, text: &str) -> String {
        self.frame(&format!(
            r#"<span class="{}">{}</span>"#,
            class,
            escape_html(text)
        ))
    }

    pub fn level_icon_url(&self, level: Option<i64>) -> String {
        match level {
            Some(l) => format!("{}/lvl{}.svg", self.asset_base_url, l),
            None => format!("{}/unranked.svg", self.asset_base_url),
        }
    }

    pub fn flag_url(&self, country: &str) -> String {
        format!(
            "{}/flags/{}.svg",
            self.asset_base_url,
            escape_html(&country.to_ascii_lowercase())
        )
    }

    /// Shown while the first request is outstanding.
    pub fn preloader(&self) -> String {
        self.message("facex_loading", "Loading...")
    }

    /// Inline message for a user-visible failure.
    pub fn error(&self, err: &Error) -> String {
        self.message("facex_error", err.user_message())
    }

    /// Result fragment: the ranked card when a level is present, otherwise
    /// the unranked card.
    pub fn profile(&self, profile: &ProfileResponse) -> String {
        if profile.is_ranked() {
            self.ranked(profile)
        } else {
            self.unranked(Some(profile))
        }
    }

    fn stats_row(&self, profile: Option<&ProfileResponse>, ranked: bool) -> String {
        let stats = profile.and_then(|p| p.stats.as_ref()).filter(|_| ranked);
        let elo = profile
            .and_then(|p| p.faceit.as_ref())
            .and_then(|f| f.elo)
            .filter(|_| ranked);

        let cells = [
            ("HS%", percent(stats.and_then(|s| s.headshot_percent))),
            ("K/D", or_missing(nonzero_f64(stats.and_then(|s| s.kd_ratio)))),
            ("ELO", or_missing(elo)),
            (
                "Matches",
                or_missing(stats.and_then(|s| s.matches).filter(|m| *m != 0)),
            ),
            ("Winrate", percent(stats.and_then(|s| s.win_rate_percent))),
            (
                "AVG Kills (last 30)",
                or_missing(nonzero_f64(stats.and_then(|s| s.last_30_matches_avg_kills))),
            ),
        ];

        let mut row = format!(r#"<div class="{}">"#, STATS_ROW_CLASS);
        for (label, value) in cells {
            row.push_str(&format!(
                r#"<div class="facex_stat"><b>{}:</b> <span class="facex_value">{}</span></div>"#,
                label,
                escape_html(&value)
            ));
        }
        row.push_str("</div>");
        row
    }

    fn ranked(&self, profile: &ProfileResponse) -> String {
        let level = profile.level();
        let nickname = escape_html(profile.nickname.as_deref().unwrap_or(MISSING));
        let url = profile
            .faceit
            .as_ref()
            .and_then(|f| f.url.as_deref())
            .unwrap_or("#");

        let mut inner = String::from(r#"<div class="facex_header">"#);
        inner.push_str(&format!(
            r#"<img class="levelbox" src="{}" alt="Level {}" data-level="{}">"#,
            self.level_icon_url(level),
            or_missing(level),
            or_missing(level)
        ));
        if let Some(country) = profile.country.as_deref().filter(|c| !c.is_empty()) {
            inner.push_str(&format!(
                r#"<img class="facex_country" title="{0}" src="{1}" alt="{0} flag">"#,
                escape_html(country),
                self.flag_url(country)
            ));
        }
        inner.push_str(&format!(
            r#"<a href="{}" target="_blank"><span class="facex_nickname">{}</span></a>"#,
            escape_html(url),
            nickname
        ));
        inner.push_str("</div>");
        inner.push_str(&self.stats_row(Some(profile), true));

        if let Some(ban) = profile.bans.first() {
            inner.push_str(&format!(
                r#"<div class="facex_ban"><b>Banned:</b> {}</div>"#,
                escape_html(&ban_summary(ban))
            ));
        }

        self.frame(&inner)
    }

    /// The "no record" card. `profile` carries whatever identity the API
    /// still returned; a 404 has none.
    pub fn unranked(&self, profile: Option<&ProfileResponse>) -> String {
        let nickname = profile
            .and_then(|p| p.nickname.as_deref())
            .unwrap_or(MISSING);

        let mut inner = String::from(r#"<div class="facex_header">"#);
        inner.push_str(&format!(
            r#"<img class="levelbox" src="{}" alt="Level unrated">"#,
            self.level_icon_url(None)
        ));
        inner.push_str(&format!(
            r#"<span class="facex_nickname">{}</span>"#,
            escape_html(nickname)
        ));
        inner.push_str("</div>");
        inner.push_str(&self.stats_row(profile, false));
        inner.push_str(r#"<div class="facex_unranked"><b>unrated</b></div>"#);

        self.frame(&inner)
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(crate::OverlayConfig::default().asset_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked() -> ProfileResponse {
        serde_json::from_str(
            r#"{"nickname":"<b>x</b>","country":"DE",
                "faceit":{"level":9,"elo":1950,"url":"https://faceit.com/p"},
                "stats":{"matches":120,"win_rate_percent":51,"headshot_percent":44.2,"kd_ratio":1.08,"last_30_matches_avg_kills":17.9}}"#,
        )
        .unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn ban_dates_are_spelled_out() {
        assert_eq!(format_ban_date("05.03.2025"), "05 March 2025");
        assert_eq!(format_ban_date("soon"), "soon");
        let ban = Ban {
            reason: Some("cheating".into()),
            formatted_end: None,
            ..Default::default()
        };
        assert_eq!(ban_summary(&ban), "cheating (permanent)");
    }

    #[test]
    fn ranked_card_contains_level_and_elo() {
        let html = OverlayRenderer::new("https://cdn.example/static/").profile(&ranked());
        assert!(html.contains("https://cdn.example/static/lvl9.svg"));
        assert!(html.contains(">1950<"));
        assert!(html.contains("44.2%"));
        assert!(html.contains("flags/de.svg"));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("unrated"));
    }

    #[test]
    fn unranked_card_hides_stats() {
        let mut p = ranked();
        p.faceit = None;
        let html = OverlayRenderer::default().profile(&p);
        assert!(html.contains("unranked.svg"));
        assert!(html.contains("unrated"));
        assert!(!html.contains("1950"));
        assert!(!html.contains("44.2"));
    }

    #[test]
    fn error_card_uses_user_message() {
        let html = OverlayRenderer::default().error(&Error::Timeout(30000));
        assert!(html.contains("Request timeout. Please try again."));
        assert!(!html.contains(STATS_ROW_CLASS));
    }
}
