//! Standalone results page: validation and formatting of a full profile.

use crate::model::{Ban, MatchEntry, ProfileResponse};
use crate::page::ProfilePage;
use crate::render::{escape_html, MISSING};
use crate::{Error, Result};
use chrono::{DateTime, Local};

/// What goes in the level slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelBadge {
    /// Any active ban replaces the level
    Banned,
    Level(i64),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub date: String,
    pub mode: String,
    pub result: String,
    pub result_class: String,
    pub score: String,
    pub map: String,
    pub kda: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRow {
    pub reason: String,
    pub start_date: String,
    pub end_date: String,
}

/// Everything the results page shows, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub nickname: String,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub level: LevelBadge,
    pub cs2_elo: String,
    pub csgo_elo: String,
    pub kd_ratio: String,
    pub avg_kills: String,
    pub win_rate: String,
    pub headshot: String,
    pub adr: String,
    pub total_matches: String,
    pub faceit_url: Option<String>,
    pub steam_url: Option<String>,
    pub matches: Vec<MatchRow>,
    pub bans: Vec<BanRow>,
}

/// `-` for null, `0` for non-positive, the value otherwise.
fn stat(v: Option<f64>, decimals: Option<usize>) -> String {
    match v {
        None => MISSING.to_string(),
        Some(v) if v <= 0.0 => "0".to_string(),
        Some(v) => match decimals {
            Some(d) => format!("{:.*}", d, v),
            None => v.to_string(),
        },
    }
}

fn with_percent(s: String) -> String {
    if s == MISSING {
        s
    } else {
        format!("{}%", s)
    }
}

fn elo(v: Option<i64>, matches: Option<i64>) -> String {
    match v {
        Some(v) => v.to_string(),
        None if matches.unwrap_or(0) > 0 => "Unavailable".to_string(),
        None => MISSING.to_string(),
    }
}

fn format_match_date(unix_secs: Option<i64>) -> String {
    unix_secs
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn match_row(m: &MatchEntry) -> MatchRow {
    let result = m.result.clone().unwrap_or_else(|| "Unknown".to_string());
    let lowered = result.to_lowercase();
    let result_class = if lowered == "lose" { "loss".to_string() } else { lowered };
    let kda = format!(
        "{}/{}/{}",
        m.kills.unwrap_or(0),
        m.deaths.unwrap_or(0),
        m.assists.unwrap_or(0)
    );

    MatchRow {
        date: format_match_date(m.date),
        mode: m.mode.clone().unwrap_or_default(),
        result,
        result_class,
        score: m.score.clone().unwrap_or_default(),
        map: m.map.clone().unwrap_or_default(),
        kda,
        url: m.match_url.clone().filter(|u| !u.is_empty()),
    }
}

fn ban_row(b: &Ban) -> BanRow {
    let end_date = match b.end_date.as_deref() {
        Some("permanent") | None => "never".to_string(),
        Some(d) => d.to_string(),
    };
    BanRow {
        reason: b.reason.clone().unwrap_or_else(|| "Unknown".to_string()),
        start_date: b
            .start_date
            .clone()
            .unwrap_or_else(|| "Unknown date".to_string()),
        end_date,
    }
}

fn check_valid(p: &ProfileResponse) -> Result<()> {
    if p.player_id.is_none() || p.nickname.as_deref().map_or(true, str::is_empty) {
        return Err(Error::InvalidProfile("profile does not exist or was deleted".into()));
    }
    // Absent and null rank fields are treated alike
    let has_rank_data = p.faceit.as_ref().is_some_and(|f| {
        f.elo.is_some() || f.level.is_some() || f.csgo_elo.is_some() || p.matches().unwrap_or(0) > 0
    });
    if !has_rank_data {
        return Err(Error::InvalidProfile("profile has no FACEIT data".into()));
    }
    Ok(())
}

impl ResultsView {
    /// Validate and format a profile for the results page.
    pub fn build(p: &ProfileResponse) -> Result<Self> {
        check_valid(p)?;

        let stats = p.stats.clone().unwrap_or_default();
        let faceit = p.faceit.clone().unwrap_or_default();
        let matches = stats.matches;

        let level = if p.is_banned() {
            LevelBadge::Banned
        } else {
            p.display_level().map(LevelBadge::Level).unwrap_or(LevelBadge::None)
        };

        let steam_url = p.steam.as_ref().and_then(|s| {
            let url = s
                .profile_url
                .clone()
                .or_else(|| s.id_64.as_deref().map(ProfilePage::url_for_steam_id))?;
            s.nickname.as_ref().filter(|n| !n.is_empty()).map(|_| url)
        });

        Ok(Self {
            nickname: p.nickname.clone().unwrap_or_default(),
            country: p.country.clone().filter(|c| !c.is_empty()),
            avatar: p.avatar.clone().filter(|a| !a.is_empty()),
            banner: p.banner.clone().filter(|b| !b.is_empty()),
            level,
            cs2_elo: elo(faceit.elo, matches),
            csgo_elo: elo(faceit.csgo_elo, matches),
            kd_ratio: stat(stats.kd_ratio, Some(2)),
            avg_kills: stat(stats.last_30_matches_avg_kills, None),
            win_rate: with_percent(stat(stats.win_rate_percent, None)),
            headshot: with_percent(stat(stats.headshot_percent, None)),
            adr: stat(stats.adr, Some(2)),
            total_matches: stat(matches.map(|m| m as f64), None),
            faceit_url: faceit.url.filter(|u| !u.is_empty()),
            steam_url,
            matches: p.match_history.iter().map(match_row).collect(),
            bans: p.bans.iter().map(ban_row).collect(),
        })
    }

    /// Render the results page body.
    pub fn render(&self, asset_base_url: &str) -> String {
        let base = asset_base_url.trim_end_matches('/');
        let mut html = String::from(r#"<div class="result">"#);

        html.push_str(r#"<div class="player-header">"#);
        if let Some(banner) = &self.banner {
            html.push_str(&format!(
                r#"<img id="player-banner" src="{}" alt="">"#,
                escape_html(banner)
            ));
        }
        if let Some(avatar) = &self.avatar {
            html.push_str(&format!(
                r#"<img id="player-avatar" src="{}" alt="">"#,
                escape_html(avatar)
            ));
        }
        html.push_str(r#"<div id="player-nickname">"#);
        if let Some(country) = &self.country {
            html.push_str(&format!(
                r#"<img class="flag" src="{}/flags/{}.svg" alt="{}">"#,
                base,
                escape_html(&country.to_lowercase()),
                escape_html(country)
            ));
        }
        html.push_str(&escape_html(&self.nickname));
        html.push_str("</div>");

        match &self.level {
            LevelBadge::Banned => html.push_str(&format!(
                r#"<div id="cs2-level"><img src="{}/invalid.svg" alt="Banned" title="Player has active bans"></div>"#,
                base
            )),
            LevelBadge::Level(l) => {
                html.push_str(&format!(r#"<div id="cs2-level" data-level="{}"></div>"#, l))
            }
            LevelBadge::None => html.push_str(r#"<div id="cs2-level"></div>"#),
        }

        html.push_str(r#"<div id="profile-login">"#);
        if let Some(url) = &self.faceit_url {
            html.push_str(&format!(
                r#"<a href="{}" rel="nofollow noreferrer" target="_blank">Faceit</a>"#,
                escape_html(url)
            ));
        }
        if let Some(url) = &self.steam_url {
            html.push_str(&format!(
                r#"<a href="{}" rel="nofollow noreferrer" target="_blank">Steam</a>"#,
                escape_html(url)
            ));
        }
        html.push_str("</div></div>");

        let section = |title: &str, rows: &[(&str, &str, Option<&str>)]| {
            let mut s = format!(r#"<div class="stats-section"><h5>{}</h5>"#, title);
            for (label, value, id) in rows {
                let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
                s.push_str(&format!(
                    r#"<div class="stats-row"><span class="stats-label">{}</span><span class="stats-value"{}>{}</span></div>"#,
                    label,
                    id_attr,
                    escape_html(value)
                ));
            }
            s.push_str("</div>");
            s
        };

        html.push_str(&section(
            "Main Statistics",
            &[
                ("CS2 ELO", self.cs2_elo.as_str(), Some("cs2-elo")),
                ("CS:GO ELO", self.csgo_elo.as_str(), Some("csgo-elo")),
            ],
        ));
        html.push_str(&section(
            "Additional Statistics",
            &[
                ("K/D Ratio", self.kd_ratio.as_str(), Some("kd-ratio")),
                ("Avg. Kills", self.avg_kills.as_str(), Some("cs2-avg")),
                ("Win Rate", self.win_rate.as_str(), None),
                ("Headshot %", self.headshot.as_str(), None),
                ("ADR", self.adr.as_str(), None),
                ("Total Matches", self.total_matches.as_str(), Some("total-matches")),
            ],
        ));

        html.push_str(r#"<div id="match-list">"#);
        if self.matches.is_empty() {
            html.push_str(r#"<div class="text-center">No matches found</div>"#);
        }
        for m in &self.matches {
            let link = m
                .url
                .as_deref()
                .map(|u| format!(r#" data-href="{}""#, escape_html(u)))
                .unwrap_or_default();
            html.push_str(&format!(
                concat!(
                    r#"<div class="match-item"{}>"#,
                    r#"<div class="match-date">{}</div>"#,
                    r#"<div class="match-mode">{}</div>"#,
                    r#"<div class="match-result {}">{}</div>"#,
                    r#"<div class="match-score">{}</div>"#,
                    r#"<div class="match-map">{}</div>"#,
                    r#"<div class="match-kda">{}</div>"#,
                    "</div>"
                ),
                link,
                escape_html(&m.date),
                escape_html(&m.mode),
                escape_html(&m.result_class),
                escape_html(&m.result),
                escape_html(&m.score),
                escape_html(&m.map),
                escape_html(&m.kda)
            ));
        }
        html.push_str("</div>");

        if !self.bans.is_empty() {
            html.push_str(r#"<div id="bans-section"><div id="bans-list">"#);
            for b in &self.bans {
                html.push_str(&format!(
                    concat!(
                        r#"<div class="ban-item">"#,
                        r#"<div class="ban-reason">{}</div>"#,
                        r#"<div class="ban-dates">{} &ndash; {}</div>"#,
                        "</div>"
                    ),
                    escape_html(&b.reason),
                    escape_html(&b.start_date),
                    escape_html(&b.end_date)
                ));
            }
            html.push_str("</div></div>");
        }

        html.push_str("</div>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(json: &str) -> ProfileResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn rejects_missing_identity() {
        let err = ResultsView::build(&profile(r#"{"nickname":"x","faceit":{"elo":1000}}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn rejects_profile_without_rank_data() {
        let p = profile(r#"{"player_id":"1","nickname":"x","faceit":{},"stats":{"matches":0}}"#);
        assert!(ResultsView::build(&p).is_err());
        let p = profile(
            r#"{"player_id":"1","nickname":"x",
                "faceit":{"elo":null,"level":null,"csgo_elo":null},"stats":{"matches":0}}"#,
        );
        assert!(ResultsView::build(&p).is_err());
        let p = profile(r#"{"player_id":"1","nickname":"x","faceit":{},"stats":{"matches":3}}"#);
        assert!(ResultsView::build(&p).is_ok());
    }

    #[test]
    fn formats_stats_like_the_page() {
        let p = profile(
            r#"{"player_id":"1","nickname":"x",
                "faceit":{"level":4,"elo":null,"csgo_elo":null},
                "stats":{"matches":12,"win_rate_percent":0,"headshot_percent":47,
                         "kd_ratio":1.234,"adr":null,"last_30_matches_avg_kills":-1}}"#,
        );
        let v = ResultsView::build(&p).unwrap();
        assert_eq!(v.cs2_elo, "Unavailable");
        assert_eq!(v.csgo_elo, "Unavailable");
        assert_eq!(v.win_rate, "0%");
        assert_eq!(v.headshot, "47%");
        assert_eq!(v.kd_ratio, "1.23");
        assert_eq!(v.adr, "-");
        assert_eq!(v.avg_kills, "0");
        assert_eq!(v.total_matches, "12");
        assert_eq!(v.level, LevelBadge::Level(4));
    }

    #[test]
    fn bans_replace_level_and_permanent_reads_never() {
        let p = profile(
            r#"{"player_id":"1","nickname":"x","faceit":{"level":10,"elo":2500},
                "bans":[{"reason":"cheating","start_date":"01.01.2024","end_date":"permanent"}]}"#,
        );
        let v = ResultsView::build(&p).unwrap();
        assert_eq!(v.level, LevelBadge::Banned);
        assert_eq!(v.bans[0].end_date, "never");
        assert!(v.render("/static").contains("invalid.svg"));
    }

    #[test]
    fn steam_link_built_from_id_when_url_missing() {
        let p = profile(
            r#"{"player_id":"1","nickname":"x","faceit":{"elo":900},
                "steam":{"nickname":"sx","id_64":"76561197960287930"}}"#,
        );
        let v = ResultsView::build(&p).unwrap();
        assert_eq!(
            v.steam_url.as_deref(),
            Some("https://steamcommunity.com/profiles/76561197960287930")
        );

        let p = profile(
            r#"{"player_id":"1","nickname":"x","faceit":{"elo":900},
                "steam":{"id_64":"76561197960287930"}}"#,
        );
        assert!(ResultsView::build(&p).unwrap().steam_url.is_none());
    }

    #[test]
    fn match_rows_map_lose_to_loss() {
        let p = profile(
            r#"{"player_id":"1","nickname":"x","faceit":{"elo":900},
                "match_history":[{"date":1710504000,"mode":"5v5","result":"Lose","score":"10 / 13",
                                  "map":"de_mirage","kills":15,"deaths":18,"assists":4}]}"#,
        );
        let v = ResultsView::build(&p).unwrap();
        let row = &v.matches[0];
        assert_eq!(row.result_class, "loss");
        assert_eq!(row.kda, "15/18/4");
        let html = v.render("/static/");
        assert!(html.contains("de_mirage"));
        assert!(!html.contains("No matches found"));
    }
}
