//! Wire types for the stats API.
//!
//! Every field is optional: the API omits whatever it could not resolve and
//! older deployments send numbers as strings, so decoding is lenient and the
//! presentation layer decides what a missing value looks like.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of the lookup `POST`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LookupRequest {
    #[serde(rename = "steam_url")]
    pub subject_url: String,
}

impl LookupRequest {
    pub fn new(subject_url: impl Into<String>) -> Self {
        Self {
            subject_url: subject_url.into(),
        }
    }
}

/// A decoded profile lookup.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProfileResponse {
    #[serde(deserialize_with = "lenient_string")]
    pub player_id: Option<String>,
    pub nickname: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub faceit: Option<FaceitRank>,
    pub steam: Option<SteamIdentity>,
    pub stats: Option<PlayerStats>,
    pub games: Option<Games>,
    #[serde(deserialize_with = "null_as_default")]
    pub match_history: Vec<MatchEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub bans: Vec<Ban>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FaceitRank {
    #[serde(deserialize_with = "lenient_i64")]
    pub level: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub elo: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub csgo_elo: Option<i64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SteamIdentity {
    pub nickname: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub id_64: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlayerStats {
    #[serde(deserialize_with = "lenient_i64")]
    pub matches: Option<i64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub win_rate_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub headshot_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub kd_ratio: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub adr: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub last_30_matches_avg_kills: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Games {
    pub cs2: Option<GameEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GameEntry {
    #[serde(deserialize_with = "lenient_i64")]
    pub skill_level: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MatchEntry {
    /// Unix seconds
    #[serde(deserialize_with = "lenient_i64")]
    pub date: Option<i64>,
    pub mode: Option<String>,
    pub result: Option<String>,
    pub score: Option<String>,
    pub map: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub kills: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub deaths: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub assists: Option<i64>,
    pub match_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Ban {
    pub reason: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `dd.mm.yyyy`, absent for permanent bans
    pub formatted_end: Option<String>,
}

impl ProfileResponse {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// FACEIT level when the player is ranked. Level 0 counts as unranked.
    pub fn level(&self) -> Option<i64> {
        self.faceit
            .as_ref()
            .and_then(|f| f.level)
            .filter(|l| *l > 0)
    }

    /// Level for the results page: the FACEIT level, falling back to the CS2
    /// game entry.
    pub fn display_level(&self) -> Option<i64> {
        self.faceit.as_ref().and_then(|f| f.level).or_else(|| {
            self.games
                .as_ref()
                .and_then(|g| g.cs2.as_ref())
                .and_then(|c| c.skill_level)
        })
    }

    pub fn is_ranked(&self) -> bool {
        self.level().is_some()
    }

    pub fn is_banned(&self) -> bool {
        !self.bans.is_empty()
    }

    pub fn matches(&self) -> Option<i64> {
        self.stats.as_ref().and_then(|s| s.matches)
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    })
}

// Steam ids arrive as strings or as (lossy) JSON numbers.
fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_wire_field_name() {
        let body = serde_json::to_value(LookupRequest::new("https://steamcommunity.com/id/x")).unwrap();
        assert_eq!(body["steam_url"], "https://steamcommunity.com/id/x");
        assert!(body.get("subject_url").is_none());
    }

    #[test]
    fn decodes_ranked_payload() {
        let body = br#"{
            "player_id": "abc",
            "nickname": "s1mple",
            "country": "UA",
            "faceit": {"level": 10, "elo": "3120", "url": "https://faceit.com/en/players/s1mple"},
            "stats": {"matches": 1500, "win_rate_percent": "56", "headshot_percent": 38.5,
                      "kd_ratio": 1.31, "last_30_matches_avg_kills": 21.4},
            "bans": null
        }"#;
        let p = ProfileResponse::from_slice(body).unwrap();
        assert_eq!(p.level(), Some(10));
        assert_eq!(p.faceit.as_ref().unwrap().elo, Some(3120));
        assert_eq!(p.stats.as_ref().unwrap().win_rate_percent, Some(56.0));
        assert!(p.is_ranked());
        assert!(!p.is_banned());
        assert!(p.match_history.is_empty());
    }

    #[test]
    fn level_zero_or_missing_is_unranked() {
        let p = ProfileResponse::from_slice(br#"{"nickname":"n","faceit":{"level":0}}"#).unwrap();
        assert!(!p.is_ranked());
        let p = ProfileResponse::from_slice(br#"{"nickname":"n"}"#).unwrap();
        assert!(!p.is_ranked());
    }

    #[test]
    fn display_level_falls_back_to_cs2_entry() {
        let p = ProfileResponse::from_slice(br#"{"games":{"cs2":{"skill_level":"7"}}}"#).unwrap();
        assert_eq!(p.display_level(), Some(7));
        assert_eq!(p.level(), None);
    }

    #[test]
    fn numeric_steam_id_is_stringified() {
        let p = ProfileResponse::from_slice(br#"{"steam":{"id_64": 76561198000000000}}"#).unwrap();
        assert_eq!(
            p.steam.unwrap().id_64.as_deref(),
            Some("76561198000000000")
        );
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = ProfileResponse::from_slice(b"<html>").unwrap_err();
        assert!(matches!(err, crate::Error::DecodeError(_)));
    }
}
