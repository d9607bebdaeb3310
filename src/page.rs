//! Steam profile page detection.

use url::Url;

/// Sub-pages of a profile where the overlay must stay out of the way.
pub const EXCLUDED_SECTIONS: &[&str] = &[
    "tradeoffers",
    "inventory",
    "friends",
    "groups",
    "screenshots",
    "videos",
    "artwork",
    "workshop",
    "myworkshopfiles",
    "filedetails",
    "edit",
    "settings",
    "badges",
    "gamecards",
    "tradingcards",
    "allcomments",
];

const STEAM_COMMUNITY_HOST: &str = "steamcommunity.com";

/// How the profile is addressed in its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    /// `/id/<vanity>`
    Vanity(String),
    /// `/profiles/<steamid64>`
    SteamId(String),
}

/// A Steam community profile page the overlay can attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePage {
    pub url: String,
    pub kind: ProfileKind,
}

impl ProfilePage {
    /// Detect a profile page, rejecting non-profile URLs and excluded
    /// sub-pages such as `/inventory`.
    pub fn detect(page_url: &str) -> Option<Self> {
        let parsed = Url::parse(page_url).ok()?;
        let host = parsed.host_str()?;
        if host != STEAM_COMMUNITY_HOST && !host.ends_with(".steamcommunity.com") {
            return None;
        }

        let segments: Vec<&str> = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .collect();

        if segments
            .iter()
            .skip(2)
            .any(|s| EXCLUDED_SECTIONS.contains(&s.to_ascii_lowercase().as_str()))
        {
            return None;
        }

        let kind = match segments.as_slice() {
            ["id", vanity, ..] => ProfileKind::Vanity((*vanity).to_string()),
            ["profiles", id, ..] if is_steam_id64(id) => ProfileKind::SteamId((*id).to_string()),
            _ => return None,
        };

        Some(Self {
            url: page_url.to_string(),
            kind,
        })
    }

    /// Canonical profile URL for a 64-bit Steam id.
    pub fn url_for_steam_id(steam_id: &str) -> String {
        format!("https://{}/profiles/{}", STEAM_COMMUNITY_HOST, steam_id)
    }
}

/// A standalone SteamID64 is exactly 17 ASCII digits.
pub fn is_steam_id64(candidate: &str) -> bool {
    candidate.len() == 17 && candidate.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_vanity_and_numeric_profiles() {
        let p = ProfilePage::detect("https://steamcommunity.com/id/gabelogannewell/").unwrap();
        assert_eq!(p.kind, ProfileKind::Vanity("gabelogannewell".into()));

        let p = ProfilePage::detect("https://steamcommunity.com/profiles/76561197960287930").unwrap();
        assert_eq!(p.kind, ProfileKind::SteamId("76561197960287930".into()));
    }

    #[test]
    fn rejects_excluded_sections() {
        for section in EXCLUDED_SECTIONS {
            let url = format!("https://steamcommunity.com/id/someone/{}/", section);
            assert!(ProfilePage::detect(&url).is_none(), "{} should be excluded", url);
        }
    }

    #[test]
    fn vanity_named_like_a_section_is_still_a_profile() {
        assert!(ProfilePage::detect("https://steamcommunity.com/id/friends").is_some());
    }

    #[test]
    fn rejects_other_hosts_and_paths() {
        assert!(ProfilePage::detect("https://store.steampowered.com/app/730").is_none());
        assert!(ProfilePage::detect("https://steamcommunity.com/market/").is_none());
        assert!(ProfilePage::detect("not a url").is_none());
        assert!(ProfilePage::detect("https://steamcommunity.com/profiles/notanid").is_none());
    }

    #[test]
    fn steam_id64_shape() {
        assert!(is_steam_id64("76561197960287930"));
        assert!(!is_steam_id64("7656119796028793"));
        assert!(!is_steam_id64("7656119796028793x"));
        assert_eq!(
            ProfilePage::url_for_steam_id("76561197960287930"),
            "https://steamcommunity.com/profiles/76561197960287930"
        );
    }
}
