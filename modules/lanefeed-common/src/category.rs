//! Keyword classification of post captions into display categories.
//!
//! Rules are checked in order, least to most general; the first matching rule
//! wins and anything without a keyword hit lands in the `FunTimes` catch-all.

use crate::types::PostCategory;

const PARTY_KEYWORDS: &[&str] = &[
    "party",
    "parties",
    "birthday",
    "celebration",
    "celebrate",
    "bachelorette",
    "bachelor party",
];

const LEAGUE_KEYWORDS: &[&str] = &[
    "league",
    "leagues",
    "standings",
    "playoffs",
    "bowler of the week",
];

const EVENT_KEYWORDS: &[&str] = &[
    "event",
    "tournament",
    "fundraiser",
    "live music",
    "trivia night",
    "special",
];

const RULES: &[(PostCategory, &[&str])] = &[
    (PostCategory::Parties, PARTY_KEYWORDS),
    (PostCategory::Leagues, LEAGUE_KEYWORDS),
    (PostCategory::Events, EVENT_KEYWORDS),
];

/// Classify a caption by keyword match. Case-insensitive.
pub fn classify_caption(caption: &str) -> PostCategory {
    let lower = caption.to_lowercase();
    for (category, keywords) in RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *category;
        }
    }
    PostCategory::FunTimes
}
