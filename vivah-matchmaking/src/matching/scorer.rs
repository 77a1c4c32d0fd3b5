use chrono::{DateTime, Utc};

use crate::models::{PartnerPreferences, UserProfile};

/// Credit for a soft affinity that is not matched, or has no preference stated.
const NEUTRAL: f64 = 0.5;
/// Credit for a soft affinity whose value is in the preferred set.
const FULL: f64 = 1.0;

/// Step thresholds (hours since last login) for the recency term.
const RECENCY_STEPS: [(i64, f64); 4] = [(24, 1.0), (72, 0.8), (168, 0.6), (336, 0.4)];
const RECENCY_FLOOR: f64 = 0.2;

/// Logins within this many hours earn the "Recently active" reason.
const RECENTLY_ACTIVE_HOURS: i64 = 168;

pub const REASON_COMMUNITY: &str = "Same community";
pub const REASON_PROFESSION: &str = "Preferred profession";
pub const REASON_LOCATION: &str = "Preferred location";
pub const REASON_RECENT: &str = "Recently active";
pub const REASON_FALLBACK: &str = "Compatible profile";

/// Non-negative coefficients for the four score terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub community: f64,
    pub profession: f64,
    pub location: f64,
    pub recency: f64,
}

impl ScoringWeights {
    /// Negative or NaN weights are treated as 0.
    pub fn new(community: f64, profession: f64, location: f64, recency: f64) -> Self {
        let sane = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        Self {
            community: sane(community),
            profession: sane(profession),
            location: sane(location),
            recency: sane(recency),
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// Scores candidates against a user's partner preferences. Pure: no I/O, no
/// randomness; `now` is passed in so repeated calls agree.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoringWeights,
    now: DateTime<Utc>,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, now: DateTime<Utc>) -> Self {
        Self { weights, now }
    }

    pub fn score(&self, candidate: &UserProfile, prefs: Option<&PartnerPreferences>) -> f64 {
        let recency = recency_score(self.hours_since_login(candidate)) * self.weights.recency;

        let Some(prefs) = prefs else {
            return recency;
        };

        let community = affinity(&candidate.community, &prefs.preferred_communities);
        let profession = affinity(&candidate.profession, &prefs.preferred_professions);
        let location = affinity(&candidate.home_district, &prefs.preferred_home_districts);

        community * self.weights.community
            + profession * self.weights.profession
            + location * self.weights.location
            + recency
    }

    /// Human-readable explanation of why a candidate was suggested.
    /// Never used for ordering.
    pub fn reasons(&self, candidate: &UserProfile, prefs: Option<&PartnerPreferences>) -> Vec<String> {
        let mut reasons = Vec::new();

        if let Some(prefs) = prefs {
            if matches_preferred(&candidate.community, &prefs.preferred_communities) {
                reasons.push(REASON_COMMUNITY.to_string());
            }
            if matches_preferred(&candidate.profession, &prefs.preferred_professions) {
                reasons.push(REASON_PROFESSION.to_string());
            }
            if matches_preferred(&candidate.home_district, &prefs.preferred_home_districts) {
                reasons.push(REASON_LOCATION.to_string());
            }
        }

        if self.hours_since_login(candidate) < RECENTLY_ACTIVE_HOURS {
            reasons.push(REASON_RECENT.to_string());
        }

        if reasons.is_empty() {
            reasons.push(REASON_FALLBACK.to_string());
        }
        reasons
    }

    fn hours_since_login(&self, candidate: &UserProfile) -> i64 {
        (self.now - candidate.last_login).num_hours()
    }
}

/// 1.0 on an explicit match, 0.5 otherwise. An empty preferred set and a
/// non-matching value score the same.
fn affinity(value: &Option<String>, preferred: &[String]) -> f64 {
    if matches_preferred(value, preferred) {
        FULL
    } else {
        NEUTRAL
    }
}

fn matches_preferred(value: &Option<String>, preferred: &[String]) -> bool {
    match value {
        Some(v) => preferred.iter().any(|p| p == v),
        None => false,
    }
}

pub fn recency_score(hours_since_login: i64) -> f64 {
    RECENCY_STEPS
        .iter()
        .find(|(limit, _)| hours_since_login < *limit)
        .map_or(RECENCY_FLOOR, |(_, score)| *score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::profile as candidate;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn recency_steps() {
        assert_eq!(recency_score(0), 1.0);
        assert_eq!(recency_score(23), 1.0);
        assert_eq!(recency_score(24), 0.8);
        assert_eq!(recency_score(71), 0.8);
        assert_eq!(recency_score(72), 0.6);
        assert_eq!(recency_score(167), 0.6);
        assert_eq!(recency_score(168), 0.4);
        assert_eq!(recency_score(335), 0.4);
        assert_eq!(recency_score(336), 0.2);
        assert_eq!(recency_score(10_000), 0.2);
    }

    #[test]
    fn future_login_counts_as_fresh() {
        assert_eq!(recency_score(-5), 1.0);
    }

    #[test]
    fn without_preferences_only_recency_counts() {
        let now = Utc::now();
        let weights = ScoringWeights::new(5.0, 5.0, 5.0, 2.0);
        let scorer = Scorer::new(weights, now);

        let mut a = candidate(now, 30);
        let score_a = scorer.score(&a, None);
        a.community = Some("ezhava".into());
        a.profession = None;
        a.home_district = Some("kollam".into());
        let score_b = scorer.score(&a, None);

        assert!(close(score_a, 0.8 * 2.0));
        assert!(close(score_a, score_b));
    }

    #[test]
    fn matched_terms_earn_full_weight() {
        let now = Utc::now();
        let weights = ScoringWeights::new(2.0, 3.0, 4.0, 1.0);
        let scorer = Scorer::new(weights, now);
        let prefs = PartnerPreferences {
            preferred_communities: vec!["nair".into()],
            preferred_professions: vec!["doctor".into(), "engineer".into()],
            preferred_home_districts: vec!["ernakulam".into()],
            ..Default::default()
        };

        let score = scorer.score(&candidate(now, 1), Some(&prefs));
        assert!(close(score, 2.0 + 3.0 + 4.0 + 1.0));
    }

    #[test]
    fn mismatch_and_no_preference_are_both_neutral() {
        let now = Utc::now();
        let weights = ScoringWeights::new(2.0, 1.0, 1.0, 1.0);
        let scorer = Scorer::new(weights, now);
        let mismatch = PartnerPreferences {
            preferred_communities: vec!["menon".into()],
            ..Default::default()
        };
        let indifferent = PartnerPreferences::default();

        let c = candidate(now, 1);
        assert!(close(scorer.score(&c, Some(&mismatch)), scorer.score(&c, Some(&indifferent))));
        assert!(close(scorer.score(&c, Some(&mismatch)), 0.5 * 2.0 + 0.5 + 0.5 + 1.0));
    }

    #[test]
    fn missing_candidate_value_is_neutral() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        let prefs = PartnerPreferences {
            preferred_communities: vec!["nair".into()],
            ..Default::default()
        };
        let mut c = candidate(now, 400);
        c.community = None;
        assert!(close(scorer.score(&c, Some(&prefs)), 0.5 + 0.5 + 0.5 + 0.2));
    }

    #[test]
    fn worked_example_sums_weighted_terms() {
        let now = Utc::now();
        let weights = ScoringWeights::new(2.0, 1.0, 1.0, 1.0);
        let scorer = Scorer::new(weights, now);
        let prefs = PartnerPreferences {
            preferred_communities: vec!["X".into()],
            ..Default::default()
        };
        let mut p = candidate(now, 1);
        p.community = Some("X".into());

        // 1.0 * 2 + 0.5 * 1 + 0.5 * 1 + 1.0 * 1
        assert!(close(scorer.score(&p, Some(&prefs)), 4.0));
    }

    #[test]
    fn reasons_list_matches_and_activity() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        let prefs = PartnerPreferences {
            preferred_communities: vec!["nair".into()],
            preferred_home_districts: vec!["ernakulam".into()],
            ..Default::default()
        };

        let reasons = scorer.reasons(&candidate(now, 2), Some(&prefs));
        assert_eq!(reasons, vec![REASON_COMMUNITY, REASON_LOCATION, REASON_RECENT]);
    }

    #[test]
    fn reasons_fall_back_when_nothing_matched() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        assert_eq!(scorer.reasons(&candidate(now, 500), None), vec![REASON_FALLBACK]);
    }
}
