use std::cmp::Ordering;

use crate::models::{PartnerPreferences, UserProfile};

use super::scorer::Scorer;

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub profile: UserProfile,
    pub score: f64,
}

/// Scores every candidate and sorts the full set, best first.
///
/// Order: score descending, then most recent last login, then lowest public
/// profile id. The last key makes the order total, so the same input always
/// yields the same pages.
pub fn rank(
    candidates: Vec<UserProfile>,
    prefs: Option<&PartnerPreferences>,
    scorer: &Scorer,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|profile| RankedCandidate {
            score: scorer.score(&profile, prefs),
            profile,
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

pub fn compare(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.profile.last_login.cmp(&a.profile.last_login))
        .then_with(|| a.profile.id.cmp(&b.profile.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scorer::ScoringWeights;
    use crate::matching::test_support::profile;
    use chrono::{Duration, Utc};

    #[test]
    fn higher_score_sorts_first() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::new(1.0, 0.0, 0.0, 0.0), now);
        let prefs = PartnerPreferences {
            preferred_communities: vec!["iyer".into()],
            ..Default::default()
        };

        let mut match_ = profile(now, 500);
        match_.id = 2;
        match_.community = Some("iyer".into());
        let mut other = profile(now, 1);
        other.id = 1;

        let ranked = rank(vec![other, match_], Some(&prefs), &scorer);
        assert_eq!(ranked[0].profile.id, 2);
        assert_eq!(ranked[1].profile.id, 1);
    }

    #[test]
    fn equal_scores_break_on_recent_login() {
        let now = Utc::now();
        // Recency weight 0 makes every score equal.
        let scorer = Scorer::new(ScoringWeights::new(1.0, 1.0, 1.0, 0.0), now);

        let mut older = profile(now, 10);
        older.id = 1;
        let mut newer = profile(now, 2);
        newer.id = 2;

        let ranked = rank(vec![older, newer], None, &scorer);
        assert_eq!(ranked[0].profile.id, 2);
    }

    #[test]
    fn identical_candidates_break_on_profile_id() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        let login = now - Duration::hours(3);

        let mut list = Vec::new();
        for id in [9, 3, 5] {
            let mut p = profile(now, 0);
            p.id = id;
            p.last_login = login;
            list.push(p);
        }

        let ids: Vec<i64> = rank(list, None, &scorer).iter().map(|r| r.profile.id).collect();
        assert_eq!(ids, vec![3, 5, 9]);
    }

    #[test]
    fn comparator_is_antisymmetric() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        let ranked: Vec<RankedCandidate> = (0..6)
            .map(|i| {
                let mut p = profile(now, (i % 3) * 30);
                p.id = i;
                RankedCandidate {
                    score: scorer.score(&p, None),
                    profile: p,
                }
            })
            .collect();

        for a in &ranked {
            for b in &ranked {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                if a.profile.id != b.profile.id {
                    assert_ne!(compare(a, b), Ordering::Equal);
                }
            }
        }
    }

    #[test]
    fn ranking_is_reproducible_regardless_of_input_order() {
        let now = Utc::now();
        let scorer = Scorer::new(ScoringWeights::default(), now);
        let build = |order: &[i64]| {
            order
                .iter()
                .map(|&id| {
                    let mut p = profile(now, id * 20);
                    p.id = id;
                    p
                })
                .collect::<Vec<_>>()
        };

        let first: Vec<i64> = rank(build(&[1, 2, 3, 4, 5]), None, &scorer)
            .iter()
            .map(|r| r.profile.id)
            .collect();
        let second: Vec<i64> = rank(build(&[5, 3, 1, 4, 2]), None, &scorer)
            .iter()
            .map(|r| r.profile.id)
            .collect();
        assert_eq!(first, second);
    }
}
