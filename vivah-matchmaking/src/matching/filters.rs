use chrono::{Months, NaiveDate};
use uuid::Uuid;

use crate::models::{PartnerPreferences, UserProfile};

/// Hard filters for the candidate source. Anything that fails here is never
/// scored. Soft affinities (community, profession, location) are not checked.
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery<'a> {
    pub requester_user_id: Uuid,
    pub prefs: Option<&'a PartnerPreferences>,
    pub excluded_profile_ids: &'a [i64],
    pub today: NaiveDate,
}

impl<'a> CandidateQuery<'a> {
    pub fn birth_dates(&self) -> BirthDateRange {
        match self.prefs {
            Some(p) => BirthDateRange::from_ages(p.min_age, p.max_age, self.today),
            None => BirthDateRange::default(),
        }
    }

    pub fn admits(&self, candidate: &UserProfile) -> bool {
        if candidate.is_deleted
            || candidate.user_id == self.requester_user_id
            || self.excluded_profile_ids.contains(&candidate.id)
        {
            return false;
        }

        let Some(prefs) = self.prefs else {
            return true;
        };

        self.birth_dates().admits(candidate.date_of_birth)
            && within(candidate.height_cm, prefs.min_height_cm, prefs.max_height_cm)
            && (prefs.accept_physically_challenged || !candidate.is_physically_challenged)
            && in_set(&candidate.marital_status, &prefs.preferred_marital_statuses)
            && in_set(&candidate.education_level, &prefs.preferred_education_levels)
            && in_set(&candidate.profession_type, &prefs.preferred_profession_types)
    }
}

/// Age bounds expressed as date-of-birth bounds, so they can be pushed
/// into a query as plain date comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BirthDateRange {
    /// Set by a minimum age: candidates must be born on or before this date.
    pub born_on_or_before: Option<NaiveDate>,
    /// Set by a maximum age: candidates must be born strictly after this date.
    pub born_after: Option<NaiveDate>,
}

impl BirthDateRange {
    pub fn from_ages(min_age: Option<i32>, max_age: Option<i32>, today: NaiveDate) -> Self {
        let years_before = |years: i32| {
            u32::try_from(years)
                .ok()
                .and_then(|y| y.checked_mul(12))
                .and_then(|m| today.checked_sub_months(Months::new(m)))
        };
        Self {
            born_on_or_before: min_age.and_then(years_before),
            born_after: max_age.and_then(|max| years_before(max.saturating_add(1))),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.born_on_or_before.is_none() && self.born_after.is_none()
    }

    /// An unknown date of birth fails any set bound.
    pub fn admits(&self, dob: Option<NaiveDate>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(dob) = dob else {
            return false;
        };
        self.born_on_or_before.map_or(true, |limit| dob <= limit)
            && self.born_after.map_or(true, |limit| dob > limit)
    }
}

/// An unknown height fails any set bound.
fn within(value: Option<i32>, min: Option<i32>, max: Option<i32>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    match value {
        Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
        None => false,
    }
}

/// An empty preferred set admits everything.
fn in_set(value: &Option<String>, preferred: &[String]) -> bool {
    if preferred.is_empty() {
        return true;
    }
    value.as_ref().is_some_and(|v| preferred.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::profile;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birth_date_range_matches_completed_years() {
        let today = date(2026, 10, 18);
        let range = BirthDateRange::from_ages(Some(25), Some(30), today);

        // Exactly 25 today.
        assert!(range.admits(Some(date(2001, 10, 18))));
        // 25 tomorrow.
        assert!(!range.admits(Some(date(2001, 10, 19))));
        // Turned 30 yesterday.
        assert!(range.admits(Some(date(1996, 10, 17))));
        // 31 today.
        assert!(!range.admits(Some(date(1995, 10, 18))));
        assert!(!range.admits(None));
    }

    #[test]
    fn unbounded_range_admits_unknown_birth_date() {
        let range = BirthDateRange::from_ages(None, None, date(2026, 1, 1));
        assert!(range.admits(None));
    }

    #[test]
    fn excludes_self_deleted_and_acted_upon() {
        let now = Utc::now();
        let requester = profile(now, 0);
        let mut deleted = profile(now, 0);
        deleted.is_deleted = true;
        let mut seen = profile(now, 0);
        seen.id = 99;
        let fresh = profile(now, 0);

        let excluded = [99];
        let query = CandidateQuery {
            requester_user_id: requester.user_id,
            prefs: None,
            excluded_profile_ids: &excluded,
            today: now.date_naive(),
        };

        assert!(!query.admits(&requester));
        assert!(!query.admits(&deleted));
        assert!(!query.admits(&seen));
        assert!(query.admits(&fresh));
    }

    #[test]
    fn applies_height_and_physical_preferences() {
        let now = Utc::now();
        let prefs = PartnerPreferences {
            min_height_cm: Some(160),
            max_height_cm: Some(175),
            accept_physically_challenged: false,
            ..Default::default()
        };
        let query = CandidateQuery {
            requester_user_id: Uuid::new_v4(),
            prefs: Some(&prefs),
            excluded_profile_ids: &[],
            today: now.date_naive(),
        };

        let mut c = profile(now, 0);
        c.height_cm = Some(170);
        assert!(query.admits(&c));
        c.height_cm = Some(180);
        assert!(!query.admits(&c));
        c.height_cm = None;
        assert!(!query.admits(&c));

        c.height_cm = Some(165);
        c.is_physically_challenged = true;
        assert!(!query.admits(&c));
    }

    #[test]
    fn applies_categorical_preferences_only_when_set() {
        let now = Utc::now();
        let prefs = PartnerPreferences {
            preferred_marital_statuses: vec!["never_married".into()],
            preferred_education_levels: vec!["masters".into(), "doctorate".into()],
            accept_physically_challenged: true,
            ..Default::default()
        };
        let query = CandidateQuery {
            requester_user_id: Uuid::new_v4(),
            prefs: Some(&prefs),
            excluded_profile_ids: &[],
            today: now.date_naive(),
        };

        let mut c = profile(now, 0);
        assert!(query.admits(&c));
        c.marital_status = Some("divorced".into());
        assert!(!query.admits(&c));
        c.marital_status = Some("never_married".into());
        c.education_level = None;
        assert!(!query.admits(&c));
        // No profession-type preference stated.
        c.education_level = Some("doctorate".into());
        c.profession_type = None;
        assert!(query.admits(&c));
    }
}
