use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vivah_shared::errors::{AppError, ErrorCode};

use crate::schema::{match_actions, mutual_matches, partner_preferences, profiles};

// --- UserProfile ---

/// A registered user's profile. Owned by the profile service, read-only here.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub full_name: String,
    pub community: Option<String>,
    pub profession: Option<String>,
    pub profession_type: Option<String>,
    pub education_level: Option<String>,
    pub home_district: Option<String>,
    pub marital_status: Option<String>,
    pub is_physically_challenged: bool,
    pub height_cm: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_picture_url: Option<String>,
    pub last_login: DateTime<Utc>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Age in whole years on `today`, 0 when the date of birth is unknown.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        self.date_of_birth.map_or(0, |dob| age_on(dob, today))
    }
}

pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age.max(0)
}

// --- PartnerPreferences ---

/// Empty preferred-value sets mean "no preference".
#[derive(Debug, Clone, Default, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = partner_preferences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PartnerPreferences {
    pub id: i64,
    pub profile_id: i64,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_height_cm: Option<i32>,
    pub max_height_cm: Option<i32>,
    pub accept_physically_challenged: bool,
    pub preferred_communities: Vec<String>,
    pub preferred_marital_statuses: Vec<String>,
    pub preferred_professions: Vec<String>,
    pub preferred_profession_types: Vec<String>,
    pub preferred_education_levels: Vec<String>,
    pub preferred_home_districts: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

// --- MatchStatus ---

/// A user's current decision about another profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Liked,
    Disliked,
    Passed,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 3] = [MatchStatus::Liked, MatchStatus::Disliked, MatchStatus::Passed];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Liked => "liked",
            MatchStatus::Disliked => "disliked",
            MatchStatus::Passed => "passed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liked" => Ok(MatchStatus::Liked),
            "disliked" => Ok(MatchStatus::Disliked),
            "passed" => Ok(MatchStatus::Passed),
            other => Err(AppError::new(
                ErrorCode::InvalidMatchAction,
                format!("invalid action '{other}', expected one of liked, disliked, passed"),
            )),
        }
    }
}

// --- MatchAction ---

/// Current status of the ordered edge `user_id -> target_user_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAction {
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = match_actions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchActionRow {
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MatchActionRow> for MatchAction {
    type Error = AppError;

    fn try_from(row: MatchActionRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<MatchStatus>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "unknown match status '{}' stored for {} -> {}",
                row.status,
                row.user_id,
                row.target_user_id
            ))
        })?;
        Ok(MatchAction {
            user_id: row.user_id,
            target_user_id: row.target_user_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Timestamps come from the column defaults, i.e. the database clock.
#[derive(Debug, Insertable)]
#[diesel(table_name = match_actions)]
pub struct NewMatchAction<'a> {
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub status: &'a str,
}

// --- MutualMatch ---

/// Canonical, order-independent key for a pair of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub low: Uuid,
    pub high: Uuid,
}

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Self { low, high }
    }

    pub fn other(&self, user_id: Uuid) -> Uuid {
        if self.low == user_id {
            self.high
        } else {
            self.low
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = mutual_matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MutualMatch {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub is_active: bool,
    pub matched_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl MutualMatch {
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.user_a_id, self.user_b_id)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = mutual_matches)]
pub struct NewMutualMatch {
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub is_active: bool,
}

impl NewMutualMatch {
    pub fn for_pair(pair: PairKey) -> Self {
        Self {
            user_a_id: pair.low,
            user_b_id: pair.high,
            is_active: true,
        }
    }
}

/// What a match-action write did to the pair's mutual match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PairChange {
    /// No match before or after.
    #[default]
    Unchanged,
    /// Both sides like each other and the match was already active.
    Kept,
    /// The write completed the pair: match inserted or reactivated.
    Created,
    /// The write took one side away from "liked": match deactivated.
    Broken,
}

impl PairChange {
    pub fn is_mutual(&self) -> bool {
        matches!(self, PairChange::Kept | PairChange::Created)
    }

    pub fn writes_match(&self) -> bool {
        matches!(self, PairChange::Created | PairChange::Broken)
    }
}

// --- Repository records ---

/// A match action joined with the target's profile.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub action: MatchAction,
    pub profile: UserProfile,
}

/// An active mutual match joined with the other user's profile.
#[derive(Debug, Clone)]
pub struct MutualEntry {
    pub mutual: MutualMatch,
    pub profile: UserProfile,
}

// --- Read models ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedProfile {
    pub profile_id: i64,
    pub full_name: String,
    pub age: i32,
    pub height_cm: Option<i32>,
    pub community: Option<String>,
    pub profession: Option<String>,
    pub profession_type: Option<String>,
    pub education_level: Option<String>,
    pub home_district: Option<String>,
    pub profile_picture_url: Option<String>,
    pub last_login: DateTime<Utc>,
    pub match_score: f64,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchHistoryItem {
    pub profile_id: i64,
    pub full_name: String,
    pub age: i32,
    pub community: Option<String>,
    pub profession: Option<String>,
    pub home_district: Option<String>,
    pub profile_picture_url: Option<String>,
    pub status: MatchStatus,
    pub action_at: DateTime<Utc>,
}

impl MatchHistoryItem {
    pub fn project(entry: HistoryEntry, today: NaiveDate) -> Self {
        let age = entry.profile.age_on(today);
        let profile = entry.profile;
        Self {
            profile_id: profile.id,
            full_name: profile.full_name,
            age,
            community: profile.community,
            profession: profile.profession,
            home_district: profile.home_district,
            profile_picture_url: profile.profile_picture_url,
            status: entry.action.status,
            action_at: entry.action.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutualMatchData {
    pub profile_id: i64,
    pub full_name: String,
    pub age: i32,
    pub community: Option<String>,
    pub profession: Option<String>,
    pub home_district: Option<String>,
    pub profile_picture_url: Option<String>,
    pub last_login: DateTime<Utc>,
    pub matched_at: DateTime<Utc>,
}

impl MutualMatchData {
    pub fn project(entry: MutualEntry, today: NaiveDate) -> Self {
        let age = entry.profile.age_on(today);
        let profile = entry.profile;
        Self {
            profile_id: profile.id,
            full_name: profile.full_name,
            age,
            community: profile.community,
            profession: profile.profession,
            home_district: profile.home_district,
            profile_picture_url: profile.profile_picture_url,
            last_login: profile.last_login,
            matched_at: entry.mutual.matched_at,
        }
    }
}
