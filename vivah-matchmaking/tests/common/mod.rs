#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as Hours, Utc};
use uuid::Uuid;

use vivah_matchmaking::matching::locks::LocalPairLocks;
use vivah_matchmaking::matching::MatchService;
use vivah_matchmaking::models::{PartnerPreferences, UserProfile};
use vivah_matchmaking::repository::memory::InMemoryStore;

/// A profile that logged in `hours_ago` (plus half an hour, so it never sits
/// on an hour boundary) before `now`.
pub fn profile_at(id: i64, name: &str, now: DateTime<Utc>, hours_ago: i64) -> UserProfile {
    UserProfile {
        id,
        user_id: Uuid::new_v4(),
        full_name: name.to_string(),
        community: Some("nair".into()),
        profession: Some("teacher".into()),
        profession_type: Some("government".into()),
        education_level: Some("bachelors".into()),
        home_district: Some("thrissur".into()),
        marital_status: Some("never_married".into()),
        is_physically_challenged: false,
        height_cm: Some(165),
        date_of_birth: None,
        profile_picture_url: Some(format!("https://cdn.vivah.test/{id}.jpg")),
        last_login: now - Hours::hours(hours_ago) - Hours::minutes(30),
        is_deleted: false,
        created_at: now - Hours::days(90),
    }
}

pub fn profile(id: i64, name: &str) -> UserProfile {
    profile_at(id, name, Utc::now(), 2)
}

pub fn preferences(profile_id: i64) -> PartnerPreferences {
    PartnerPreferences {
        profile_id,
        accept_physically_challenged: true,
        ..Default::default()
    }
}

pub fn engine(store: &Arc<InMemoryStore>) -> MatchService {
    MatchService::from_store(
        store.clone(),
        Arc::new(LocalPairLocks::new(Duration::from_secs(1))),
    )
}

/// Store seeded with `names`, numbered from profile id 1.
pub fn seeded(names: &[&str]) -> (Arc<InMemoryStore>, Vec<UserProfile>) {
    let store = Arc::new(InMemoryStore::new());
    let profiles: Vec<UserProfile> = names
        .iter()
        .enumerate()
        .map(|(i, name)| profile(i as i64 + 1, name))
        .collect();
    for p in &profiles {
        store.insert_profile(p.clone());
    }
    (store, profiles)
}
