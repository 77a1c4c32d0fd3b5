pub mod filters;
pub mod history;
pub mod locks;
pub mod ranker;
pub mod recommendations;
pub mod recorder;
pub mod scorer;
pub mod service;

pub use service::{ActionOutcome, MatchService};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    use crate::models::UserProfile;

    static NEXT_ID: AtomicI64 = AtomicI64::new(1000);

    /// A complete, undeleted profile that last logged in `hours_ago` before `now`.
    pub fn profile(now: DateTime<Utc>, hours_ago: i64) -> UserProfile {
        UserProfile {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            user_id: Uuid::new_v4(),
            full_name: "Meera Nair".into(),
            community: Some("nair".into()),
            profession: Some("engineer".into()),
            profession_type: Some("private".into()),
            education_level: Some("masters".into()),
            home_district: Some("ernakulam".into()),
            marital_status: Some("never_married".into()),
            is_physically_challenged: false,
            height_cm: Some(162),
            date_of_birth: None,
            profile_picture_url: None,
            last_login: now - Duration::hours(hours_ago),
            is_deleted: false,
            created_at: now - Duration::days(30),
        }
    }
}
