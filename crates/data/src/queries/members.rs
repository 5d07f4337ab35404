//! Member profiles: birthdays, family tree, gender counts.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dates;
use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, Filter, RecordStore, SelectQuery, SortDirection, decode};

/// Profiles table.
pub const PROFILE_TABLE: &str = "profiles";

/// Bucket holding profile pictures, keyed by the stored avatar path.
pub const AVATAR_BUCKET: &str = "avatars";

const GENDER_MALE: &str = "Male";
const GENDER_FEMALE: &str = "Female";

/// Backend-shaped member profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Option<String>,
    /// Birth date as stored (`YYYY-MM-DD`), if provided.
    pub birth_date: Option<String>,
    pub family_id: Option<Uuid>,
    pub relation: Option<String>,
    /// Avatar object key in [`AVATAR_BUCKET`].
    pub avatar: Option<String>,
}

/// Which birthdays a consumer wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BirthdayMode {
    /// Exact month and day match.
    Today,
    /// Any birthday in the current month.
    Month,
    /// No filter.
    All,
}

impl BirthdayMode {
    fn matches(self, today: NaiveDate, birth: NaiveDate) -> bool {
        match self {
            BirthdayMode::Today => {
                (birth.month(), birth.day()) == (today.month(), today.day())
            }
            BirthdayMode::Month => birth.month() == today.month(),
            BirthdayMode::All => true,
        }
    }
}

/// A member with an upcoming (or matching) birthday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthdayCard {
    pub id: Uuid,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub age: i32,
}

/// A member in the family-tree listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub full_name: String,
    pub relation: Option<String>,
    pub avatar_url: Option<String>,
}

/// Aggregate membership counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberCounts {
    pub total: u64,
    pub male: u64,
    pub female: u64,
}

/// Look up one profile by id. Zero rows is [`DataError::NotFound`].
pub(crate) async fn profile_by_id(records: &dyn RecordStore, id: Uuid) -> DataResult<Profile> {
    let mut rows = records
        .select(
            SelectQuery::table(PROFILE_TABLE)
                .filter(Filter::eq("id", id.to_string()))
                .limit(1),
        )
        .await
        .map_err(DataError::record_fetch)?;

    match rows.pop() {
        Some(row) => decode::row(PROFILE_TABLE, row),
        None => Err(DataError::NotFound(format!("profile {id}"))),
    }
}

/// Service over the profiles table and the avatar bucket.
pub struct MemberService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl MemberService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// One profile by id.
    pub async fn fetch_profile(&self, id: Uuid) -> DataResult<Profile> {
        profile_by_id(self.records.as_ref(), id).await
    }

    /// Members with birthdays matching `mode`, sorted by (month, day).
    pub async fn fetch_birthdays(&self, mode: BirthdayMode) -> DataResult<Vec<BirthdayCard>> {
        self.fetch_birthdays_on(mode, Utc::now().date_naive()).await
    }

    async fn fetch_birthdays_on(
        &self,
        mode: BirthdayMode,
        today: NaiveDate,
    ) -> DataResult<Vec<BirthdayCard>> {
        let rows = self
            .records
            .select(SelectQuery::table(PROFILE_TABLE).filter(Filter::not_null("birth_date")))
            .await
            .map_err(DataError::record_fetch)?;

        let profiles: Vec<Profile> = decode::rows(PROFILE_TABLE, rows);
        debug!(count = profiles.len(), ?mode, "building birthday cards");

        let mut cards = Vec::new();
        for profile in profiles {
            // The not-null filter makes birth_date present; a row that
            // slipped through without one is treated like a parse failure.
            let Some(raw_date) = profile.birth_date.as_deref() else {
                warn!(id = %profile.id, "profile without birth date in birthday query");
                continue;
            };
            let birth = match dates::parse_date(raw_date) {
                Ok(date) => date,
                Err(err) => {
                    warn!(id = %profile.id, raw_date, error = %err, "skipping unparseable birth date");
                    continue;
                }
            };

            if !mode.matches(today, birth) {
                continue;
            }

            cards.push(BirthdayCard {
                id: profile.id,
                full_name: profile.full_name,
                birth_date: birth,
                age: dates::age_on(birth, today),
            });
        }

        cards.sort_by_key(|card| dates::month_day(card.birth_date));
        Ok(cards)
    }

    /// One family's members, alphabetical by name, avatars resolved.
    pub async fn fetch_family_tree(&self, family_id: Uuid) -> DataResult<Vec<FamilyMember>> {
        let rows = self
            .records
            .select(
                SelectQuery::table(PROFILE_TABLE)
                    .filter(Filter::eq("family_id", family_id.to_string()))
                    .order_by("full_name", SortDirection::Asc),
            )
            .await
            .map_err(DataError::record_fetch)?;

        let profiles: Vec<Profile> = decode::rows(PROFILE_TABLE, rows);

        let mut members: Vec<FamilyMember> = profiles
            .into_iter()
            .map(|profile| FamilyMember {
                id: profile.id,
                full_name: profile.full_name,
                relation: profile.relation,
                avatar_url: profile
                    .avatar
                    .as_deref()
                    .map(|key| self.blobs.public_url(AVATAR_BUCKET, key)),
            })
            .collect();

        // Alphabetical by name, never by record id.
        members.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(members)
    }

    /// Total and per-gender member counts.
    ///
    /// Three independent count queries run concurrently; any one failing
    /// fails the whole aggregate.
    pub async fn fetch_member_counts(&self) -> DataResult<MemberCounts> {
        let male_filter = [Filter::eq("gender", GENDER_MALE)];
        let female_filter = [Filter::eq("gender", GENDER_FEMALE)];
        let (total, male, female) = tokio::try_join!(
            self.records.count(PROFILE_TABLE, &[]),
            self.records.count(PROFILE_TABLE, &male_filter),
            self.records.count(PROFILE_TABLE, &female_filter),
        )
        .map_err(DataError::record_fetch)?;

        Ok(MemberCounts {
            total,
            male,
            female,
        })
    }

    /// Birthday listing as a refetchable resource.
    pub fn birthdays(
        self: &Arc<Self>,
        mode: BirthdayMode,
    ) -> Arc<QueryResource<Vec<BirthdayCard>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_birthdays(mode).await }
        })
    }

    /// Family tree as a refetchable resource.
    pub fn family_tree(
        self: &Arc<Self>,
        family_id: Uuid,
    ) -> Arc<QueryResource<Vec<FamilyMember>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_family_tree(family_id).await }
        })
    }

    /// Member counts as a refetchable resource.
    pub fn member_counts(self: &Arc<Self>) -> Arc<QueryResource<MemberCounts>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_member_counts().await }
        })
    }
}
