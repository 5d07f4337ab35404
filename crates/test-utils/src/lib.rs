//! Samaj test utilities.
//!
//! Fixture builders producing backend-shaped JSON rows for the
//! aggregation layer's tables. Builders start from sensible defaults and
//! are adjusted with chained `with_*` methods.

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Create a profile fixture with default values.
pub fn test_profile(full_name: &str) -> TestProfile {
    TestProfile {
        id: Uuid::now_v7(),
        full_name: full_name.to_string(),
        gender: None,
        birth_date: None,
        family_id: None,
        relation: None,
        avatar: None,
    }
}

/// A profile row builder.
#[derive(Debug, Clone)]
pub struct TestProfile {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub family_id: Option<Uuid>,
    pub relation: Option<String>,
    pub avatar: Option<String>,
}

impl TestProfile {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set the gender string as the backend stores it.
    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    /// Set the birth date (`YYYY-MM-DD`).
    pub fn with_birth_date(mut self, birth_date: &str) -> Self {
        self.birth_date = Some(birth_date.to_string());
        self
    }

    /// Attach the profile to a family.
    pub fn in_family(mut self, family_id: Uuid) -> Self {
        self.family_id = Some(family_id);
        self
    }

    /// Set the relation label shown in the family tree.
    pub fn with_relation(mut self, relation: &str) -> Self {
        self.relation = Some(relation.to_string());
        self
    }

    /// Set the avatar object key.
    pub fn with_avatar(mut self, key: &str) -> Self {
        self.avatar = Some(key.to_string());
        self
    }

    /// Render as a backend row.
    pub fn into_row(self) -> JsonValue {
        json!({
            "id": self.id,
            "full_name": self.full_name,
            "gender": self.gender,
            "birth_date": self.birth_date,
            "family_id": self.family_id,
            "relation": self.relation,
            "avatar": self.avatar,
        })
    }
}

/// Create a donation fixture with default values.
pub fn test_donation(title: &str) -> TestDonation {
    TestDonation {
        id: Uuid::now_v7(),
        title: title.to_string(),
        description: None,
        image: None,
        raised: 0,
        target: 10_000,
        percentage: 0,
    }
}

/// A donation row builder.
#[derive(Debug, Clone)]
pub struct TestDonation {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub raised: i64,
    pub target: i64,
    pub percentage: i64,
}

impl TestDonation {
    /// Set the image object key.
    pub fn with_image(mut self, key: &str) -> Self {
        self.image = Some(key.to_string());
        self
    }

    /// Set funding progress fields. `percentage` is independent of
    /// `raised`/`target` on purpose — the backend stores it separately.
    pub fn with_progress(mut self, raised: i64, target: i64, percentage: i64) -> Self {
        self.raised = raised;
        self.target = target;
        self.percentage = percentage;
        self
    }

    /// Render as a backend row.
    pub fn into_row(self) -> JsonValue {
        json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "image": self.image,
            "raised": self.raised,
            "target": self.target,
            "percentage": self.percentage,
        })
    }
}

/// Create an article fixture authored by `author_id`.
pub fn test_article(title: &str, author_id: Uuid) -> TestArticle {
    TestArticle {
        id: Uuid::now_v7(),
        title: title.to_string(),
        body: Some("body text".to_string()),
        author_id,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// A news row builder.
#[derive(Debug, Clone)]
pub struct TestArticle {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub author_id: Uuid,
    pub created_at: String,
}

impl TestArticle {
    /// Set the creation timestamp (RFC 3339).
    pub fn created_at(mut self, timestamp: &str) -> Self {
        self.created_at = timestamp.to_string();
        self
    }

    /// Render as a backend row.
    pub fn into_row(self) -> JsonValue {
        json!({
            "id": self.id,
            "title": self.title,
            "body": self.body,
            "author_id": self.author_id,
            "created_at": self.created_at,
        })
    }
}

/// Create a magazine fixture with default values.
pub fn test_magazine(title: &str) -> TestMagazine {
    TestMagazine {
        id: Uuid::now_v7(),
        title: title.to_string(),
        magazine_url: None,
        cover_image: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// A magazine row builder.
#[derive(Debug, Clone)]
pub struct TestMagazine {
    pub id: Uuid,
    pub title: String,
    pub magazine_url: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: String,
}

impl TestMagazine {
    /// Set the cover-image identifier.
    pub fn with_cover(mut self, cover_image: &str) -> Self {
        self.cover_image = Some(cover_image.to_string());
        self
    }

    /// Set the creation timestamp (RFC 3339).
    pub fn created_at(mut self, timestamp: &str) -> Self {
        self.created_at = timestamp.to_string();
        self
    }

    /// Render as a backend row.
    pub fn into_row(self) -> JsonValue {
        json!({
            "id": self.id,
            "title": self.title,
            "magazine_url": self.magazine_url,
            "cover_image": self.cover_image,
            "created_at": self.created_at,
        })
    }
}

/// Create a business fixture owned by `owner_id`.
pub fn test_business(name: &str, owner_id: Uuid) -> TestBusiness {
    TestBusiness {
        id: Uuid::now_v7(),
        owner_id,
        name: name.to_string(),
        category: None,
        description: None,
        phone: None,
    }
}

/// A business row builder.
#[derive(Debug, Clone)]
pub struct TestBusiness {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
}

impl TestBusiness {
    /// Set the category label.
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Render as a backend row.
    pub fn into_row(self) -> JsonValue {
        json!({
            "id": self.id,
            "owner_id": self.owner_id,
            "name": self.name,
            "category": self.category,
            "description": self.description,
            "phone": self.phone,
        })
    }
}
