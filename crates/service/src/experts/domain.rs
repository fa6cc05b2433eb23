use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account lifecycle status. Stored as a lowercase string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    New,
    Active,
    Deleted,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::New => models::user::STATUS_NEW,
            UserStatus::Active => models::user::STATUS_ACTIVE,
            UserStatus::Deleted => models::user::STATUS_DELETED,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            models::user::STATUS_NEW => Some(UserStatus::New),
            models::user::STATUS_ACTIVE => Some(UserStatus::Active),
            models::user::STATUS_DELETED => Some(UserStatus::Deleted),
            _ => None,
        }
    }
}

/// Sign-up input: a display name plus credentials. The display name is parsed
/// into structured name parts during registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Transient expert-search filters. Which of the three are present decides
/// the query variant; the criteria are never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub name_terms: Vec<String>,
    pub regions: Vec<Uuid>,
    pub directions: Vec<Uuid>,
}

impl SearchCriteria {
    pub fn has_name(&self) -> bool {
        !self.name_terms.is_empty()
    }

    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn has_directions(&self) -> bool {
        !self.directions.is_empty()
    }
}

/// Full account view used inside the service layer. Carries the hash; never
/// serialize this to clients, use [`ExpertProfile`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a not-yet-persisted account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub status: UserStatus,
}

/// Client-safe expert view: no password hash, plus associated tag ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub status: UserStatus,
    pub regions: Vec<Uuid>,
    pub directions: Vec<Uuid>,
}

impl ExpertProfile {
    pub fn from_record(user: &UserRecord, regions: Vec<Uuid>, directions: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            status: user.status,
            regions,
            directions,
        }
    }
}

/// Domain view of a stored verification token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}
