use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{ExpertProfile, NewUser, UserRecord, VerificationToken};
use super::errors::ExpertError;
use crate::pagination::{Page, Pagination};

/// Repository abstraction for account persistence and the precomputed
/// expert-profile queries. Each `find_experts*` method corresponds to one
/// query variant the service dispatches to; implementations return only
/// enabled, active accounts from these.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ExpertError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ExpertError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, ExpertError>;
    async fn insert(&self, user: NewUser) -> Result<UserRecord, ExpertError>;
    async fn save(&self, user: UserRecord) -> Result<UserRecord, ExpertError>;

    async fn find_all(&self, page: Pagination) -> Result<Page<UserRecord>, ExpertError>;

    /// Profile view of a single account with its tag ids, regardless of
    /// enablement or status.
    async fn find_expert_profile_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ExpertProfile>, ExpertError>;

    async fn find_experts(&self, page: Pagination) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_experts_by_name(
        &self,
        term: &str,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_experts_by_full_name(
        &self,
        first: &str,
        last: &str,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_experts_by_regions(
        &self,
        regions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_experts_by_directions(
        &self,
        directions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_experts_by_directions_and_regions(
        &self,
        directions: &[Uuid],
        regions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;

    async fn find_random_experts(&self, page: Pagination) -> Result<Page<ExpertProfile>, ExpertError>;
    async fn find_random_experts_by_directions(
        &self,
        directions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError>;
}

/// Repository abstraction for verification tokens. Tokens are one-time:
/// `delete` removes a redeemed token so it cannot verify again.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<VerificationToken>, ExpertError>;
    async fn create(&self, user_id: Uuid, token: &str) -> Result<VerificationToken, ExpertError>;
    async fn delete(&self, token: &str) -> Result<(), ExpertError>;
}

/// Simple in-memory mock repositories for tests and doc examples.
///
/// `MockUserRepository` also records which query variant was invoked so the
/// service's dispatch table can be asserted directly.
pub mod mock {
    use super::*;
    use crate::experts::domain::UserStatus;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserRepository {
        users: Mutex<HashMap<Uuid, UserRecord>>,
        regions: Mutex<HashMap<Uuid, Vec<Uuid>>>,    // user_id -> region ids
        directions: Mutex<HashMap<Uuid, Vec<Uuid>>>, // user_id -> direction ids
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockUserRepository {
        pub fn link_region(&self, user_id: Uuid, region_id: Uuid) {
            self.regions.lock().unwrap().entry(user_id).or_default().push(region_id);
        }

        pub fn link_direction(&self, user_id: Uuid, direction_id: Uuid) {
            self.directions.lock().unwrap().entry(user_id).or_default().push(direction_id);
        }

        /// Query variants invoked so far, in call order.
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }

        fn profile(&self, user: &UserRecord) -> ExpertProfile {
            let regions = self.regions.lock().unwrap().get(&user.id).cloned().unwrap_or_default();
            let directions = self.directions.lock().unwrap().get(&user.id).cloned().unwrap_or_default();
            ExpertProfile::from_record(user, regions, directions)
        }

        /// Enabled + active accounts, ordered by email for determinism.
        fn experts(&self) -> Vec<UserRecord> {
            let mut rows: Vec<UserRecord> = self
                .users
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.enabled && u.status == UserStatus::Active)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.email.cmp(&b.email));
            rows
        }

        fn page_of(rows: Vec<ExpertProfile>, page: Pagination) -> Page<ExpertProfile> {
            let (idx, per) = page.normalize();
            let total = rows.len() as u64;
            let items = rows
                .into_iter()
                .skip((idx * per) as usize)
                .take(per as usize)
                .collect();
            let (page_no, per_page) = page.effective();
            Page { items, total, page: page_no, per_page }
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ExpertError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ExpertError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, ExpertError> {
            Ok(self.users.lock().unwrap().values().any(|u| u.email == email))
        }

        async fn insert(&self, user: NewUser) -> Result<UserRecord, ExpertError> {
            let mut users = self.users.lock().unwrap();
            if users.values().any(|u| u.email == user.email) {
                return Err(ExpertError::Conflict);
            }
            let now = Utc::now();
            let record = UserRecord {
                id: Uuid::new_v4(),
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                password_hash: user.password_hash,
                enabled: user.enabled,
                status: user.status,
                created_at: now,
                updated_at: now,
            };
            users.insert(record.id, record.clone());
            Ok(record)
        }

        async fn save(&self, user: UserRecord) -> Result<UserRecord, ExpertError> {
            let mut users = self.users.lock().unwrap();
            if !users.contains_key(&user.id) {
                return Err(ExpertError::NotFound("user not found".into()));
            }
            let mut user = user;
            user.updated_at = Utc::now();
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_all(&self, page: Pagination) -> Result<Page<UserRecord>, ExpertError> {
            let mut rows: Vec<UserRecord> = self.users.lock().unwrap().values().cloned().collect();
            rows.sort_by(|a, b| a.email.cmp(&b.email));
            let (idx, per) = page.normalize();
            let total = rows.len() as u64;
            let items = rows
                .into_iter()
                .skip((idx * per) as usize)
                .take(per as usize)
                .collect();
            let (page_no, per_page) = page.effective();
            Ok(Page { items, total, page: page_no, per_page })
        }

        async fn find_expert_profile_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<ExpertProfile>, ExpertError> {
            let user = self.users.lock().unwrap().get(&id).cloned();
            Ok(user.map(|u| self.profile(&u)))
        }

        async fn find_experts(&self, page: Pagination) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts");
            let rows = self.experts().iter().map(|u| self.profile(u)).collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_experts_by_name(
            &self,
            term: &str,
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts_by_name");
            let rows = self
                .experts()
                .iter()
                .filter(|u| {
                    u.first_name.contains(term)
                        || u.last_name.as_deref().is_some_and(|l| l.contains(term))
                })
                .map(|u| self.profile(u))
                .collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_experts_by_full_name(
            &self,
            first: &str,
            last: &str,
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts_by_full_name");
            let rows = self
                .experts()
                .iter()
                .filter(|u| {
                    u.first_name.contains(first)
                        && u.last_name.as_deref().is_some_and(|l| l.contains(last))
                })
                .map(|u| self.profile(u))
                .collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_experts_by_regions(
            &self,
            regions: &[Uuid],
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts_by_regions");
            let rows = self
                .experts()
                .iter()
                .map(|u| self.profile(u))
                .filter(|p| p.regions.iter().any(|r| regions.contains(r)))
                .collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_experts_by_directions(
            &self,
            directions: &[Uuid],
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts_by_directions");
            let rows = self
                .experts()
                .iter()
                .map(|u| self.profile(u))
                .filter(|p| p.directions.iter().any(|d| directions.contains(d)))
                .collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_experts_by_directions_and_regions(
            &self,
            directions: &[Uuid],
            regions: &[Uuid],
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_experts_by_directions_and_regions");
            let rows = self
                .experts()
                .iter()
                .map(|u| self.profile(u))
                .filter(|p| {
                    p.directions.iter().any(|d| directions.contains(d))
                        && p.regions.iter().any(|r| regions.contains(r))
                })
                .collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_random_experts(
            &self,
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_random_experts");
            // Deterministic order in the mock; randomness belongs to the store.
            let rows = self.experts().iter().map(|u| self.profile(u)).collect();
            Ok(Self::page_of(rows, page))
        }

        async fn find_random_experts_by_directions(
            &self,
            directions: &[Uuid],
            page: Pagination,
        ) -> Result<Page<ExpertProfile>, ExpertError> {
            self.record("find_random_experts_by_directions");
            let rows = self
                .experts()
                .iter()
                .map(|u| self.profile(u))
                .filter(|p| p.directions.iter().any(|d| directions.contains(d)))
                .collect();
            Ok(Self::page_of(rows, page))
        }
    }

    #[derive(Default)]
    pub struct MockTokenRepository {
        tokens: Mutex<HashMap<String, VerificationToken>>, // key: token string
    }

    #[async_trait]
    impl TokenRepository for MockTokenRepository {
        async fn find_by_token(
            &self,
            token: &str,
        ) -> Result<Option<VerificationToken>, ExpertError> {
            Ok(self.tokens.lock().unwrap().get(token).cloned())
        }

        async fn create(
            &self,
            user_id: Uuid,
            token: &str,
        ) -> Result<VerificationToken, ExpertError> {
            let mut tokens = self.tokens.lock().unwrap();
            let t = VerificationToken {
                id: Uuid::new_v4(),
                user_id,
                token: token.to_string(),
                created_at: Utc::now(),
            };
            tokens.insert(t.token.clone(), t.clone());
            Ok(t)
        }

        async fn delete(&self, token: &str) -> Result<(), ExpertError> {
            self.tokens.lock().unwrap().remove(token);
            Ok(())
        }
    }
}
