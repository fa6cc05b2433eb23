use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{
    ExpertProfile, NewUser, SearchCriteria, SignUpRequest, UserRecord, UserStatus,
    VerificationToken,
};
use super::errors::ExpertError;
use super::name;
use super::repository::{TokenRepository, UserRepository};
use crate::pagination::{Page, Pagination};

/// Expert-directory business service independent of web framework.
///
/// Mediates between HTTP controllers and the persistence layer: all querying,
/// filtering, and pagination is delegated to the repositories; this type owns
/// the dispatch between the precomputed query variants and the registration
/// and verification workflows.
pub struct ExpertService<R: UserRepository, T: TokenRepository> {
    users: Arc<R>,
    tokens: Arc<T>,
}

impl<R: UserRepository, T: TokenRepository> ExpertService<R, T> {
    pub fn new(users: Arc<R>, tokens: Arc<T>) -> Self {
        Self { users, tokens }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ExpertError> {
        self.users.find_by_email(email).await
    }

    pub async fn find_all(&self, page: Pagination) -> Result<Page<UserRecord>, ExpertError> {
        self.users.find_all(page).await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool, ExpertError> {
        self.users.exists_by_email(email).await
    }

    pub async fn save(&self, user: UserRecord) -> Result<UserRecord, ExpertError> {
        self.users.save(user).await
    }

    pub async fn find_expert_by_id(&self, id: Uuid) -> Result<ExpertProfile, ExpertError> {
        self.users
            .find_expert_profile_by_id(id)
            .await?
            .ok_or_else(|| ExpertError::NotFound("expert not found".into()))
    }

    /// Paginated expert search. Picks one of six precomputed query variants
    /// by filter presence; combinations without a variant (three or more name
    /// terms, or a name combined with region/direction filters) fail with a
    /// not-found error, mirroring exhausted dispatch.
    #[instrument(skip(self, criteria), fields(
        name_terms = criteria.name_terms.len(),
        regions = criteria.regions.len(),
        directions = criteria.directions.len(),
    ))]
    pub async fn find_all_experts(
        &self,
        criteria: &SearchCriteria,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        if !criteria.has_name() && !criteria.has_regions() && !criteria.has_directions() {
            return self.users.find_experts(page).await;
        }

        if !criteria.has_regions() && !criteria.has_directions() {
            match criteria.name_terms.as_slice() {
                [term] => return self.users.find_experts_by_name(term, page).await,
                [first, last] => {
                    return self.users.find_experts_by_full_name(first, last, page).await
                }
                _ => {}
            }
        }

        if !criteria.has_name() && !criteria.has_directions() {
            return self.users.find_experts_by_regions(&criteria.regions, page).await;
        }

        if !criteria.has_name() && !criteria.has_regions() {
            return self
                .users
                .find_experts_by_directions(&criteria.directions, page)
                .await;
        }

        if !criteria.has_name() {
            return self
                .users
                .find_experts_by_directions_and_regions(
                    &criteria.directions,
                    &criteria.regions,
                    page,
                )
                .await;
        }

        debug!("no query variant matches the supplied filters");
        Err(ExpertError::NotFound("wrong search parameters".into()))
    }

    /// Random expert preview: unfiltered when no directions are supplied,
    /// otherwise restricted to the given directions.
    pub async fn find_random_expert_preview(
        &self,
        directions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        if directions.is_empty() {
            return self.users.find_random_experts(page).await;
        }
        self.users.find_random_experts_by_directions(directions, page).await
    }

    /// Flip the enablement flag after email verification. A missing account
    /// here means the caller holds a token for a user that no longer exists.
    pub async fn set_enabled(&self, user_id: Uuid) -> Result<(), ExpertError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ExpertError::BadRequest("user does not exist".into()))?;
        user.enabled = true;
        self.users.save(user).await?;
        Ok(())
    }

    pub async fn get_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, ExpertError> {
        self.tokens.find_by_token(token).await
    }

    /// Redeem a verification token. The token is deleted on lookup so each
    /// token verifies exactly once; a second redemption finds nothing.
    pub async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, ExpertError> {
        let found = self.tokens.find_by_token(token).await?;
        if let Some(ref t) = found {
            self.tokens.delete(&t.token).await?;
        }
        Ok(found)
    }

    /// Store a verification token for a user. The token string is issued by
    /// the caller (the registration flow hands out a UUID).
    pub async fn create_verification_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<VerificationToken, ExpertError> {
        self.tokens.create(user_id, token).await
    }

    /// Register a new account: parse the display name into structured parts,
    /// hash the password, and persist a disabled account with `new` status.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: SignUpRequest) -> Result<UserRecord, ExpertError> {
        if input.password.len() < 8 {
            return Err(ExpertError::Validation("password too short (>=8)".into()));
        }
        if !input.email.contains('@') {
            return Err(ExpertError::Validation("invalid email".into()));
        }
        let (first_name, last_name) = name::split_display_name(&input.name);
        if first_name.is_empty() {
            return Err(ExpertError::Validation("name required".into()));
        }
        if self.users.exists_by_email(&input.email).await? {
            debug!("user exists: {}", input.email);
            return Err(ExpertError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| ExpertError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .users
            .insert(NewUser {
                email: input.email,
                first_name,
                last_name,
                password_hash,
                enabled: false,
                status: UserStatus::New,
            })
            .await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experts::repository::mock::{MockTokenRepository, MockUserRepository};
    use argon2::{password_hash::PasswordHash, PasswordVerifier};

    fn service() -> ExpertService<MockUserRepository, MockTokenRepository> {
        ExpertService::new(
            Arc::new(MockUserRepository::default()),
            Arc::new(MockTokenRepository::default()),
        )
    }

    fn svc_with_users(
        users: Arc<MockUserRepository>,
    ) -> ExpertService<MockUserRepository, MockTokenRepository> {
        ExpertService::new(users, Arc::new(MockTokenRepository::default()))
    }

    async fn seed_expert(
        svc: &ExpertService<MockUserRepository, MockTokenRepository>,
        name: &str,
        email: &str,
    ) -> UserRecord {
        let user = svc
            .register(SignUpRequest {
                name: name.into(),
                email: email.into(),
                password: "Passw0rd!".into(),
            })
            .await
            .unwrap();
        // Promote to a visible expert profile
        let mut user = user;
        user.enabled = true;
        user.status = UserStatus::Active;
        svc.save(user).await.unwrap()
    }

    fn criteria(
        name_terms: &[&str],
        regions: &[Uuid],
        directions: &[Uuid],
    ) -> SearchCriteria {
        SearchCriteria {
            name_terms: name_terms.iter().map(|s| s.to_string()).collect(),
            regions: regions.to_vec(),
            directions: directions.to_vec(),
        }
    }

    #[tokio::test]
    async fn register_creates_disabled_new_user_with_hashed_password() {
        let svc = service();
        let input = SignUpRequest {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Analytical1".into(),
        };
        let user = svc.register(input).await.unwrap();

        assert!(!user.enabled);
        assert_eq!(user.status, UserStatus::New);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
        assert_ne!(user.password_hash, "Analytical1");

        let parsed = PasswordHash::new(&user.password_hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"Analytical1", &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_duplicates() {
        let svc = service();
        let short = SignUpRequest {
            name: "A B".into(),
            email: "a@example.com".into(),
            password: "short".into(),
        };
        assert!(matches!(
            svc.register(short).await,
            Err(ExpertError::Validation(_))
        ));

        let ok = SignUpRequest {
            name: "A B".into(),
            email: "a@example.com".into(),
            password: "LongEnough1".into(),
        };
        svc.register(ok.clone()).await.unwrap();
        assert!(matches!(svc.register(ok).await, Err(ExpertError::Conflict)));
    }

    #[tokio::test]
    async fn dispatch_covers_all_filter_combinations() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());
        let page = Pagination::default();
        let region = Uuid::new_v4();
        let direction = Uuid::new_v4();

        // each call appends exactly one variant name to the mock's log
        svc.find_all_experts(&criteria(&[], &[], &[]), page).await.unwrap();
        svc.find_all_experts(&criteria(&["Ada"], &[], &[]), page).await.unwrap();
        svc.find_all_experts(&criteria(&["Ada", "Lovelace"], &[], &[]), page)
            .await
            .unwrap();
        svc.find_all_experts(&criteria(&[], &[region], &[]), page).await.unwrap();
        svc.find_all_experts(&criteria(&[], &[], &[direction]), page).await.unwrap();
        svc.find_all_experts(&criteria(&[], &[region], &[direction]), page)
            .await
            .unwrap();

        assert_eq!(
            users.calls(),
            vec![
                "find_experts",
                "find_experts_by_name",
                "find_experts_by_full_name",
                "find_experts_by_regions",
                "find_experts_by_directions",
                "find_experts_by_directions_and_regions",
            ]
        );
    }

    #[tokio::test]
    async fn dispatch_rejects_uncovered_combinations() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());
        let page = Pagination::default();
        let region = Uuid::new_v4();
        let direction = Uuid::new_v4();

        let uncovered = [
            criteria(&["A", "B", "C"], &[], &[]),
            criteria(&["Ada"], &[region], &[]),
            criteria(&["Ada"], &[], &[direction]),
            criteria(&["Ada"], &[region], &[direction]),
        ];
        for c in uncovered {
            assert!(matches!(
                svc.find_all_experts(&c, page).await,
                Err(ExpertError::NotFound(_))
            ));
        }
        // nothing reached a repository query
        assert!(users.calls().is_empty());
    }

    #[tokio::test]
    async fn search_filters_by_direction_membership() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());
        let cardiology = Uuid::new_v4();

        let with_tag = seed_expert(&svc, "Tagged Expert", "tagged@example.com").await;
        let _without = seed_expert(&svc, "Plain Expert", "plain@example.com").await;
        users.link_direction(with_tag.id, cardiology);

        let page = svc
            .find_all_experts(
                &criteria(&[], &[], &[cardiology]),
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, with_tag.id);
        assert_eq!(page.items[0].directions, vec![cardiology]);
    }

    #[tokio::test]
    async fn disabled_accounts_never_surface_as_experts() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());

        // registered but never enabled
        svc.register(SignUpRequest {
            name: "Pending User".into(),
            email: "pending@example.com".into(),
            password: "Passw0rd!".into(),
        })
        .await
        .unwrap();
        let visible = seed_expert(&svc, "Visible Expert", "visible@example.com").await;

        let page = svc
            .find_all_experts(&SearchCriteria::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, visible.id);
    }

    #[tokio::test]
    async fn random_preview_respects_direction_filter() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());
        let oncology = Uuid::new_v4();

        let a = seed_expert(&svc, "First Expert", "first@example.com").await;
        let _b = seed_expert(&svc, "Second Expert", "second@example.com").await;
        users.link_direction(a.id, oncology);

        let unfiltered = svc
            .find_random_expert_preview(&[], Pagination::default())
            .await
            .unwrap();
        assert_eq!(unfiltered.total, 2);

        let filtered = svc
            .find_random_expert_preview(&[oncology], Pagination::default())
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.items[0].id, a.id);

        assert_eq!(
            users.calls(),
            vec!["find_random_experts", "find_random_experts_by_directions"]
        );
    }

    #[tokio::test]
    async fn set_enabled_flips_flag_and_rejects_missing_users() {
        let svc = service();
        let user = svc
            .register(SignUpRequest {
                name: "Flip Me".into(),
                email: "flip@example.com".into(),
                password: "Passw0rd!".into(),
            })
            .await
            .unwrap();
        assert!(!user.enabled);

        svc.set_enabled(user.id).await.unwrap();
        let reloaded = svc.find_by_email("flip@example.com").await.unwrap().unwrap();
        assert!(reloaded.enabled);

        assert!(matches!(
            svc.set_enabled(Uuid::new_v4()).await,
            Err(ExpertError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn verification_token_roundtrip() {
        let svc = service();
        let user = svc
            .register(SignUpRequest {
                name: "Tok En".into(),
                email: "token@example.com".into(),
                password: "Passw0rd!".into(),
            })
            .await
            .unwrap();

        let token = Uuid::new_v4().to_string();
        let created = svc.create_verification_token(user.id, &token).await.unwrap();
        assert_eq!(created.user_id, user.id);

        let found = svc.get_verification_token(&token).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(svc
            .get_verification_token("missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn verification_token_is_single_use() {
        let svc = service();
        let user = svc
            .register(SignUpRequest {
                name: "Once Only".into(),
                email: "once@example.com".into(),
                password: "Passw0rd!".into(),
            })
            .await
            .unwrap();

        let token = Uuid::new_v4().to_string();
        svc.create_verification_token(user.id, &token).await.unwrap();

        // full verification flow: redeem the token, enable the account
        let redeemed = svc.consume_verification_token(&token).await.unwrap().unwrap();
        svc.set_enabled(redeemed.user_id).await.unwrap();
        let reloaded = svc.find_by_email("once@example.com").await.unwrap().unwrap();
        assert!(reloaded.enabled);

        // the redeemed token is gone; replaying it finds nothing
        assert!(svc.get_verification_token(&token).await.unwrap().is_none());
        assert!(svc.consume_verification_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn page_envelope_reports_clamped_pagination() {
        let users = Arc::new(MockUserRepository::default());
        let svc = svc_with_users(users.clone());
        seed_expert(&svc, "Lone Expert", "lone@example.com").await;

        let page = svc
            .find_all_experts(
                &SearchCriteria::default(),
                Pagination { page: 0, per_page: 1000 },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }

    #[tokio::test]
    async fn find_expert_by_id_maps_missing_to_not_found() {
        let svc = service();
        assert!(matches!(
            svc.find_expert_by_id(Uuid::new_v4()).await,
            Err(ExpertError::NotFound(_))
        ));
    }
}
