use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use uuid::Uuid;

use models::{user, user_direction, user_region, verification_token};

use crate::experts::domain::{
    ExpertProfile, NewUser, UserRecord, UserStatus, VerificationToken,
};
use crate::experts::errors::ExpertError;
use crate::experts::repository::{TokenRepository, UserRepository};
use crate::pagination::{Page, Pagination};

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

pub struct SeaOrmTokenRepository {
    pub db: DatabaseConnection,
}

fn to_record(m: user::Model) -> Result<UserRecord, ExpertError> {
    let status = UserStatus::parse(&m.status)
        .ok_or_else(|| ExpertError::Repository(format!("unknown user status: {}", m.status)))?;
    Ok(UserRecord {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        password_hash: m.password_hash,
        enabled: m.enabled,
        status,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

/// Base select for expert-profile queries: enabled, active accounts only.
fn experts_select() -> Select<user::Entity> {
    user::Entity::find()
        .filter(user::Column::Enabled.eq(true))
        .filter(user::Column::Status.eq(models::user::STATUS_ACTIVE))
}

fn direction_filter(directions: &[Uuid]) -> sea_orm::sea_query::SimpleExpr {
    user::Column::Id.in_subquery(
        Query::select()
            .column(user_direction::Column::UserId)
            .from(user_direction::Entity)
            .and_where(user_direction::Column::DirectionId.is_in(directions.to_vec()))
            .to_owned(),
    )
}

fn region_filter(regions: &[Uuid]) -> sea_orm::sea_query::SimpleExpr {
    user::Column::Id.in_subquery(
        Query::select()
            .column(user_region::Column::UserId)
            .from(user_region::Entity)
            .and_where(user_region::Column::RegionId.is_in(regions.to_vec()))
            .to_owned(),
    )
}

impl SeaOrmUserRepository {
    /// Run a paginated user query and assemble profiles with their tag ids.
    async fn fetch_profiles(
        &self,
        select: Select<user::Entity>,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let (page_idx, per_page) = page.normalize();
        let paginator = select.paginate(&self.db, per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        let rows = paginator
            .fetch_page(page_idx)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;

        let ids: Vec<Uuid> = rows.iter().map(|m| m.id).collect();
        let mut regions: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut directions: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if !ids.is_empty() {
            for link in user_region::Entity::find()
                .filter(user_region::Column::UserId.is_in(ids.clone()))
                .all(&self.db)
                .await
                .map_err(|e| ExpertError::Repository(e.to_string()))?
            {
                regions.entry(link.user_id).or_default().push(link.region_id);
            }
            for link in user_direction::Entity::find()
                .filter(user_direction::Column::UserId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(|e| ExpertError::Repository(e.to_string()))?
            {
                directions.entry(link.user_id).or_default().push(link.direction_id);
            }
        }

        let mut items = Vec::with_capacity(rows.len());
        for m in rows {
            let record = to_record(m)?;
            let r = regions.remove(&record.id).unwrap_or_default();
            let d = directions.remove(&record.id).unwrap_or_default();
            items.push(ExpertProfile::from_record(&record, r, d));
        }
        let (page_no, per_page) = page.effective();
        Ok(Page { items, total, page: page_no, per_page })
    }
}

#[async_trait::async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ExpertError> {
        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        found.map(to_record).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ExpertError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        found.map(to_record).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, ExpertError> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        Ok(count > 0)
    }

    async fn insert(&self, new: NewUser) -> Result<UserRecord, ExpertError> {
        let created = user::create(
            &self.db,
            &new.email,
            &new.first_name,
            new.last_name.as_deref(),
            &new.password_hash,
            new.status.as_str(),
            new.enabled,
        )
        .await?;
        to_record(created)
    }

    async fn save(&self, record: UserRecord) -> Result<UserRecord, ExpertError> {
        let existing = user::Entity::find_by_id(record.id)
            .one(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?
            .ok_or_else(|| ExpertError::NotFound("user not found".into()))?;
        let mut am: user::ActiveModel = existing.into();
        am.email = Set(record.email);
        am.first_name = Set(record.first_name);
        am.last_name = Set(record.last_name);
        am.password_hash = Set(record.password_hash);
        am.enabled = Set(record.enabled);
        am.status = Set(record.status.as_str().to_string());
        am.updated_at = Set(Utc::now().into());
        let updated = am
            .update(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        to_record(updated)
    }

    async fn find_expert_profile_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ExpertProfile>, ExpertError> {
        let found = match self.find_by_id(id).await? {
            Some(record) => record,
            None => return Ok(None),
        };
        let regions = user_region::Entity::find()
            .filter(user_region::Column::UserId.eq(id))
            .all(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?
            .into_iter()
            .map(|l| l.region_id)
            .collect();
        let directions = user_direction::Entity::find()
            .filter(user_direction::Column::UserId.eq(id))
            .all(&self.db)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?
            .into_iter()
            .map(|l| l.direction_id)
            .collect();
        Ok(Some(ExpertProfile::from_record(&found, regions, directions)))
    }

    async fn find_all(&self, page: Pagination) -> Result<Page<UserRecord>, ExpertError> {
        let (page_idx, per_page) = page.normalize();
        let paginator = user::Entity::find()
            .order_by(user::Column::Email, Order::Asc)
            .paginate(&self.db, per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        let rows = paginator
            .fetch_page(page_idx)
            .await
            .map_err(|e| ExpertError::Repository(e.to_string()))?;
        let items = rows.into_iter().map(to_record).collect::<Result<Vec<_>, _>>()?;
        let (page_no, per_page) = page.effective();
        Ok(Page { items, total, page: page_no, per_page })
    }

    async fn find_experts(&self, page: Pagination) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select().order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_experts_by_name(
        &self,
        term: &str,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(
                Condition::any()
                    .add(user::Column::FirstName.contains(term))
                    .add(user::Column::LastName.contains(term)),
            )
            .order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_experts_by_full_name(
        &self,
        first: &str,
        last: &str,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(user::Column::FirstName.contains(first))
            .filter(user::Column::LastName.contains(last))
            .order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_experts_by_regions(
        &self,
        regions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(region_filter(regions))
            .order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_experts_by_directions(
        &self,
        directions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(direction_filter(directions))
            .order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_experts_by_directions_and_regions(
        &self,
        directions: &[Uuid],
        regions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(direction_filter(directions))
            .filter(region_filter(regions))
            .order_by(user::Column::Email, Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_random_experts(
        &self,
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select().order_by(Expr::cust("RANDOM()"), Order::Asc);
        self.fetch_profiles(select, page).await
    }

    async fn find_random_experts_by_directions(
        &self,
        directions: &[Uuid],
        page: Pagination,
    ) -> Result<Page<ExpertProfile>, ExpertError> {
        let select = experts_select()
            .filter(direction_filter(directions))
            .order_by(Expr::cust("RANDOM()"), Order::Asc);
        self.fetch_profiles(select, page).await
    }
}

#[async_trait::async_trait]
impl TokenRepository for SeaOrmTokenRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<VerificationToken>, ExpertError> {
        let found = verification_token::find_by_token(&self.db, token).await?;
        Ok(found.map(|m| VerificationToken {
            id: m.id,
            user_id: m.user_id,
            token: m.token,
            created_at: m.created_at.with_timezone(&Utc),
        }))
    }

    async fn create(&self, user_id: Uuid, token: &str) -> Result<VerificationToken, ExpertError> {
        let created = verification_token::create(&self.db, user_id, token).await?;
        Ok(VerificationToken {
            id: created.id,
            user_id: created.user_id,
            token: created.token,
            created_at: created.created_at.with_timezone(&Utc),
        })
    }

    async fn delete(&self, token: &str) -> Result<(), ExpertError> {
        verification_token::delete_by_token(&self.db, token).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experts::domain::{SearchCriteria, SignUpRequest};
    use crate::experts::ExpertService;
    use crate::test_support::get_db;
    use models::{direction, region};
    use std::sync::Arc;

    #[tokio::test]
    async fn expert_queries_against_postgres() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = get_db().await?;
        let users = Arc::new(SeaOrmUserRepository { db: db.clone() });
        let tokens = Arc::new(SeaOrmTokenRepository { db: db.clone() });
        let svc = ExpertService::new(users.clone(), tokens);

        let suffix = Uuid::new_v4();
        let r = region::create(&db, &format!("region_{suffix}")).await?;
        let d = direction::create(&db, &format!("direction_{suffix}")).await?;

        // register, verify, activate: the usual path into the directory
        let registered = svc
            .register(SignUpRequest {
                name: format!("Searchable Expert{suffix}"),
                email: format!("expert_{suffix}@example.com"),
                password: "Passw0rd!".into(),
            })
            .await?;
        assert!(!registered.enabled);

        let token = Uuid::new_v4().to_string();
        svc.create_verification_token(registered.id, &token).await?;
        let stored = svc.consume_verification_token(&token).await?.unwrap();
        svc.set_enabled(stored.user_id).await?;
        // one-time token: the row is deleted on redemption
        assert!(svc.get_verification_token(&token).await?.is_none());

        let mut activated = svc.find_by_email(&registered.email).await?.unwrap();
        assert!(activated.enabled);
        activated.status = crate::experts::domain::UserStatus::Active;
        svc.save(activated).await?;

        models::user_region::link(&db, registered.id, r.id).await?;
        models::user_direction::link(&db, registered.id, d.id).await?;

        // every variant that should match this expert
        let page = crate::pagination::Pagination::default();
        let by_region = svc
            .find_all_experts(
                &SearchCriteria { regions: vec![r.id], ..Default::default() },
                page,
            )
            .await?;
        assert!(by_region.items.iter().any(|p| p.id == registered.id));

        let by_direction = svc
            .find_all_experts(
                &SearchCriteria { directions: vec![d.id], ..Default::default() },
                page,
            )
            .await?;
        assert!(by_direction.items.iter().any(|p| p.id == registered.id));

        let by_both = svc
            .find_all_experts(
                &SearchCriteria {
                    regions: vec![r.id],
                    directions: vec![d.id],
                    ..Default::default()
                },
                page,
            )
            .await?;
        assert_eq!(by_both.items.len(), 1);
        assert_eq!(by_both.items[0].regions, vec![r.id]);
        assert_eq!(by_both.items[0].directions, vec![d.id]);

        let by_name = svc
            .find_all_experts(
                &SearchCriteria {
                    name_terms: vec!["Searchable".into(), format!("Expert{suffix}")],
                    ..Default::default()
                },
                page,
            )
            .await?;
        assert!(by_name.items.iter().any(|p| p.id == registered.id));

        let preview = svc.find_random_expert_preview(&[d.id], page).await?;
        assert!(preview.items.iter().any(|p| p.id == registered.id));

        let profile = svc.find_expert_by_id(registered.id).await?;
        assert_eq!(profile.directions, vec![d.id]);

        // cleanup (links and token cascade with the user)
        models::user::hard_delete(&db, registered.id).await?;
        region::Entity::delete_by_id(r.id).exec(&db).await?;
        direction::Entity::delete_by_id(d.id).exec(&db).await?;
        Ok(())
    }
}
