//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it can be built over a
//! `DatabaseConnection` or a transaction.

use anyhow::Context;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    Order, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::contract::model::{NewUser, User, UserPatch, UserQuery};
use crate::domain::repo::UsersRepository;
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};
use crate::infra::storage::mapper::sort_column;

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    fn live() -> Condition {
        Condition::all().add(Column::IsDeleted.eq(false))
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        let now = Utc::now();
        let m = UserAM {
            name: Set(new_user.name),
            surname: Set(new_user.surname),
            patronymic: Set(new_user.patronymic),
            age: Set(new_user.age),
            gender: Set(new_user.gender),
            nationality: Set(new_user.nationality),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let stored = m.insert(&self.conn).await.context("create_user failed")?;
        Ok(stored.into())
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .filter(Self::live())
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_users(&self, query: &UserQuery) -> anyhow::Result<Vec<User>> {
        let mut select = UserEntity::find().filter(Self::live());

        if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(text))
                    .add(Column::Surname.contains(text))
                    .add(Column::Patronymic.contains(text)),
            );
        }

        let order = if query.descending {
            Order::Desc
        } else {
            Order::Asc
        };

        let rows = select
            .order_by(sort_column(query.sort), order)
            .limit(query.limit)
            .offset(query.offset)
            .all(&self.conn)
            .await
            .context("list_users failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_user(&self, id: i32, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let Some(current) = UserEntity::find_by_id(id)
            .filter(Self::live())
            .one(&self.conn)
            .await
            .context("update_user lookup failed")?
        else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(current.into()));
        }

        let mut m = current.into_active_model();
        if let Some(name) = patch.name {
            m.name = Set(name);
        }
        if let Some(surname) = patch.surname {
            m.surname = Set(surname);
        }
        if let Some(patronymic) = patch.patronymic {
            m.patronymic = Set(patronymic);
        }
        if let Some(age) = patch.age {
            m.age = Set(age);
        }
        if let Some(gender) = patch.gender {
            m.gender = Set(gender);
        }
        if let Some(nationality) = patch.nationality {
            m.nationality = Set(nationality);
        }
        m.updated_at = Set(Utc::now());

        let updated = m.update(&self.conn).await.context("update_user failed")?;
        Ok(Some(updated.into()))
    }

    async fn delete_user(&self, id: i32) -> anyhow::Result<bool> {
        let res = UserEntity::update_many()
            .col_expr(Column::IsDeleted, Expr::value(true))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Self::live())
            .exec(&self.conn)
            .await
            .context("delete_user failed")?;
        Ok(res.rows_affected > 0)
    }
}
