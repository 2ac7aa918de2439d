use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ListOpts, Share, ShareFilter};
use crate::repo::query::{Conditions, Table, Value};

pub const SHARES: Table = Table {
    name: "shares",
    columns: &[
        "id",
        "user_id",
        "slug",
        "name",
        "description",
        "image_id",
        "status",
        "created_at",
        "updated_at",
    ],
    order_by: "shares.name ASC",
};

#[derive(Clone, Copy, Default)]
pub struct ShareRepository;

impl ShareRepository {
    pub fn new() -> Self {
        Self
    }

    fn conditions(filter: &ShareFilter) -> Conditions {
        Conditions::new()
            .any_of("shares.id", filter.ids.iter().copied())
            .any_of("shares.user_id", filter.user_ids())
            .any_of("shares.slug", filter.slugs.iter())
            .eq_opt("shares.status", filter.status.map(|s| s.as_str()))
    }

    fn values(share: &Share) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", share.user_id.into()),
            ("slug", share.slug.clone().into()),
            ("name", share.name.clone().into()),
            ("description", share.description.clone().into()),
            ("image_id", share.image_id.into()),
            ("status", share.status.as_str().into()),
            ("updated_at", share.updated_at.into()),
        ]
    }

    pub async fn list(&self, conn: &mut SqliteConnection, filter: &ShareFilter) -> Result<Vec<Share>> {
        SHARES.list(conn, &Self::conditions(filter), filter.list).await
    }

    pub async fn count(&self, conn: &mut SqliteConnection, filter: &ShareFilter) -> Result<i64> {
        SHARES.count(conn, &Self::conditions(filter)).await
    }

    pub async fn find(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Share>> {
        SHARES.find(conn, id).await
    }

    pub async fn get(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Share> {
        self.find(conn, id).await?.ok_or(AppError::NotFound)
    }

    pub async fn find_slug(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        slug: &str,
    ) -> Result<Option<Share>> {
        let filter = ShareFilter {
            list: ListOpts::new(1, 1),
            user_id: Some(user_id),
            slugs: vec![slug.to_string()],
            ..Default::default()
        };
        Ok(self.list(conn, &filter).await?.into_iter().next())
    }

    pub async fn create(&self, conn: &mut SqliteConnection, share: &mut Share) -> Result<()> {
        let mut share2 = share.clone();
        share2.id = Uuid::new_v4();
        share2.created_at = Utc::now();
        share2.updated_at = share2.created_at;

        let mut values: Vec<(&str, Value)> =
            vec![("id", share2.id.into()), ("created_at", share2.created_at.into())];
        values.extend(Self::values(&share2));
        SHARES.insert(conn, &values).await?;

        *share = share2;
        Ok(())
    }

    pub async fn update(&self, conn: &mut SqliteConnection, share: &mut Share) -> Result<()> {
        let mut share2 = share.clone();
        share2.updated_at = Utc::now();

        let affected = SHARES.update(conn, share2.id, &Self::values(&share2)).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        *share = share2;
        Ok(())
    }

    /// Physically removes the row. Tag associations and images owned by the
    /// share are the caller's to clear.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<u64> {
        SHARES.delete(conn, &Conditions::new().eq("id", id)).await
    }
}
