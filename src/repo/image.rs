use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Image, ImageFilter, ImageMeta, Morphable};
use crate::repo::query::{self, Conditions, Table, Value};

pub const IMAGES: Table = Table {
    name: "images",
    columns: &[
        "id",
        "target_id",
        "target_name",
        "content",
        "description",
        "size",
        "content_type",
        "created_at",
        "updated_at",
    ],
    order_by: "images.created_at ASC",
};

const META_COLUMNS: &str = "images.id, images.target_id, images.target_name, images.description, \
                            images.size, images.content_type, images.created_at, images.updated_at";

#[derive(Clone, Copy, Default)]
pub struct ImageRepository;

impl ImageRepository {
    pub fn new() -> Self {
        Self
    }

    fn conditions(filter: &ImageFilter) -> Conditions {
        Conditions::new()
            .any_of("images.id", filter.ids.iter().copied())
            .any_of("images.target_id", filter.target_ids.iter().copied())
            .eq_opt("images.target_name", filter.target_name.as_deref())
    }

    fn values(image: &Image) -> Vec<(&'static str, Value)> {
        vec![
            ("target_id", image.target_id.into()),
            ("target_name", image.target_name.clone().into()),
            ("content", image.content.clone().into()),
            ("description", image.description.clone().into()),
            ("size", image.size.into()),
            ("content_type", image.content_type.clone().into()),
            ("updated_at", image.updated_at.into()),
        ]
    }

    pub async fn list(&self, conn: &mut SqliteConnection, filter: &ImageFilter) -> Result<Vec<Image>> {
        IMAGES.list(conn, &Self::conditions(filter), filter.list).await
    }

    /// Same rows as [`list`](Self::list) without loading the blobs.
    pub async fn list_meta(
        &self,
        conn: &mut SqliteConnection,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageMeta>> {
        let conds = Self::conditions(filter);
        let mut qb = query::select(META_COLUMNS, IMAGES.name, &conds, IMAGES.order_by, filter.list);
        let rows = qb
            .build_query_as::<ImageMeta>()
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
    ) -> Result<Vec<ImageMeta>> {
        let filter = ImageFilter {
            target_ids: vec![target.morph_key()],
            target_name: Some(target.morph_name().to_string()),
            ..Default::default()
        };
        self.list_meta(conn, &filter).await
    }

    pub async fn count(&self, conn: &mut SqliteConnection, filter: &ImageFilter) -> Result<i64> {
        IMAGES.count(conn, &Self::conditions(filter)).await
    }

    pub async fn find(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Image>> {
        IMAGES.find(conn, id).await
    }

    /// Inserts `image`; `size` is taken from the content, not the caller.
    pub async fn create(&self, conn: &mut SqliteConnection, image: &mut Image) -> Result<()> {
        let mut image2 = image.clone();
        image2.id = Uuid::new_v4();
        image2.size = image2.content.len() as i64;
        image2.created_at = Utc::now();
        image2.updated_at = image2.created_at;

        let mut values: Vec<(&str, Value)> =
            vec![("id", image2.id.into()), ("created_at", image2.created_at.into())];
        values.extend(Self::values(&image2));
        IMAGES.insert(conn, &values).await?;

        *image = image2;
        Ok(())
    }

    pub async fn update(&self, conn: &mut SqliteConnection, image: &mut Image) -> Result<()> {
        let mut image2 = image.clone();
        image2.size = image2.content.len() as i64;
        image2.updated_at = Utc::now();

        let affected = IMAGES.update(conn, image2.id, &Self::values(&image2)).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        *image = image2;
        Ok(())
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<u64> {
        IMAGES.delete(conn, &Conditions::new().eq("id", id)).await
    }

    /// Removes every image owned by `target`.
    pub async fn delete_for(&self, conn: &mut SqliteConnection, target: &impl Morphable) -> Result<u64> {
        let conds = Conditions::new()
            .eq("target_id", target.morph_key())
            .eq("target_name", target.morph_name());
        IMAGES.delete(conn, &conds).await
    }
}
