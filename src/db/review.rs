use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ReviewStore {
    pool: SqlitePool,
}

/// A scholarship review left by an applicant.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Review {
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    #[serde(skip)]
    pub scholarship_id: i64,
    pub scholarship_uuid: String,
    pub scholarship_name: String,
    pub university_name: String,
    #[serde(skip)]
    pub user_id: i64,
    pub reviewer_name: String,
    pub reviewer_photo_url: Option<String>,
    pub rating_point: i64,
    pub review_comment: String,
    pub review_date: String,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    uuid: String,
    scholarship_id: i64,
    scholarship_uuid: String,
    scholarship_name: String,
    university_name: String,
    user_id: i64,
    reviewer_name: String,
    reviewer_photo_url: Option<String>,
    rating_point: i64,
    review_comment: String,
    review_date: String,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            scholarship_id: row.scholarship_id,
            scholarship_uuid: row.scholarship_uuid,
            scholarship_name: row.scholarship_name,
            university_name: row.university_name,
            user_id: row.user_id,
            reviewer_name: row.reviewer_name,
            reviewer_photo_url: row.reviewer_photo_url,
            rating_point: row.rating_point,
            review_comment: row.review_comment,
            review_date: row.review_date,
        }
    }
}

const SELECT: &str = "SELECT r.id, r.uuid, r.scholarship_id, s.uuid AS scholarship_uuid, \
     s.scholarship_name, s.university_name, r.user_id, u.name AS reviewer_name, \
     u.photo_url AS reviewer_photo_url, r.rating_point, r.review_comment, r.review_date \
     FROM reviews r \
     JOIN scholarships s ON s.id = r.scholarship_id \
     JOIN users u ON u.id = r.user_id";

impl ReviewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a review. The unique (scholarship, user) index rejects a
    /// second review of the same listing by the same person.
    pub async fn create(
        &self,
        uuid: &str,
        scholarship_id: i64,
        user_id: i64,
        rating_point: i64,
        review_comment: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO reviews (uuid, scholarship_id, user_id, rating_point, review_comment) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(scholarship_id)
        .bind(user_id)
        .bind(rating_point)
        .bind(review_comment)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Review>, sqlx::Error> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!("{SELECT} WHERE r.uuid = ?"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Review::from))
    }

    /// Reviews written by one user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Review>, sqlx::Error> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE r.user_id = ? ORDER BY r.review_date DESC, r.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Reviews for one scholarship, newest first.
    pub async fn list_by_scholarship(
        &self,
        scholarship_id: i64,
    ) -> Result<Vec<Review>, sqlx::Error> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE r.scholarship_id = ? ORDER BY r.review_date DESC, r.id DESC"
        ))
        .bind(scholarship_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// All reviews (moderation view), newest first.
    pub async fn list_all(&self) -> Result<Vec<Review>, sqlx::Error> {
        let rows: Vec<ReviewRow> =
            sqlx::query_as(&format!("{SELECT} ORDER BY r.review_date DESC, r.id DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Replace the rating and comment of a review.
    pub async fn update(
        &self,
        uuid: &str,
        rating_point: i64,
        review_comment: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE reviews SET rating_point = ?, review_comment = ? WHERE uuid = ?")
                .bind(rating_point)
                .bind(review_comment)
                .bind(uuid)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
