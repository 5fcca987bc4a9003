use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct InquiryStore {
    pool: SqlitePool,
}

/// A contact-form inquiry.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Inquiry {
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
}

impl InquiryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        uuid: &str,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO inquiries (uuid, name, email, message) VALUES (?, ?, ?, ?)")
                .bind(uuid)
                .bind(name)
                .bind(email)
                .bind(message)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn list(&self) -> Result<Vec<Inquiry>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, name, email, message, created_at FROM inquiries \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inquiries WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
