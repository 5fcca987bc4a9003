use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PaymentStore {
    pool: SqlitePool,
}

/// Payment state. Checkout creates `Pending`; the processor-return hook
/// marks `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        }
    }
}

/// An application-fee payment record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Payment {
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    pub application_uuid: String,
    pub scholarship_name: String,
    #[serde(skip)]
    pub user_id: i64,
    pub amount: f64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    uuid: String,
    application_uuid: String,
    scholarship_name: String,
    user_id: i64,
    amount: f64,
    status: String,
    transaction_id: Option<String>,
    created_at: String,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            application_uuid: row.application_uuid,
            scholarship_name: row.scholarship_name,
            user_id: row.user_id,
            amount: row.amount,
            status: PaymentStatus::from_str(&row.status),
            transaction_id: row.transaction_id,
            created_at: row.created_at,
        }
    }
}

const SELECT: &str = "SELECT p.id, p.uuid, a.uuid AS application_uuid, s.scholarship_name, \
     p.user_id, p.amount, p.status, p.transaction_id, p.created_at \
     FROM payments p \
     JOIN applications a ON a.id = p.application_id \
     JOIN scholarships s ON s.id = a.scholarship_id";

impl PaymentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pending payment for an application. Returns the row ID.
    pub async fn create(
        &self,
        uuid: &str,
        application_id: i64,
        user_id: i64,
        amount: f64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO payments (uuid, application_id, user_id, amount, status) \
             VALUES (?, ?, ?, ?, 'pending')",
        )
        .bind(uuid)
        .bind(application_id)
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Payment>, sqlx::Error> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{SELECT} WHERE p.uuid = ?"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Payment::from))
    }

    /// Mark a pending payment paid, recording the processor's transaction id.
    /// Returns false if the payment was not pending (no double completion).
    pub async fn mark_paid(&self, uuid: &str, transaction_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'paid', transaction_id = ? \
             WHERE uuid = ? AND status = 'pending'",
        )
        .bind(transaction_id)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Payments made by one user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE p.user_id = ? ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    /// Total collected revenue (paid payments only).
    pub async fn total_revenue(&self) -> Result<f64, sqlx::Error> {
        let row: (Option<f64>,) =
            sqlx::query_as("SELECT SUM(amount) FROM payments WHERE status = 'paid'")
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0.unwrap_or(0.0))
    }
}
