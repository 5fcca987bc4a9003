mod application;
mod inquiry;
mod payment;
mod review;
mod scholarship;
mod session;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use application::{Application, ApplicationForm, ApplicationStatus, ApplicationStore};
pub use inquiry::{Inquiry, InquiryStore};
pub use payment::{Payment, PaymentStatus, PaymentStore};
pub use review::{Review, ReviewStore};
pub use scholarship::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Scholarship, ScholarshipFilter, ScholarshipInput,
    ScholarshipStore,
};
pub use session::{ActiveSession, SessionTokenStore};
pub use user::{Profile, ProfileUpdate, Role, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        if version < 2 {
            self.migrate_v2().await?;
        }

        if version < 3 {
            self.migrate_v3().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Profiles
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    role TEXT NOT NULL DEFAULT 'student',
                    country TEXT,
                    phone TEXT,
                    dob TEXT,
                    college TEXT,
                    photo_url TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_uuid ON users(uuid)",
                "CREATE INDEX idx_users_email ON users(email)",
                // Active session tokens
                "CREATE TABLE sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    jti TEXT UNIQUE NOT NULL,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    issued_at TEXT NOT NULL,
                    expires_at TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_sessions_jti ON sessions(jti)",
                "CREATE INDEX idx_sessions_user_id ON sessions(user_id)",
                "CREATE INDEX idx_sessions_expires_at ON sessions(expires_at)",
            ],
        )
        .await
    }

    async fn migrate_v2(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            2,
            &[
                // Scholarship listings
                "CREATE TABLE scholarships (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    scholarship_name TEXT NOT NULL,
                    university_name TEXT NOT NULL,
                    university_country TEXT NOT NULL,
                    university_city TEXT NOT NULL,
                    university_world_rank INTEGER,
                    subject_category TEXT NOT NULL,
                    scholarship_category TEXT NOT NULL,
                    degree TEXT NOT NULL,
                    tuition_fees REAL,
                    application_fees REAL NOT NULL,
                    service_charge REAL NOT NULL,
                    stipend REAL,
                    application_deadline TEXT NOT NULL,
                    post_date TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_scholarships_uuid ON scholarships(uuid)",
                "CREATE INDEX idx_scholarships_deadline ON scholarships(application_deadline)",
                "CREATE INDEX idx_scholarships_post_date ON scholarships(post_date)",
                // Applications
                "CREATE TABLE applications (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    scholarship_id INTEGER NOT NULL REFERENCES scholarships(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    status TEXT NOT NULL DEFAULT 'pending',
                    feedback TEXT,
                    full_name TEXT NOT NULL,
                    phone TEXT NOT NULL,
                    dob TEXT NOT NULL,
                    previous_degree TEXT NOT NULL,
                    cgpa TEXT NOT NULL,
                    intake TEXT NOT NULL,
                    study_gap TEXT,
                    applied_degree TEXT NOT NULL,
                    major TEXT NOT NULL,
                    why_university TEXT,
                    country TEXT NOT NULL,
                    city TEXT NOT NULL,
                    address TEXT NOT NULL,
                    zip TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_applications_uuid ON applications(uuid)",
                "CREATE INDEX idx_applications_user_id ON applications(user_id)",
                "CREATE INDEX idx_applications_status ON applications(status)",
                // Reviews (one per user per scholarship)
                "CREATE TABLE reviews (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    scholarship_id INTEGER NOT NULL REFERENCES scholarships(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    rating_point INTEGER NOT NULL,
                    review_comment TEXT NOT NULL,
                    review_date TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE UNIQUE INDEX idx_reviews_scholarship_user ON reviews(scholarship_id, user_id)",
                "CREATE INDEX idx_reviews_user_id ON reviews(user_id)",
                // Payments
                "CREATE TABLE payments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    amount REAL NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    transaction_id TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_payments_uuid ON payments(uuid)",
                "CREATE INDEX idx_payments_user_id ON payments(user_id)",
            ],
        )
        .await
    }

    async fn migrate_v3(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            3,
            &[
                // Contact-form inquiries
                "CREATE TABLE inquiries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    message TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_inquiries_uuid ON inquiries(uuid)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the session token store.
    pub fn sessions(&self) -> SessionTokenStore {
        SessionTokenStore::new(self.pool.clone())
    }

    /// Get the scholarship store.
    pub fn scholarships(&self) -> ScholarshipStore {
        ScholarshipStore::new(self.pool.clone())
    }

    /// Get the application store.
    pub fn applications(&self) -> ApplicationStore {
        ApplicationStore::new(self.pool.clone())
    }

    /// Get the review store.
    pub fn reviews(&self) -> ReviewStore {
        ReviewStore::new(self.pool.clone())
    }

    /// Get the payment store.
    pub fn payments(&self) -> PaymentStore {
        PaymentStore::new(self.pool.clone())
    }

    /// Get the inquiry store.
    pub fn inquiries(&self) -> InquiryStore {
        InquiryStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
