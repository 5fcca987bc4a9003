use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ScholarshipStore {
    pool: SqlitePool,
}

/// A scholarship listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow)]
pub struct Scholarship {
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    pub scholarship_name: String,
    pub university_name: String,
    pub university_country: String,
    pub university_city: String,
    pub university_world_rank: Option<i64>,
    pub subject_category: String,
    pub scholarship_category: String,
    pub degree: String,
    pub tuition_fees: Option<f64>,
    pub application_fees: f64,
    pub service_charge: f64,
    pub stipend: Option<f64>,
    /// ISO date (YYYY-MM-DD); lexicographic order is chronological order
    pub application_deadline: String,
    pub post_date: String,
    pub created_at: String,
}

/// Fields accepted when creating or replacing a listing.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScholarshipInput {
    pub scholarship_name: String,
    pub university_name: String,
    pub university_country: String,
    pub university_city: String,
    pub university_world_rank: Option<i64>,
    pub subject_category: String,
    pub scholarship_category: String,
    pub degree: String,
    pub tuition_fees: Option<f64>,
    pub application_fees: f64,
    pub service_charge: f64,
    pub stipend: Option<f64>,
    pub application_deadline: String,
    pub post_date: String,
}

/// Search/browse filters. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct ScholarshipFilter {
    /// Substring match over name, university and degree
    pub search: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

const COLUMNS: &str = "id, uuid, scholarship_name, university_name, university_country, \
     university_city, university_world_rank, subject_category, scholarship_category, degree, \
     tuition_fees, application_fees, service_charge, stipend, application_deadline, post_date, \
     created_at";

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

impl ScholarshipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new listing. Returns the row ID.
    pub async fn create(&self, uuid: &str, input: &ScholarshipInput) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO scholarships (uuid, scholarship_name, university_name, \
             university_country, university_city, university_world_rank, subject_category, \
             scholarship_category, degree, tuition_fees, application_fees, service_charge, \
             stipend, application_deadline, post_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(&input.scholarship_name)
        .bind(&input.university_name)
        .bind(&input.university_country)
        .bind(&input.university_city)
        .bind(input.university_world_rank)
        .bind(&input.subject_category)
        .bind(&input.scholarship_category)
        .bind(&input.degree)
        .bind(input.tuition_fees)
        .bind(input.application_fees)
        .bind(input.service_charge)
        .bind(input.stipend)
        .bind(&input.application_deadline)
        .bind(&input.post_date)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Replace all editable fields of a listing.
    pub async fn update(&self, uuid: &str, input: &ScholarshipInput) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scholarships SET scholarship_name = ?, university_name = ?, \
             university_country = ?, university_city = ?, university_world_rank = ?, \
             subject_category = ?, scholarship_category = ?, degree = ?, tuition_fees = ?, \
             application_fees = ?, service_charge = ?, stipend = ?, application_deadline = ?, \
             post_date = ? WHERE uuid = ?",
        )
        .bind(&input.scholarship_name)
        .bind(&input.university_name)
        .bind(&input.university_country)
        .bind(&input.university_city)
        .bind(input.university_world_rank)
        .bind(&input.subject_category)
        .bind(&input.scholarship_category)
        .bind(&input.degree)
        .bind(input.tuition_fees)
        .bind(input.application_fees)
        .bind(input.service_charge)
        .bind(input.stipend)
        .bind(&input.application_deadline)
        .bind(&input.post_date)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Scholarship>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM scholarships WHERE uuid = ?"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Scholarship>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM scholarships WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scholarships WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Browse listings: optional search/category/country filters, ordered by
    /// soonest deadline first, paginated. Returns the page plus the total
    /// match count so callers can render page controls.
    pub async fn list(
        &self,
        filter: &ScholarshipFilter,
    ) -> Result<(Vec<Scholarship>, i64), sqlx::Error> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
            .unwrap_or_default();
        let category = filter.category.clone().unwrap_or_default();
        let country = filter.country.clone().unwrap_or_default();

        let per_page = match filter.per_page {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let offset = filter.page.saturating_sub(1).max(0) as i64 * per_page as i64;

        const WHERE: &str = "(?1 = '' OR scholarship_name LIKE ?1 OR university_name LIKE ?1 \
             OR degree LIKE ?1) AND (?2 = '' OR scholarship_category = ?2) \
             AND (?3 = '' OR university_country = ?3)";

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM scholarships WHERE {WHERE}"
        ))
        .bind(&search)
        .bind(&category)
        .bind(&country)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<Scholarship> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM scholarships WHERE {WHERE} \
             ORDER BY application_deadline, id LIMIT ?4 OFFSET ?5"
        ))
        .bind(&search)
        .bind(&category)
        .bind(&country)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total.0))
    }

    /// Most recently posted listings for the landing page.
    pub async fn list_latest(&self, limit: u32) -> Result<Vec<Scholarship>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM scholarships ORDER BY post_date DESC, id DESC LIMIT ?"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scholarships")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
