use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ApplicationStore {
    pool: SqlitePool,
}

/// Application review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

/// The applicant-supplied form fields of the multi-step application.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationForm {
    pub full_name: String,
    pub phone: String,
    pub dob: String,
    pub previous_degree: String,
    pub cgpa: String,
    pub intake: String,
    pub study_gap: Option<String>,
    pub applied_degree: String,
    pub major: String,
    pub why_university: Option<String>,
    pub country: String,
    pub city: String,
    pub address: String,
    pub zip: String,
}

/// A submitted application.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Application {
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
    pub applicant_email: String,
    pub status: ApplicationStatus,
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub form: ApplicationForm,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    uuid: String,
    scholarship_id: i64,
    scholarship_uuid: String,
    scholarship_name: String,
    university_name: String,
    user_id: i64,
    applicant_email: String,
    status: String,
    feedback: Option<String>,
    full_name: String,
    phone: String,
    dob: String,
    previous_degree: String,
    cgpa: String,
    intake: String,
    study_gap: Option<String>,
    applied_degree: String,
    major: String,
    why_university: Option<String>,
    country: String,
    city: String,
    address: String,
    zip: String,
    created_at: String,
    updated_at: String,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            scholarship_id: row.scholarship_id,
            scholarship_uuid: row.scholarship_uuid,
            scholarship_name: row.scholarship_name,
            university_name: row.university_name,
            user_id: row.user_id,
            applicant_email: row.applicant_email,
            status: ApplicationStatus::from_str(&row.status),
            feedback: row.feedback,
            form: ApplicationForm {
                full_name: row.full_name,
                phone: row.phone,
                dob: row.dob,
                previous_degree: row.previous_degree,
                cgpa: row.cgpa,
                intake: row.intake,
                study_gap: row.study_gap,
                applied_degree: row.applied_degree,
                major: row.major,
                why_university: row.why_university,
                country: row.country,
                city: row.city,
                address: row.address,
                zip: row.zip,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Joined select: application columns plus the listing's display fields and
/// the applicant's email.
const SELECT: &str = "SELECT a.id, a.uuid, a.scholarship_id, s.uuid AS scholarship_uuid, \
     s.scholarship_name, s.university_name, a.user_id, u.email AS applicant_email, a.status, \
     a.feedback, a.full_name, a.phone, a.dob, a.previous_degree, a.cgpa, a.intake, a.study_gap, \
     a.applied_degree, a.major, a.why_university, a.country, a.city, a.address, a.zip, \
     a.created_at, a.updated_at \
     FROM applications a \
     JOIN scholarships s ON s.id = a.scholarship_id \
     JOIN users u ON u.id = a.user_id";

impl ApplicationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Submit an application. Returns the row ID.
    pub async fn create(
        &self,
        uuid: &str,
        scholarship_id: i64,
        user_id: i64,
        form: &ApplicationForm,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO applications (uuid, scholarship_id, user_id, status, full_name, phone, \
             dob, previous_degree, cgpa, intake, study_gap, applied_degree, major, \
             why_university, country, city, address, zip) \
             VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(scholarship_id)
        .bind(user_id)
        .bind(&form.full_name)
        .bind(&form.phone)
        .bind(&form.dob)
        .bind(&form.previous_degree)
        .bind(&form.cgpa)
        .bind(&form.intake)
        .bind(&form.study_gap)
        .bind(&form.applied_degree)
        .bind(&form.major)
        .bind(&form.why_university)
        .bind(&form.country)
        .bind(&form.city)
        .bind(&form.address)
        .bind(&form.zip)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Application>, sqlx::Error> {
        let row: Option<ApplicationRow> = sqlx::query_as(&format!("{SELECT} WHERE a.uuid = ?"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::from))
    }

    /// Whether the user has already applied to the scholarship.
    pub async fn has_applied(
        &self,
        scholarship_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE scholarship_id = ? AND user_id = ?",
        )
        .bind(scholarship_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// All applications submitted by one user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Application>, sqlx::Error> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE a.user_id = ? ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    /// All applications (staff view), optionally filtered by status, newest first.
    pub async fn list_all(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let status = status.map(|s| s.as_str()).unwrap_or("");
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE (?1 = '' OR a.status = ?1) ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    /// Replace the form fields of an application (owner edit while pending).
    pub async fn update_form(&self, uuid: &str, form: &ApplicationForm) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET full_name = ?, phone = ?, dob = ?, previous_degree = ?, \
             cgpa = ?, intake = ?, study_gap = ?, applied_degree = ?, major = ?, \
             why_university = ?, country = ?, city = ?, address = ?, zip = ?, \
             updated_at = datetime('now') WHERE uuid = ?",
        )
        .bind(&form.full_name)
        .bind(&form.phone)
        .bind(&form.dob)
        .bind(&form.previous_degree)
        .bind(&form.cgpa)
        .bind(&form.intake)
        .bind(&form.study_gap)
        .bind(&form.applied_degree)
        .bind(&form.major)
        .bind(&form.why_university)
        .bind(&form.country)
        .bind(&form.city)
        .bind(&form.address)
        .bind(&form.zip)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the review status.
    pub async fn set_status(
        &self,
        uuid: &str,
        status: ApplicationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = datetime('now') WHERE uuid = ?",
        )
        .bind(status.as_str())
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach moderator feedback.
    pub async fn set_feedback(&self, uuid: &str, feedback: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET feedback = ?, updated_at = datetime('now') WHERE uuid = ?",
        )
        .bind(feedback)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applications WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Application counts per university (analytics), highest first.
    pub async fn count_by_university(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT s.university_name, COUNT(*) AS n FROM applications a \
             JOIN scholarships s ON s.id = a.scholarship_id \
             GROUP BY s.university_name ORDER BY n DESC, s.university_name",
        )
        .fetch_all(&self.pool)
        .await
    }
}
