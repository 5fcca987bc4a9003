use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Profile role for authorization.
///
/// The closed set of roles a screen's allow-list can name. Parsing is the
/// single place role strings are canonicalized: comparison everywhere else
/// is enum equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Case-insensitive parse. Unrecognized strings fall back to Student;
    /// callers that must reject bad input use `parse_strict`.
    pub fn from_str(s: &str) -> Self {
        Self::parse_strict(s).unwrap_or(Role::Student)
    }

    /// Case-insensitive parse that rejects unknown role names.
    pub fn parse_strict(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("admin") {
            Some(Role::Admin)
        } else if s.eq_ignore_ascii_case("moderator") {
            Some(Role::Moderator)
        } else if s.eq_ignore_ascii_case("student") {
            Some(Role::Student)
        } else {
            None
        }
    }
}

/// Application profile: the enriched user record issued on identity exchange.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Profile {
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub college: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    uuid: String,
    name: String,
    email: String,
    role: String,
    country: Option<String>,
    phone: Option<String>,
    dob: Option<String>,
    college: Option<String>,
    photo_url: Option<String>,
    created_at: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            email: row.email,
            role: Role::from_str(&row.role),
            country: row.country,
            phone: row.phone,
            dob: row.dob,
            college: row.college,
            photo_url: row.photo_url,
            created_at: row.created_at,
        }
    }
}

const PROFILE_COLUMNS: &str =
    "id, uuid, name, email, role, country, phone, dob, college, photo_url, created_at";

/// Editable profile fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub college: Option<String>,
    pub photo_url: Option<String>,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new profile. Returns the row ID.
    pub async fn create(
        &self,
        uuid: &str,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (uuid, name, email, role) VALUES (?, ?, ?, ?)")
            .bind(uuid)
            .bind(name)
            .bind(email)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a profile by email (emails are unique, case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Profile>, sqlx::Error> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    /// Get a profile by row ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Profile>, sqlx::Error> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Profile::from))
    }

    /// Get a profile by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Profile>, sqlx::Error> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE uuid = ?"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    /// Set the role for a profile.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a partial profile update. Unset fields keep their value.
    pub async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                name = COALESCE(?, name),
                country = COALESCE(?, country),
                phone = COALESCE(?, phone),
                dob = COALESCE(?, dob),
                college = COALESCE(?, college),
                photo_url = COALESCE(?, photo_url)
             WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.country)
        .bind(&update.phone)
        .bind(&update.dob)
        .bind(&update.college)
        .bind(&update.photo_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a profile by row ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all profiles, oldest first (admin dashboard).
    pub async fn list(&self) -> Result<Vec<Profile>, sqlx::Error> {
        let rows: Vec<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    /// Profile counts grouped by role (analytics).
    pub async fn count_by_role(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::from_str("Admin"), Role::Admin);
        assert_eq!(Role::from_str("ADMIN"), Role::Admin);
        assert_eq!(Role::from_str("moderator"), Role::Moderator);
        assert_eq!(Role::from_str("MoDeRaToR"), Role::Moderator);
        assert_eq!(Role::from_str("student"), Role::Student);
    }

    #[test]
    fn test_unknown_role_defaults_to_student() {
        assert_eq!(Role::from_str("superuser"), Role::Student);
        assert_eq!(Role::from_str(""), Role::Student);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert_eq!(Role::parse_strict("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse_strict("superuser"), None);
    }
}
