/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    /// - unique violation (`23505`) → `Conflict(what)`
    /// - foreign key violation (`23503`) → `NotFound(<referenced table>)`, read from the
    ///   constraint name (`tasks_project_id_fkey` → "project", `*_owner_id_fkey` → "user")
    /// - anything else stays `Db`
    pub fn from_sqlx(e: sqlx::Error, what: &'static str) -> Self {
        if let sqlx::Error::Database(dbe) = &e {
            match dbe.code().as_deref() {
                Some("23505") => return RepoError::Conflict(what),
                Some("23503") => {
                    let constraint = dbe.constraint().unwrap_or_default();
                    let referenced = if constraint.ends_with("project_id_fkey") {
                        "project"
                    } else if constraint.ends_with("role_id_fkey") {
                        "role"
                    } else {
                        // owner_id / user_id
                        "user"
                    };
                    return RepoError::NotFound(referenced);
                }
                _ => {}
            }
        }
        RepoError::Db(e)
    }
}
