use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{debug, info};

use authz::types::{ResourceOwnership, SubmissionsFilter};
use authz::UserId;

use crate::{Database, DatabaseError, Result};

/// A submitted item awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub submitter_id: i64,
    pub title: String,
}

/// A file uploaded as part of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubmissionFile {
    pub id: i64,
    pub submission_id: i64,
    pub submitter_id: i64,
    pub filename: String,
}

impl Database {
    pub async fn create_submission(&self, submitter_id: UserId, title: &str) -> Result<i64> {
        if title.trim().is_empty() {
            return Err(DatabaseError::Validation(
                "submission title must not be empty".to_string(),
            ));
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO submissions (submitter_id, title) VALUES (?, ?) RETURNING id",
        )
        .bind(submitter_id.0)
        .bind(title)
        .fetch_one(self.pool())
        .await?;

        info!(submitter_id = %submitter_id, submission_id = id, "Submission created");
        Ok(id)
    }

    /// Attaches a file to a submission. The file inherits the submission's submitter.
    pub async fn add_file(&self, submission_id: i64, filename: &str) -> Result<i64> {
        let submitter_id: Option<i64> =
            sqlx::query_scalar("SELECT submitter_id FROM submissions WHERE id = ?")
                .bind(submission_id)
                .fetch_optional(self.pool())
                .await?;
        let submitter_id = submitter_id.ok_or(DatabaseError::SubmissionNotFound(submission_id))?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO submission_files (submission_id, submitter_id, filename) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(submission_id)
        .bind(submitter_id)
        .bind(filename)
        .fetch_one(self.pool())
        .await?;

        debug!(submission_id, file_id = id, "File added to submission");
        Ok(id)
    }

    pub async fn get_submission(&self, submission_id: i64) -> Result<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            "SELECT id, submitter_id, title FROM submissions WHERE id = ?",
        )
        .bind(submission_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(submission)
    }

    /// Submissions matching every set field of `filter`, ordered by id.
    pub async fn search_submissions(&self, filter: SubmissionsFilter) -> Result<Vec<Submission>> {
        let mut sql = String::from("SELECT id, submitter_id, title FROM submissions");
        let mut conditions = Vec::new();
        if filter.submission_id.is_some() {
            conditions.push("id = ?");
        }
        if filter.submitter_id.is_some() {
            conditions.push("submitter_id = ?");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query_as::<_, Submission>(&sql);
        if let Some(id) = filter.submission_id {
            query = query.bind(id);
        }
        if let Some(submitter) = filter.submitter_id {
            query = query.bind(submitter.0);
        }

        Ok(query.fetch_all(self.pool()).await?)
    }

    /// Files with the given ids. Unknown ids are left out of the result.
    pub async fn get_submission_files(&self, ids: &[i64]) -> Result<Vec<SubmissionFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, submission_id, submitter_id, filename FROM submission_files WHERE id IN ({}) ORDER BY id",
            placeholders
        );

        let mut query = sqlx::query_as::<_, SubmissionFile>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(self.pool()).await?)
    }
}

impl From<&Submission> for ResourceOwnership {
    fn from(s: &Submission) -> Self {
        ResourceOwnership {
            id: s.id,
            submitter_id: UserId(s.submitter_id),
        }
    }
}

impl From<&SubmissionFile> for ResourceOwnership {
    fn from(f: &SubmissionFile) -> Self {
        ResourceOwnership {
            id: f.id,
            submitter_id: UserId(f.submitter_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (Database, i64, i64, i64) {
        let db = Database::in_memory().await.unwrap();
        let a = db.create_submission(UserId(1), "Alpha").await.unwrap();
        let b = db.create_submission(UserId(1), "Beta").await.unwrap();
        let c = db.create_submission(UserId(2), "Gamma").await.unwrap();
        (db, a, b, c)
    }

    #[tokio::test]
    async fn test_search_by_id() {
        let (db, a, _, _) = seeded().await;
        let found = db.search_submissions(SubmissionsFilter::by_id(a)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Alpha");

        let missing = db
            .search_submissions(SubmissionsFilter::by_id(9999))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_submitter() {
        let (db, a, b, _) = seeded().await;
        let mine = db
            .search_submissions(SubmissionsFilter::by_submitter(UserId(1)))
            .await
            .unwrap();
        let ids: Vec<i64> = mine.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_search_with_both_filters() {
        let (db, _, _, c) = seeded().await;
        let filter = SubmissionsFilter {
            submission_id: Some(c),
            submitter_id: Some(UserId(1)),
        };
        assert!(db.search_submissions(filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_search_returns_all() {
        let (db, _, _, _) = seeded().await;
        let all = db
            .search_submissions(SubmissionsFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_files_inherit_submitter() {
        let (db, _, _, c) = seeded().await;
        let fid = db.add_file(c, "gamma.zip").await.unwrap();

        let files = db.get_submission_files(&[fid, 12345]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].submitter_id, 2);
        assert_eq!(files[0].submission_id, c);
    }

    #[tokio::test]
    async fn test_add_file_to_missing_submission() {
        let db = Database::in_memory().await.unwrap();
        let result = db.add_file(77, "nothing.zip").await;
        assert!(matches!(result, Err(DatabaseError::SubmissionNotFound(77))));
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let db = Database::in_memory().await.unwrap();
        let result = db.create_submission(UserId(1), "   ").await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_submission() {
        let (db, a, _, _) = seeded().await;
        let s = db.get_submission(a).await.unwrap().unwrap();
        assert_eq!(s.submitter_id, 1);
        assert!(db.get_submission(4242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_file_id_list() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.get_submission_files(&[]).await.unwrap().is_empty());
    }
}
