//! Lesson repository
//!
//! Text blocks, documents and quiz questions live in JSON text columns.

use crate::db::DynDatabasePool;
use crate::models::Lesson;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::parse_json_column;

const LESSON_COLUMNS: &str = "id, course_id, module_id, title, title_bn, sort_order, video_url, \
    video_duration, text_content, text_blocks, documents, questions, is_free, created_at, updated_at";

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn create(&self, lesson: &Lesson) -> Result<Lesson>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Lesson>>;

    /// Lessons of a course, by module then order
    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Lesson>>;

    async fn count_by_course(&self, course_id: i64) -> Result<i64>;

    async fn update(&self, lesson: &Lesson) -> Result<Lesson>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxLessonRepository {
    pool: DynDatabasePool,
}

impl SqlxLessonRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LessonRepository> {
        Arc::new(Self::new(pool))
    }
}

struct JsonColumns {
    text_blocks: String,
    documents: String,
    questions: String,
}

impl JsonColumns {
    fn encode(lesson: &Lesson) -> Result<Self> {
        Ok(Self {
            text_blocks: serde_json::to_string(&lesson.text_blocks).context("Failed to encode text blocks")?,
            documents: serde_json::to_string(&lesson.documents).context("Failed to encode documents")?,
            questions: serde_json::to_string(&lesson.questions).context("Failed to encode questions")?,
        })
    }
}

#[async_trait]
impl LessonRepository for SqlxLessonRepository {
    async fn create(&self, lesson: &Lesson) -> Result<Lesson> {
        let json = JsonColumns::encode(lesson)?;
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO lessons (course_id, module_id, title, title_bn, sort_order, video_url, video_duration,
                                 text_content, text_blocks, documents, questions, is_free, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lesson.course_id)
        .bind(lesson.module_id)
        .bind(&lesson.title)
        .bind(&lesson.title_bn)
        .bind(lesson.order)
        .bind(&lesson.video_url)
        .bind(lesson.video_duration)
        .bind(&lesson.text_content)
        .bind(&json.text_blocks)
        .bind(&json.documents)
        .bind(&json.questions)
        .bind(lesson.is_free)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create lesson")?;

        Ok(Lesson {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..lesson.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Lesson>> {
        let sql = format!("SELECT {} FROM lessons WHERE id = ?", LESSON_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get lesson by ID")?;
        row.map(|r| row_to_lesson(&r)).transpose()
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Lesson>> {
        let sql = format!(
            "SELECT {} FROM lessons WHERE course_id = ? ORDER BY module_id, sort_order, id",
            LESSON_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(course_id)
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list lessons")?;
        rows.iter().map(row_to_lesson).collect()
    }

    async fn count_by_course(&self, course_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE course_id = ?")
            .bind(course_id)
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count lessons")
    }

    async fn update(&self, lesson: &Lesson) -> Result<Lesson> {
        let json = JsonColumns::encode(lesson)?;
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE lessons SET module_id = ?, title = ?, title_bn = ?, sort_order = ?, video_url = ?,
                video_duration = ?, text_content = ?, text_blocks = ?, documents = ?, questions = ?,
                is_free = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(lesson.module_id)
        .bind(&lesson.title)
        .bind(&lesson.title_bn)
        .bind(lesson.order)
        .bind(&lesson.video_url)
        .bind(lesson.video_duration)
        .bind(&lesson.text_content)
        .bind(&json.text_blocks)
        .bind(&json.documents)
        .bind(&json.questions)
        .bind(lesson.is_free)
        .bind(now)
        .bind(lesson.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update lesson")?;

        Ok(Lesson {
            updated_at: now,
            ..lesson.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete lesson")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_lesson(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson> {
    let text_blocks: String = row.get("text_blocks");
    let documents: String = row.get("documents");
    let questions: String = row.get("questions");

    Ok(Lesson {
        id: row.get("id"),
        course_id: row.get("course_id"),
        module_id: row.get("module_id"),
        title: row.get("title"),
        title_bn: row.get("title_bn"),
        order: row.get("sort_order"),
        video_url: row.get("video_url"),
        video_duration: row.get("video_duration"),
        text_content: row.get("text_content"),
        text_blocks: parse_json_column(&text_blocks, "text_blocks")?,
        documents: parse_json_column(&documents, "documents")?,
        questions: parse_json_column(&questions, "questions")?,
        is_free: row.get("is_free"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
