use async_trait::async_trait;
use pathway_core::model::{UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::{
    CourseList, conn, encode_course, map_course_row, map_user_row, position_to_i64,
};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query("SELECT id, name, credential FROM users WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut profile = map_user_row(&row)?;

        let rows = sqlx::query(
            r"
            SELECT list, payload
            FROM profile_courses
            WHERE user_id = ?1
            ORDER BY list ASC, position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        for row in &rows {
            let (list, course) = map_course_row(row)?;
            match list {
                CourseList::History => profile.history.push(course),
                CourseList::Saved => profile.saved.push(course),
            }
        }

        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO users (id, name, credential, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                credential = excluded.credential,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.id.as_str())
        .bind(profile.name.as_str())
        .bind(profile.credential.as_deref())
        .bind(self.clock.now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM profile_courses WHERE user_id = ?1")
            .bind(profile.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        let lists = [
            (CourseList::History, &profile.history),
            (CourseList::Saved, &profile.saved),
        ];
        for (list, courses) in lists {
            for (position, course) in courses.iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO profile_courses (user_id, list, position, course_id, payload)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                )
                .bind(profile.id.as_str())
                .bind(list.as_str())
                .bind(position_to_i64(position)?)
                .bind(course.course_id.as_str())
                .bind(encode_course(course)?)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
