//! Group repository implementation

use sqlx::PgPool;

use crate::models::group::Group;
use crate::models::user::User;
use crate::utils::errors::TuneCircleError;

#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group and enroll the creator as its first member
    pub async fn create(&self, name: &str, creator_id: i64) -> Result<Group, TuneCircleError> {
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, creator_id)
            VALUES ($1, $2)
            RETURNING id, name, creator_id, created_at
            "#,
        )
        .bind(name)
        .bind(creator_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_members (user_id, group_id) VALUES ($1, $2)")
            .bind(creator_id)
            .bind(group.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(group)
    }

    /// Find group by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Group>, TuneCircleError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, creator_id, created_at FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// How many groups this user has created, for the creation cap
    pub async fn count_created_by(&self, user_id: i64) -> Result<i64, TuneCircleError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups WHERE creator_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// All groups the user is a member of, creation order
    pub async fn groups_of(&self, user_id: i64) -> Result<Vec<Group>, TuneCircleError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.creator_id, g.created_at
            FROM groups g
            JOIN group_members m ON m.group_id = g.id
            WHERE m.user_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// All members of a group
    pub async fn members(&self, group_id: i64) -> Result<Vec<User>, TuneCircleError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.token, u.count_of_sharing, u.count_of_ratings, u.created_at
            FROM users u
            JOIN group_members m ON m.user_id = u.id
            WHERE m.group_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn member_count(&self, group_id: i64) -> Result<i64, TuneCircleError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    pub async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, TuneCircleError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Add a member. Idempotent for users already enrolled.
    pub async fn add_member(&self, group_id: i64, user_id: i64) -> Result<(), TuneCircleError> {
        sqlx::query(
            r#"
            INSERT INTO group_members (user_id, group_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, group_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_member(&self, group_id: i64, user_id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a group. Memberships and playlist bindings cascade away,
    /// shared music keeps its rows with a NULLed group reference.
    pub async fn delete(&self, group_id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
