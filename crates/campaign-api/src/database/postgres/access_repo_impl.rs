use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use super::{begin_snapshot, push_contains, push_equals, push_page};
use crate::database::constraints::db_err;
use crate::database::references::{ensure_live, LiveRef};
use crate::domain::{
    DomainError, Permission, Role, RoleInput, User, UserCredentials, UserFilter, UserRecord,
    UserSession,
};
use crate::repositories::AccessRepository;
use crate::utils::{PageRequest, Paged};

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.name, u.role_id, r.name AS role_name, u.created_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

const ROLE_SELECT: &str = r#"
    SELECT r.id, r.name,
           COALESCE(
               array_agg(p.key::TEXT ORDER BY p.key) FILTER (WHERE p.key IS NOT NULL),
               '{}'::TEXT[]
           ) AS permissions,
           r.created_at
    FROM roles r
    LEFT JOIN role_permissions rp ON rp.role_id = r.id
    LEFT JOIN permissions p ON p.id = rp.permission_id
"#;

pub struct PgAccessRepository {
    pool: PgPool,
}

impl PgAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    username: String,
    name: String,
    role_id: i32,
    role_name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            name: row.name,
            role_id: row.role_id,
            role_name: row.role_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i32,
    name: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
            permissions: row.permissions,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i32,
    key: String,
    description: String,
}

fn user_not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Usuario {} no encontrado", id))
}

fn role_not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Rol {} no encontrado", id))
}

async fn fetch_user<'e, E>(executor: E, id: i32) -> Result<Option<User>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE u.id = $1 AND u.deleted_at IS NULL", USER_SELECT);
    let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(User::from))
}

async fn fetch_role<'e, E>(executor: E, id: i32) -> Result<Option<Role>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "{} WHERE r.id = $1 AND r.deleted_at IS NULL GROUP BY r.id",
        ROLE_SELECT
    );
    let row: Option<RoleRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(Role::from))
}

async fn role_permission_keys<'e, E>(executor: E, role_id: i32) -> Result<Vec<String>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        r#"
        SELECT p.key FROM role_permissions rp
        JOIN permissions p ON p.id = rp.permission_id
        WHERE rp.role_id = $1
        ORDER BY p.key
        "#,
    )
    .bind(role_id)
    .fetch_all(executor)
    .await
}

/// Replaces the role's permission set with the given keys.
async fn replace_permissions(
    conn: &mut PgConnection,
    role_id: i32,
    keys: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, p.id FROM permissions p WHERE p.key = ANY($2)
        "#,
    )
    .bind(role_id)
    .bind(keys)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE u.deleted_at IS NULL");
    push_contains(qb, "u.username", &filter.username);
    push_equals(qb, "u.role_id", filter.role_id);
}

#[async_trait]
impl AccessRepository for PgAccessRepository {
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DomainError> {
        let row: Option<CredentialsRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.name, u.role_id, r.name AS role_name, u.created_at,
                   u.password_hash
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.username = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding credentials"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let permissions = role_permission_keys(&self.pool, row.user.role_id)
            .await
            .map_err(db_err("loading permissions"))?;

        Ok(Some(UserCredentials {
            user: row.user.into(),
            password_hash: row.password_hash,
            permissions,
        }))
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, DomainError> {
        fetch_user(&self.pool, id).await.map_err(db_err("finding user"))
    }

    async fn find_session(&self, user_id: i32) -> Result<Option<UserSession>, DomainError> {
        let sql = format!(
            "{} WHERE u.id = $1 AND u.deleted_at IS NULL AND r.deleted_at IS NULL",
            USER_SELECT
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("loading session"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let permissions = role_permission_keys(&self.pool, row.role_id)
            .await
            .map_err(db_err("loading permissions"))?;

        Ok(Some(UserSession {
            user: row.into(),
            permissions,
        }))
    }

    async fn count_users(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("counting users"))
    }

    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Paged<User>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing users"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_user_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting users"))?;

        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        push_user_filters(&mut select, filter);
        push_page(&mut select, "u.username, u.id", page);
        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing users"))?;

        tx.commit().await.map_err(db_err("listing users"))?;
        Ok(Paged::new(rows.into_iter().map(User::from).collect(), total))
    }

    async fn create_user(&self, record: &UserRecord) -> Result<User, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating user"))?;
        ensure_live(&mut tx, LiveRef::Role, record.role_id).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, name, password_hash, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&record.username)
        .bind(&record.name)
        .bind(&record.password_hash)
        .bind(record.role_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("creating user"))?;

        let user = fetch_user(&mut *tx, id)
            .await
            .map_err(db_err("creating user"))?
            .ok_or_else(|| user_not_found(id))?;
        tx.commit().await.map_err(db_err("creating user"))?;
        Ok(user)
    }

    async fn update_user(&self, id: i32, record: &UserRecord) -> Result<User, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating user"))?;
        ensure_live(&mut tx, LiveRef::Role, record.role_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, name = $2, role_id = $3,
                password_hash = COALESCE($4, password_hash), updated_at = NOW()
            WHERE id = $5 AND deleted_at IS NULL
            "#,
        )
        .bind(&record.username)
        .bind(&record.name)
        .bind(record.role_id)
        .bind(&record.password_hash)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("updating user"))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        let user = fetch_user(&mut *tx, id)
            .await
            .map_err(db_err("updating user"))?
            .ok_or_else(|| user_not_found(id))?;
        tx.commit().await.map_err(db_err("updating user"))?;
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("deleting user"))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn list_roles(&self, page: PageRequest) -> Result<Paged<Role>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing roles"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting roles"))?;

        let mut select = QueryBuilder::<Postgres>::new(ROLE_SELECT);
        select.push(" WHERE r.deleted_at IS NULL GROUP BY r.id");
        push_page(&mut select, "r.name, r.id", page);
        let rows = select
            .build_query_as::<RoleRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing roles"))?;

        tx.commit().await.map_err(db_err("listing roles"))?;
        Ok(Paged::new(rows.into_iter().map(Role::from).collect(), total))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        let sql = format!(
            "{} WHERE r.name = $1 AND r.deleted_at IS NULL GROUP BY r.id",
            ROLE_SELECT
        );
        let row: Option<RoleRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("finding role"))?;
        Ok(row.map(Role::from))
    }

    async fn create_role(&self, input: &RoleInput) -> Result<Role, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating role"))?;

        let id: i32 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("creating role"))?;
        replace_permissions(&mut tx, id, &input.permissions)
            .await
            .map_err(db_err("assigning role permissions"))?;

        let role = fetch_role(&mut *tx, id)
            .await
            .map_err(db_err("creating role"))?
            .ok_or_else(|| role_not_found(id))?;
        tx.commit().await.map_err(db_err("creating role"))?;
        Ok(role)
    }

    async fn update_role(&self, id: i32, input: &RoleInput) -> Result<Role, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating role"))?;

        let result = sqlx::query("UPDATE roles SET name = $1 WHERE id = $2 AND deleted_at IS NULL")
            .bind(&input.name)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("updating role"))?;
        if result.rows_affected() == 0 {
            return Err(role_not_found(id));
        }
        replace_permissions(&mut tx, id, &input.permissions)
            .await
            .map_err(db_err("assigning role permissions"))?;

        let role = fetch_role(&mut *tx, id)
            .await
            .map_err(db_err("updating role"))?
            .ok_or_else(|| role_not_found(id))?;
        tx.commit().await.map_err(db_err("updating role"))?;
        Ok(role)
    }

    async fn delete_role(&self, id: i32) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("deleting role"))?;

        let holders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("deleting role"))?;
        if holders > 0 {
            return Err(DomainError::validation(format!(
                "No se puede eliminar el rol: {} usuario(s) lo tienen asignado.",
                holders
            )));
        }

        let result = sqlx::query("UPDATE roles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("deleting role"))?;
        if result.rows_affected() == 0 {
            return Err(role_not_found(id));
        }

        tx.commit().await.map_err(db_err("deleting role"))?;
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        let rows: Vec<PermissionRow> =
            sqlx::query_as("SELECT id, key, description FROM permissions ORDER BY key")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err("listing permissions"))?;
        Ok(rows
            .into_iter()
            .map(|r| Permission {
                id: r.id,
                key: r.key,
                description: r.description,
            })
            .collect())
    }
}
