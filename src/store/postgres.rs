use async_trait::async_trait;
use edumanage_models::{
    Actor, ActorId, CourseId, Enrollment, ExtensionId, ExtensionKind, ProfileRole,
    ProvisionedProfile, RoleExtension, RoleProfile,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{ProfileStore, RelationshipStore};
use crate::modules::access::{Predicate, ScopeKey};
use crate::utils::errors::{StoreError, StoreResult};

/// Policy store backed by the tables in `migrations/`.
#[derive(Clone, Debug)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const EXTENSION_COLUMNS: &str = "id, actor_id, kind, business_id, created_at";
const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, is_active, enrolled_at";

/// Insert-if-absent for an extension inside the caller's transaction.
///
/// The business number comes from `role_extension_number_seq`; a lost race
/// burns a number but never creates a second row.
async fn get_or_create_extension(
    tx: &mut Transaction<'_, Postgres>,
    actor: ActorId,
    kind: ExtensionKind,
) -> StoreResult<RoleExtension> {
    let inserted = sqlx::query_as::<_, RoleExtension>(
        r#"
        WITH next AS (SELECT nextval('role_extension_number_seq') AS n)
        INSERT INTO role_extensions (id, actor_id, kind, business_id)
        SELECT $1, $2, $3, $4 || lpad(next.n::text, greatest(6, length(next.n::text)), '0')
        FROM next
        ON CONFLICT (actor_id, kind) DO NOTHING
        RETURNING id, actor_id, kind, business_id, created_at
        "#,
    )
    .bind(ExtensionId::new())
    .bind(actor)
    .bind(kind)
    .bind(kind.business_prefix())
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(extension) = inserted {
        debug!(%actor, %kind, business_id = %extension.business_id, "created role extension");
        return Ok(extension);
    }

    sqlx::query_as::<_, RoleExtension>(&format!(
        "SELECT {EXTENSION_COLUMNS} FROM role_extensions WHERE actor_id = $1 AND kind = $2"
    ))
    .bind(actor)
    .bind(kind)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| {
        StoreError::Inconsistent(format!(
            "{kind} extension for {actor} neither inserted nor found"
        ))
    })
}

fn map_actor_fk(actor: ActorId) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::UnknownActor(actor)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl RelationshipStore for PgPolicyStore {
    #[instrument(skip(self))]
    async fn find_extension(
        &self,
        actor: ActorId,
        kind: ExtensionKind,
    ) -> StoreResult<Option<RoleExtension>> {
        let extension = sqlx::query_as::<_, RoleExtension>(&format!(
            "SELECT {EXTENSION_COLUMNS} FROM role_extensions WHERE actor_id = $1 AND kind = $2"
        ))
        .bind(actor)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(extension)
    }

    #[instrument(skip(self))]
    async fn courses_taught_by(&self, teacher: ExtensionId) -> StoreResult<Vec<CourseId>> {
        let courses = sqlx::query_scalar::<_, CourseId>(
            "SELECT id FROM courses WHERE instructor_id = $1 ORDER BY id",
        )
        .bind(teacher)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    #[instrument(skip(self, courses), fields(courses = courses.len()))]
    async fn active_enrollments_in(&self, courses: &[CourseId]) -> StoreResult<Vec<Enrollment>> {
        if courses.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments \
             WHERE course_id = ANY($1) AND is_active"
        ))
        .bind(courses.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn active_enrollments_of(&self, student: ExtensionId) -> StoreResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments \
             WHERE student_id = $1 AND is_active"
        ))
        .bind(student)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ProfileStore for PgPolicyStore {
    #[instrument(skip(self))]
    async fn find_actor(&self, actor: ActorId) -> StoreResult<Option<Actor>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.is_superuser, a.is_staff,
                   p.role, p.created_at, p.updated_at
            FROM actors a
            LEFT JOIN role_profiles p ON p.actor_id = a.id
            WHERE a.id = $1
            "#,
        )
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: Option<ProfileRole> = row.try_get("role")?;
        let profile = match role {
            Some(role) => Some(RoleProfile {
                actor_id: actor,
                role,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            }),
            None => None,
        };

        Ok(Some(Actor {
            id: row.try_get("id")?,
            is_superuser: row.try_get("is_superuser")?,
            is_staff_flag: row.try_get("is_staff")?,
            profile,
        }))
    }

    #[instrument(skip(self))]
    async fn find_profile(&self, actor: ActorId) -> StoreResult<Option<RoleProfile>> {
        let profile = sqlx::query_as::<_, RoleProfile>(
            "SELECT actor_id, role, created_at, updated_at FROM role_profiles WHERE actor_id = $1",
        )
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn find_extension_by_id(&self, id: ExtensionId) -> StoreResult<Option<RoleExtension>> {
        let extension = sqlx::query_as::<_, RoleExtension>(&format!(
            "SELECT {EXTENSION_COLUMNS} FROM role_extensions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(extension)
    }

    #[instrument(skip(self))]
    async fn list_extensions(&self, actor: ActorId) -> StoreResult<Vec<RoleExtension>> {
        let extensions = sqlx::query_as::<_, RoleExtension>(&format!(
            "SELECT {EXTENSION_COLUMNS} FROM role_extensions \
             WHERE actor_id = $1 ORDER BY created_at, substring(business_id from 4)::bigint"
        ))
        .bind(actor)
        .fetch_all(&self.pool)
        .await?;
        Ok(extensions)
    }

    #[instrument(skip(self))]
    async fn provision(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> StoreResult<ProvisionedProfile> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, RoleProfile>(
            r#"
            INSERT INTO role_profiles (actor_id, role)
            VALUES ($1, $2)
            ON CONFLICT (actor_id) DO NOTHING
            RETURNING actor_id, role, created_at, updated_at
            "#,
        )
        .bind(actor)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_actor_fk(actor))?;

        let (profile, changed) = match inserted {
            Some(profile) => (profile, true),
            None => {
                let existing = sqlx::query_as::<_, RoleProfile>(
                    r#"
                    SELECT actor_id, role, created_at, updated_at
                    FROM role_profiles
                    WHERE actor_id = $1
                    FOR SHARE
                    "#,
                )
                .bind(actor)
                .fetch_one(&mut *tx)
                .await?;
                (existing, false)
            }
        };

        if profile.role != role {
            tx.rollback().await?;
            return Ok(ProvisionedProfile {
                profile,
                extension: None,
                changed: false,
            });
        }

        let extension = match role.extension_kind() {
            Some(kind) => Some(get_or_create_extension(&mut tx, actor, kind).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(ProvisionedProfile {
            profile,
            extension,
            changed,
        })
    }

    #[instrument(skip(self))]
    async fn switch_role(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> StoreResult<Option<ProvisionedProfile>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, RoleProfile>(
            r#"
            SELECT actor_id, role, created_at, updated_at
            FROM role_profiles
            WHERE actor_id = $1
            FOR UPDATE
            "#,
        )
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let changed = current.role != role;
        let profile = if changed {
            sqlx::query_as::<_, RoleProfile>(
                r#"
                UPDATE role_profiles
                SET role = $2, updated_at = NOW()
                WHERE actor_id = $1
                RETURNING actor_id, role, created_at, updated_at
                "#,
            )
            .bind(actor)
            .bind(role)
            .fetch_one(&mut *tx)
            .await?
        } else {
            current
        };

        let extension = match role.extension_kind() {
            Some(kind) => Some(get_or_create_extension(&mut tx, actor, kind).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(Some(ProvisionedProfile {
            profile,
            extension,
            changed,
        }))
    }
}

/// Appends a scope predicate to a query as a boolean SQL expression.
///
/// `id_column` is the column holding the resource id; ownership fields are
/// expected to be columns of the same name. Callers should skip the query
/// entirely when [`Predicate::matches_nothing`] is true.
///
/// ```ignore
/// let mut query = QueryBuilder::new("SELECT * FROM messages WHERE ");
/// push_scope(&mut query, &predicate, "id");
/// ```
pub fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate, id_column: &str) {
    match predicate {
        Predicate::MatchAll => {
            builder.push("TRUE");
        }
        Predicate::MatchNone => {
            builder.push("FALSE");
        }
        Predicate::KeyIn { key, ids } => {
            let values: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
            let columns: Vec<&str> = match key {
                ScopeKey::Id => vec![id_column],
                ScopeKey::Owner(fields) => fields.to_vec(),
            };

            if columns.is_empty() {
                builder.push("FALSE");
                return;
            }

            builder.push("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(*column);
                builder.push(" = ANY(");
                builder.push_bind(values.clone());
                builder.push(")");
            }
            builder.push(")");
        }
    }
}
