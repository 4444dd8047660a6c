use crate::errors::{AppError, ResultExt};
use crate::models::{EmailType, MailChimpList, MailChimpMember, MemberFields, MemberStatus};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Read access to locally mirrored lists.
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Finds a list by the identifier MailChimp assigned to it.
    async fn find_by_external_id(&self, mailchimp_id: &str)
        -> Result<Option<MailChimpList>, AppError>;
}

/// Local member mirror, keyed by the generated member id.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MailChimpMember>, AppError>;

    /// Inserts the member, or replaces every column of an existing one.
    async fn save(&self, member: &MailChimpMember) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

/// Postgres-backed list lookups (`mailchimp_lists`).
#[derive(Clone)]
pub struct PgListStore {
    pool: PgPool,
}

impl PgListStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListRepository for PgListStore {
    async fn find_by_external_id(
        &self,
        mailchimp_id: &str,
    ) -> Result<Option<MailChimpList>, AppError> {
        sqlx::query_as::<_, MailChimpList>(
            "SELECT id, mailchimp_id, name FROM mailchimp_lists WHERE mailchimp_id = $1 LIMIT 1",
        )
        .bind(mailchimp_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to look up list {}", mailchimp_id))
    }
}

/// Postgres-backed member mirror (`mailchimp_members`).
#[derive(Clone)]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    email_address: String,
    email_type: Option<String>,
    status: String,
    merge_fields: Option<Json<Value>>,
    interests: Option<Json<Value>>,
    language: Option<String>,
    vip: Option<bool>,
    location: Option<Json<Value>>,
    marketing_permissions: Option<Json<Value>>,
    ip_signup: Option<String>,
    timestamp_signup: Option<String>,
    ip_opt: Option<String>,
    timestamp_opt: Option<String>,
    tags: Option<Json<Value>>,
    list_id: String,
}

impl TryFrom<MemberRow> for MailChimpMember {
    type Error = AppError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(MailChimpMember {
            id: row.id,
            fields: MemberFields {
                email_address: row.email_address,
                email_type: row
                    .email_type
                    .as_deref()
                    .map(str::parse::<EmailType>)
                    .transpose()?,
                status: row.status.parse::<MemberStatus>()?,
                merge_fields: row.merge_fields.map(|j| j.0),
                interests: row.interests.map(|j| j.0),
                language: row.language,
                vip: row.vip,
                location: row.location.map(|j| j.0),
                marketing_permissions: row.marketing_permissions.map(|j| j.0),
                ip_signup: row.ip_signup,
                timestamp_signup: row.timestamp_signup,
                ip_opt: row.ip_opt,
                timestamp_opt: row.timestamp_opt,
                tags: row.tags.map(|j| j.0),
            },
            list_id: row.list_id,
        })
    }
}

#[async_trait]
impl MemberRepository for PgMemberStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MailChimpMember>, AppError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, email_address, email_type, status, merge_fields, interests, language,
                   vip, location, marketing_permissions, ip_signup, timestamp_signup,
                   ip_opt, timestamp_opt, tags, list_id
            FROM mailchimp_members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load member {}", id))?;

        row.map(MailChimpMember::try_from).transpose()
    }

    async fn save(&self, member: &MailChimpMember) -> Result<(), AppError> {
        let fields = &member.fields;

        sqlx::query(
            r#"
            INSERT INTO mailchimp_members (
                id, email_address, email_type, status, merge_fields, interests, language,
                vip, location, marketing_permissions, ip_signup, timestamp_signup,
                ip_opt, timestamp_opt, tags, list_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE
            SET email_address = EXCLUDED.email_address,
                email_type = EXCLUDED.email_type,
                status = EXCLUDED.status,
                merge_fields = EXCLUDED.merge_fields,
                interests = EXCLUDED.interests,
                language = EXCLUDED.language,
                vip = EXCLUDED.vip,
                location = EXCLUDED.location,
                marketing_permissions = EXCLUDED.marketing_permissions,
                ip_signup = EXCLUDED.ip_signup,
                timestamp_signup = EXCLUDED.timestamp_signup,
                ip_opt = EXCLUDED.ip_opt,
                timestamp_opt = EXCLUDED.timestamp_opt,
                tags = EXCLUDED.tags,
                list_id = EXCLUDED.list_id
            "#,
        )
        .bind(member.id)
        .bind(&fields.email_address)
        .bind(fields.email_type.map(|t| t.as_str()))
        .bind(fields.status.as_str())
        .bind(fields.merge_fields.as_ref().map(Json))
        .bind(fields.interests.as_ref().map(Json))
        .bind(fields.language.as_deref())
        .bind(fields.vip)
        .bind(fields.location.as_ref().map(Json))
        .bind(fields.marketing_permissions.as_ref().map(Json))
        .bind(fields.ip_signup.as_deref())
        .bind(fields.timestamp_signup.as_deref())
        .bind(fields.ip_opt.as_deref())
        .bind(fields.timestamp_opt.as_deref())
        .bind(fields.tags.as_ref().map(Json))
        .bind(&member.list_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save member {}", member.id))?;

        tracing::debug!("Saved member {} (list {})", member.id, member.list_id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM mailchimp_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete member")?;

        tracing::debug!("Deleted member {}", id);
        Ok(())
    }
}
