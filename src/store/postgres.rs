//! PostgreSQL implementations of the store traits.
//!
//! The source table is expected as one row per `(product_variant_id,
//! image_index)` with the product metadata repeated on every row. The
//! review-side tables are created by the embedded migrations in
//! `migrations/`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{EventRow, SourceImageRow, StateRow};
use super::{ReviewStore, ReviewerDirectory, SourceTable};
use crate::domain::source::{CREATED_BUCKET_ORDER, DEFAULT_CREATED_BUCKET};
use crate::domain::{
    AuditEvent, FilterValues, ImageKey, ProductRow, ReviewMutation, ReviewState, Role,
    RoleAssignment, SourceFilter,
};
use crate::error::QcError;

/// Connection pool settings shared by every PostgreSQL store.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// Maximum open connections.
    pub max_connections: u32,
    /// Connections kept idle.
    pub min_connections: u32,
    /// Timeout for acquiring a connection.
    pub connect_timeout: Duration,
}

/// Opens a lazily-connecting pool to `url`.
///
/// # Errors
///
/// Returns the `sqlx` error if the URL cannot be parsed.
pub fn connect_lazy(url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect_lazy(url)
}

/// Runs the embedded review-store migrations.
///
/// # Errors
///
/// Returns [`QcError::ReviewStoreUnavailable`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), QcError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| QcError::ReviewStoreUnavailable(format!("migration failed: {e}")))
}

fn source_err(e: sqlx::Error) -> QcError {
    QcError::SourceUnavailable(e.to_string())
}

fn review_err(e: sqlx::Error) -> QcError {
    QcError::ReviewStoreUnavailable(e.to_string())
}

/// Checks that a configured table name is a plain (optionally
/// schema-qualified) identifier, since it is spliced into SQL text.
///
/// # Errors
///
/// Returns [`QcError::InvalidRequest`] for anything else.
pub fn validate_table_name(name: &str) -> Result<(), QcError> {
    let valid = !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            !part.is_empty()
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !part.starts_with(|c: char| c.is_ascii_digit())
        });
    if valid {
        Ok(())
    } else {
        Err(QcError::InvalidRequest(format!("invalid table name '{name}'")))
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ── Source table ────────────────────────────────────────────────────────

/// Reads products from the analytical source table.
#[derive(Debug, Clone)]
pub struct PgSourceTable {
    pool: PgPool,
    table: String,
}

impl PgSourceTable {
    /// Creates a reader over `table`.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] if `table` is not a plain
    /// identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, QcError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    fn bucket_expr() -> String {
        format!("COALESCE(NULLIF(created_date_bucket_label, ''), '{DEFAULT_CREATED_BUCKET}')")
    }

    /// Appends `AND ...` clauses for every constraint in `filter`.
    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SourceFilter) {
        if let Some(brand) = &filter.brand {
            qb.push(" AND brand_name = ").push_bind(brand.clone());
        }
        if !filter.categories.is_empty() {
            qb.push(" AND category_name = ANY(")
                .push_bind(filter.categories.clone())
                .push(")");
        }
        if let Some(sub) = &filter.subcategory {
            qb.push(" AND subcategory_name = ").push_bind(sub.clone());
        }
        if let Some(l3) = &filter.l3_category {
            qb.push(" AND l3_category_name = ").push_bind(l3.clone());
        }
        if let Some(pvid) = &filter.pvid_contains {
            qb.push(" AND LOWER(product_variant_id) LIKE LOWER(")
                .push_bind(format!("%{}%", escape_like(pvid)))
                .push(")");
        }
        if let Some(bucket) = &filter.created_bucket {
            qb.push(" AND ")
                .push(Self::bucket_expr())
                .push(" = ")
                .push_bind(bucket.clone());
        }
    }

    async fn fetch_rows(
        &self,
        filter: &SourceFilter,
        ids: &[String],
    ) -> Result<Vec<ProductRow>, QcError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT product_variant_id, brand_name, product_name, category_name, \
             subcategory_name, l3_category_name, created_date_bucket_label, image_index, \
             image_url, aspect_ratio, meta_3x4, hide_padding, dpi, white_bg FROM ",
        );
        qb.push(&self.table)
            .push(" WHERE product_variant_id = ANY(")
            .push_bind(ids.to_vec())
            .push(")");
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY product_variant_id, image_index");

        let rows = qb
            .build_query_as::<SourceImageRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(source_err)?;
        Ok(group_rows(rows))
    }
}

/// Folds image rows (sorted by product) into products.
fn group_rows(rows: Vec<SourceImageRow>) -> Vec<ProductRow> {
    let mut products: Vec<ProductRow> = Vec::new();
    for row in rows {
        let image = row.image();
        if let Some(last) = products
            .last_mut()
            .filter(|p| p.product_variant_id == row.product_variant_id)
        {
            last.images.extend(image);
            continue;
        }
        let created_date_bucket_label = row.bucket_label();
        products.push(ProductRow {
            product_variant_id: row.product_variant_id,
            brand_name: row.brand_name.unwrap_or_default(),
            product_name: row.product_name.unwrap_or_default(),
            category_name: row.category_name.unwrap_or_default(),
            subcategory_name: row.subcategory_name.unwrap_or_default(),
            l3_category_name: row.l3_category_name.unwrap_or_default(),
            created_date_bucket_label,
            images: image.into_iter().collect(),
        });
    }
    products
}

#[async_trait]
impl SourceTable for PgSourceTable {
    async fn scan_products(
        &self,
        filter: &SourceFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductRow>, QcError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT product_variant_id FROM ");
        qb.push(&self.table).push(" WHERE 1=1");
        Self::push_filter(&mut qb, filter);
        qb.push(" GROUP BY product_variant_id ORDER BY product_variant_id LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let ids: Vec<String> = qb
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
            .map_err(source_err)?;

        tracing::debug!(offset, limit, matched = ids.len(), "source page scanned");
        self.fetch_rows(filter, &ids).await
    }

    async fn products_by_ids(
        &self,
        filter: &SourceFilter,
        ids: &[String],
    ) -> Result<Vec<ProductRow>, QcError> {
        self.fetch_rows(filter, ids).await
    }

    async fn filter_values(&self) -> Result<FilterValues, QcError> {
        let table = &self.table;
        let bucket = Self::bucket_expr();
        let sql = format!(
            "SELECT 'category' AS kind, category_name AS value FROM {table} GROUP BY 2 \
             UNION ALL SELECT 'brand', brand_name FROM {table} GROUP BY 2 \
             UNION ALL SELECT 'bucket', {bucket} FROM {table} GROUP BY 2"
        );
        let rows = sqlx::query_as::<_, (String, Option<String>)>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(source_err)?;

        let mut values = FilterValues::default();
        let mut buckets = Vec::new();
        for (kind, value) in rows {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            match kind.as_str() {
                "category" => values.categories.push(value),
                "brand" => values.brands.push(value),
                _ => buckets.push(value),
            }
        }
        values.categories.sort();
        values.brands.sort();
        values.created_date_buckets = CREATED_BUCKET_ORDER
            .iter()
            .filter(|b| buckets.iter().any(|v| v.as_str() == **b))
            .map(|b| (*b).to_string())
            .collect();
        Ok(values)
    }
}

// ── Review store ────────────────────────────────────────────────────────

const STATE_COLUMNS: &str = "product_variant_id, image_index, review_status, issues, remark, \
                             updated_by, updated_at";

const EVENT_COLUMNS: &str = "event_id, event_ts, event_type, actor, product_variant_id, \
                             image_index, old_status, new_status, issue_key, old_issue_value, \
                             new_issue_value, issues_snapshot, old_remark, new_remark";

/// Review state and audit log in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    /// Creates a store using `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    fn is_writable(&self) -> bool {
        true
    }

    async fn get_states(
        &self,
        keys: &[ImageKey],
    ) -> Result<HashMap<ImageKey, ReviewState>, QcError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let pvids: Vec<String> = keys.iter().map(|k| k.product_variant_id.clone()).collect();
        let indexes: Vec<i16> = keys.iter().map(|k| i16::from(k.image_index)).collect();

        let sql = format!(
            "SELECT {STATE_COLUMNS} FROM qc_current_state \
             WHERE (product_variant_id, image_index) IN \
             (SELECT * FROM UNNEST($1::text[], $2::smallint[]))"
        );
        let rows = sqlx::query_as::<_, StateRow>(&sql)
            .bind(pvids)
            .bind(indexes)
            .fetch_all(&self.pool)
            .await
            .map_err(review_err)?;

        rows.into_iter().map(StateRow::into_domain).collect()
    }

    async fn reviewed_product_ids(&self) -> Result<Vec<String>, QcError> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT product_variant_id FROM qc_current_state \
             WHERE review_status = 'REVIEWED' ORDER BY product_variant_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(review_err)
    }

    async fn apply(
        &self,
        key: &ImageKey,
        mutation: &ReviewMutation,
        actor: &str,
    ) -> Result<(ReviewState, AuditEvent), QcError> {
        let mut tx = self.pool.begin().await.map_err(review_err)?;

        // Row locks cannot cover a document that does not exist yet, so
        // writers to one image serialise on a transaction-scoped advisory
        // lock first.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), $2)")
            .bind(&key.product_variant_id)
            .bind(i32::from(key.image_index))
            .execute(&mut *tx)
            .await
            .map_err(review_err)?;
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT clock_timestamp()")
            .fetch_one(&mut *tx)
            .await
            .map_err(review_err)?;

        let select = format!(
            "SELECT {STATE_COLUMNS} FROM qc_current_state \
             WHERE product_variant_id = $1 AND image_index = $2 FOR UPDATE"
        );
        let current = sqlx::query_as::<_, StateRow>(&select)
            .bind(&key.product_variant_id)
            .bind(i16::from(key.image_index))
            .fetch_optional(&mut *tx)
            .await
            .map_err(review_err)?
            .map(|row| row.into_domain().map(|(_, state)| state))
            .transpose()?;

        let (next, event) = ReviewState::apply(current.as_ref(), key, mutation, actor, now);

        sqlx::query(
            "INSERT INTO qc_current_state \
             (product_variant_id, image_index, review_status, issues, remark, updated_by, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (product_variant_id, image_index) DO UPDATE SET \
             review_status = EXCLUDED.review_status, issues = EXCLUDED.issues, \
             remark = EXCLUDED.remark, updated_by = EXCLUDED.updated_by, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(&key.product_variant_id)
        .bind(i16::from(key.image_index))
        .bind(next.status.as_str())
        .bind(Json(next.issues))
        .bind(next.remark.as_deref())
        .bind(next.updated_by.as_deref())
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(review_err)?;

        let insert = format!(
            "INSERT INTO qc_event_log ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        );
        sqlx::query(&insert)
            .bind(event.event_id)
            .bind(event.event_ts)
            .bind(event.event_type.as_str())
            .bind(&event.actor)
            .bind(&event.product_variant_id)
            .bind(i16::from(event.image_index))
            .bind(event.old_status.map(|s| s.as_str()))
            .bind(event.new_status.map(|s| s.as_str()))
            .bind(event.issue_key.map(|k| k.as_str()))
            .bind(event.old_issue_value)
            .bind(event.new_issue_value)
            .bind(event.issues_snapshot.map(Json))
            .bind(event.old_remark.as_deref())
            .bind(event.new_remark.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(review_err)?;

        tx.commit().await.map_err(review_err)?;
        Ok((next, event))
    }

    async fn history(&self, key: &ImageKey) -> Result<Vec<AuditEvent>, QcError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM qc_event_log \
             WHERE product_variant_id = $1 AND image_index = $2 \
             ORDER BY event_ts ASC, event_id ASC"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(&key.product_variant_id)
            .bind(i16::from(key.image_index))
            .fetch_all(&self.pool)
            .await
            .map_err(review_err)?;

        rows.into_iter().map(AuditEvent::try_from).collect()
    }
}

// ── Reviewer directory ──────────────────────────────────────────────────

/// Role assignments stored in the `reviewers` table.
#[derive(Debug, Clone)]
pub struct PgReviewerDirectory {
    pool: PgPool,
}

impl PgReviewerDirectory {
    /// Creates a directory using `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewerDirectory for PgReviewerDirectory {
    async fn lookup(&self, email: &str) -> Result<RoleAssignment, QcError> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM reviewers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(review_err)?;

        Ok(role.map_or(RoleAssignment::UNKNOWN, |name| RoleAssignment {
            role: Role::from_stored(&name),
            exists: true,
        }))
    }
}
