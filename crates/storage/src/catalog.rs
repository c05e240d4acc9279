//! Parcel catalog using PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::debug;

use parcel_common::{BoundsRect, Coordinate, MapError, MapResult, Parcel, Publication, PublicationStatus};

use crate::store::ParcelStore;

/// Database connection pool and parcel queries.
pub struct ParcelCatalog {
    pool: PgPool,
}

impl ParcelCatalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> MapResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| MapError::UpstreamFailure(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> MapResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| MapError::UpstreamFailure(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ParcelStore for ParcelCatalog {
    async fn fetch_range(&self, northwest: Coordinate, southeast: Coordinate) -> MapResult<Vec<Parcel>> {
        let rect = BoundsRect::new(northwest, southeast);

        let rows = sqlx::query_as::<_, ParcelRow>(
            "SELECT p.x, p.y, p.owner, p.district_id, p.attributes, \
             pub.price, pub.status, pub.expires_at, pub.tx_hash \
             FROM parcels p \
             LEFT JOIN LATERAL ( \
                 SELECT price, status, expires_at, tx_hash FROM publications \
                 WHERE publications.x = p.x AND publications.y = p.y \
                 ORDER BY created_at DESC LIMIT 1 \
             ) pub ON TRUE \
             WHERE p.x BETWEEN $1 AND $2 AND p.y BETWEEN $3 AND $4",
        )
        .bind(rect.northwest.x)
        .bind(rect.southeast.x)
        .bind(rect.northwest.y)
        .bind(rect.southeast.y)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MapError::UpstreamFailure(format!("Query failed: {}", e)))?;

        debug!(rows = rows.len(), "Fetched parcel range");

        rows.into_iter().map(Parcel::try_from).collect()
    }

    async fn ping(&self) -> MapResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MapError::UpstreamFailure(format!("Query failed: {}", e)))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Internal row type for the range query.
#[derive(FromRow)]
struct ParcelRow {
    x: i32,
    y: i32,
    owner: Option<String>,
    district_id: Option<String>,
    attributes: Option<serde_json::Value>,
    price: Option<f64>,
    status: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    tx_hash: Option<String>,
}

impl TryFrom<ParcelRow> for Parcel {
    type Error = MapError;

    fn try_from(row: ParcelRow) -> MapResult<Self> {
        let publication = match (row.price, row.status, row.expires_at) {
            (Some(price), Some(status), Some(expires_at)) => Some(Publication {
                x: row.x,
                y: row.y,
                price,
                status: status
                    .parse::<PublicationStatus>()
                    .map_err(MapError::UpstreamFailure)?,
                expires_at,
                tx_hash: row.tx_hash,
            }),
            _ => None,
        };

        let attributes = match row.attributes {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        Ok(Parcel {
            x: row.x,
            y: row.y,
            owner: row.owner,
            district_id: row.district_id,
            attributes,
            publication,
        })
    }
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS parcels (
    x INTEGER NOT NULL,
    y INTEGER NOT NULL,
    owner TEXT,
    district_id TEXT,
    attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    PRIMARY KEY (x, y)
);

CREATE TABLE IF NOT EXISTS publications (
    tx_hash TEXT PRIMARY KEY,
    x INTEGER NOT NULL,
    y INTEGER NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'open',
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_publications_coords ON publications(x, y, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_publications_status ON publications(status);
"#;
