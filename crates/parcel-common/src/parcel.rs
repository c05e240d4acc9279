//! Parcel and publication records as read from the parcel store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Coordinate, CoordinateKey};

/// A single owned cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub owner: Option<String>,
    /// Set when the parcel belongs to a community district.
    #[serde(default)]
    pub district_id: Option<String>,
    /// Free-form attributes (name, description, ...) as stored.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Latest publication attached to the parcel, whatever its state.
    #[serde(default)]
    pub publication: Option<Publication>,
}

impl Parcel {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            owner: None,
            district_id: None,
            attributes: serde_json::Map::new(),
            publication: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    pub fn key(&self) -> CoordinateKey {
        self.coordinate().key()
    }

    pub fn is_district(&self) -> bool {
        self.district_id.is_some()
    }

    /// The attached publication if it is open and not yet expired at `now`.
    pub fn active_publication(&self, now: DateTime<Utc>) -> Option<&Publication> {
        self.publication.as_ref().filter(|p| p.is_active(now))
    }
}

/// A sale listing for a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub x: i32,
    pub y: i32,
    pub price: f64,
    pub status: PublicationStatus,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl Publication {
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.x, self.y)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == PublicationStatus::Open && self.expires_at > now
    }
}

/// Lifecycle state of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Open,
    Sold,
    Cancelled,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Open => "open",
            PublicationStatus::Sold => "sold",
            PublicationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PublicationStatus::Open),
            "sold" => Ok(PublicationStatus::Sold),
            "cancelled" => Ok(PublicationStatus::Cancelled),
            other => Err(format!("unknown publication status: {}", other)),
        }
    }
}
