//! Common parcel fixtures.

use chrono::{Duration, Utc};
use parcel_common::{Parcel, Publication, PublicationStatus};

/// An owned parcel with a fixed owner address.
pub fn owned_parcel(x: i32, y: i32) -> Parcel {
    let mut parcel = Parcel::new(x, y);
    parcel.owner = Some("0xdeadbeef".to_string());
    parcel
        .attributes
        .insert("name".to_string(), serde_json::json!(format!("Parcel {},{}", x, y)));
    parcel
}

/// A parcel that belongs to a community district.
pub fn district_parcel(x: i32, y: i32, district_id: &str) -> Parcel {
    let mut parcel = owned_parcel(x, y);
    parcel.district_id = Some(district_id.to_string());
    parcel
}

/// A publication that stays open for another week.
pub fn open_publication(x: i32, y: i32) -> Publication {
    Publication {
        x,
        y,
        price: 25_000.0,
        status: PublicationStatus::Open,
        expires_at: Utc::now() + Duration::days(7),
        tx_hash: Some(format!("0xtx{}{}", x, y)),
    }
}

/// A publication whose expiry already passed.
pub fn expired_publication(x: i32, y: i32) -> Publication {
    Publication {
        expires_at: Utc::now() - Duration::days(1),
        ..open_publication(x, y)
    }
}

/// An owned parcel with an open publication attached.
pub fn parcel_on_sale(x: i32, y: i32) -> Parcel {
    let mut parcel = owned_parcel(x, y);
    parcel.publication = Some(open_publication(x, y));
    parcel
}

/// Every cell of an inclusive block, owned.
pub fn parcel_block(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Vec<Parcel> {
    (min_y..=max_y)
        .flat_map(|y| (min_x..=max_x).map(move |x| owned_parcel(x, y)))
        .collect()
}
