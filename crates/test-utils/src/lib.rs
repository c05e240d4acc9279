//! Shared test utilities for the parcel map workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Parcel and publication fixtures
//! - PNG decoding and pixel lookup for rendered maps
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{owned_parcel, open_publication, decode_png};
//! ```

pub mod fixtures;
pub mod pixels;

pub use fixtures::*;
pub use pixels::*;

/// Assert that a decoded image pixel has the expected RGBA value.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_pixel_eq;
///
/// assert_pixel_eq!(image, 48, 48, [142, 139, 148, 255]);
/// ```
#[macro_export]
macro_rules! assert_pixel_eq {
    ($image:expr, $x:expr, $y:expr, $expected:expr) => {{
        let actual: [u8; 4] = $image.get_pixel($x, $y).0;
        let expected: [u8; 4] = $expected;
        if actual != expected {
            panic!(
                "pixel mismatch at ({}, {})\n  actual: `{:?}`,\nexpected: `{:?}`",
                $x, $y, actual, expected
            );
        }
    }};
}
