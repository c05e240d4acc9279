//! Request parameter validation.
//!
//! Turns raw query/path strings into a bounds-checked [`RenderRequest`].
//! Absent parameters take defaults, numeric parameters are clamped silently,
//! and anything unparseable fails with [`MapError::InvalidParameter`].

use std::str::FromStr;

use serde::Deserialize;

use parcel_common::coord::{parse_coordinate_list, parse_int};
use parcel_common::{Coordinate, GridBounds, MapError, MapResult};

pub const MIN_DIMENSION: i64 = 32;
pub const MAX_DIMENSION: i64 = 1024;
pub const DEFAULT_DIMENSION: i64 = 500;

pub const MIN_CELL_SIZE: i64 = 5;
pub const MAX_CELL_SIZE: i64 = 40;
pub const DEFAULT_CELL_SIZE: i64 = 10;

const EXPECTED_NUMBER: &str = "a number";
const EXPECTED_COORDINATE: &str = "a coordinate \"x,y\"";
const EXPECTED_COORDINATE_LIST: &str = "a list of coordinates \"x1,y1;x2,y2\"";
const EXPECTED_BOOLEAN: &str = "a boolean";

/// Raw request parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParams {
    pub x: Option<String>,
    pub y: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub size: Option<String>,
    pub center: Option<String>,
    pub selected: Option<String>,
    pub publications: Option<String>,
}

/// Validated render parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub size: u32,
    pub center: Coordinate,
    pub selected: Vec<Coordinate>,
    pub show_publications: bool,
}

impl RenderRequest {
    /// Recenter on the request's own `(x, y)` and make it the only selection.
    pub fn focused_on_parcel(mut self) -> Self {
        let parcel = Coordinate::new(self.x, self.y);
        self.center = parcel;
        self.selected = vec![parcel];
        self
    }
}

/// Validates raw parameters against the grid bounds.
#[derive(Debug, Clone, Copy)]
pub struct RequestValidator {
    bounds: GridBounds,
}

impl RequestValidator {
    pub fn new(bounds: GridBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Validate every parameter. The first invalid one (in declaration
    /// order) is reported.
    pub fn sanitize(&self, raw: &RawParams) -> MapResult<RenderRequest> {
        let x = get_number("x", raw.x.as_deref(), self.bounds.min_x as i64, self.bounds.max_x as i64, 0)?;
        let y = get_number("y", raw.y.as_deref(), self.bounds.min_y as i64, self.bounds.max_y as i64, 0)?;
        let width = get_number(
            "width",
            raw.width.as_deref(),
            MIN_DIMENSION,
            MAX_DIMENSION,
            DEFAULT_DIMENSION,
        )?;
        let height = get_number(
            "height",
            raw.height.as_deref(),
            MIN_DIMENSION,
            MAX_DIMENSION,
            DEFAULT_DIMENSION,
        )?;
        let size = get_number(
            "size",
            raw.size.as_deref(),
            MIN_CELL_SIZE,
            MAX_CELL_SIZE,
            DEFAULT_CELL_SIZE,
        )?;

        Ok(RenderRequest {
            x: x as i32,
            y: y as i32,
            width: width as u32,
            height: height as u32,
            size: size as u32,
            center: get_coordinate("center", raw.center.as_deref(), Coordinate::ORIGIN)?,
            selected: get_coordinate_list("selected", raw.selected.as_deref())?,
            show_publications: get_boolean("publications", raw.publications.as_deref(), false)?,
        })
    }
}

fn invalid(name: &str, value: &str, expected: &str) -> MapError {
    MapError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

/// Parse an integer and clamp it into `[min, max]`.
pub fn get_number(name: &str, raw: Option<&str>, min: i64, max: i64, default: i64) -> MapResult<i64> {
    match raw {
        None => Ok(default),
        Some(value) => parse_int(value)
            .map(|n| n.clamp(min, max))
            .ok_or_else(|| invalid(name, value, EXPECTED_NUMBER)),
    }
}

pub fn get_coordinate(name: &str, raw: Option<&str>, default: Coordinate) -> MapResult<Coordinate> {
    match raw {
        None => Ok(default),
        Some(value) => Coordinate::from_str(value).map_err(|_| invalid(name, value, EXPECTED_COORDINATE)),
    }
}

pub fn get_coordinate_list(name: &str, raw: Option<&str>) -> MapResult<Vec<Coordinate>> {
    match raw {
        None => Ok(Vec::new()),
        Some(value) => {
            parse_coordinate_list(value).map_err(|_| invalid(name, value, EXPECTED_COORDINATE_LIST))
        }
    }
}

pub fn get_boolean(name: &str, raw: Option<&str>, default: bool) -> MapResult<bool> {
    match raw {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(value) => Err(invalid(name, value, EXPECTED_BOOLEAN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> RequestValidator {
        RequestValidator::new(GridBounds::default())
    }

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        let mut params = RawParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "x" => params.x = value,
                "y" => params.y = value,
                "width" => params.width = value,
                "height" => params.height = value,
                "size" => params.size = value,
                "center" => params.center = value,
                "selected" => params.selected = value,
                "publications" => params.publications = value,
                other => panic!("unknown param {}", other),
            }
        }
        params
    }

    #[test]
    fn test_defaults() {
        let request = validator().sanitize(&RawParams::default()).unwrap();
        assert_eq!(
            request,
            RenderRequest {
                x: 0,
                y: 0,
                width: 500,
                height: 500,
                size: 10,
                center: Coordinate::ORIGIN,
                selected: vec![],
                show_publications: false,
            }
        );
    }

    #[test]
    fn test_numbers_are_clamped() {
        let request = validator()
            .sanitize(&raw(&[("width", "2000"), ("height", "1"), ("size", "1"), ("x", "-900")]))
            .unwrap();
        assert_eq!(request.width, 1024);
        assert_eq!(request.height, 32);
        assert_eq!(request.size, 5);
        assert_eq!(request.x, -150);
    }

    #[test]
    fn test_lenient_integer_prefix() {
        let request = validator()
            .sanitize(&raw(&[("width", "640px"), ("size", "12.7")]))
            .unwrap();
        assert_eq!(request.width, 640);
        assert_eq!(request.size, 12);
    }

    #[test]
    fn test_invalid_number_message() {
        let err = validator().sanitize(&raw(&[("size", "big")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid param \"size\" should be a number but got \"big\"."
        );
    }

    #[test]
    fn test_invalid_center() {
        let err = validator().sanitize(&raw(&[("center", "abc")])).unwrap_err();
        assert_eq!(err.parameter_name(), Some("center"));
        assert_eq!(
            err.to_string(),
            "Invalid param \"center\" should be a coordinate \"x,y\" but got \"abc\"."
        );

        assert!(validator().sanitize(&raw(&[("center", "1,2,3")])).is_err());
    }

    #[test]
    fn test_selected_list() {
        let request = validator()
            .sanitize(&raw(&[("selected", "1,2;-3,4")]))
            .unwrap();
        assert_eq!(request.selected, vec![Coordinate::new(1, 2), Coordinate::new(-3, 4)]);

        let err = validator().sanitize(&raw(&[("selected", "1,2;x,y")])).unwrap_err();
        assert_eq!(err.parameter_name(), Some("selected"));
        assert!(err.to_string().contains("\"1,2;x,y\""));
    }

    #[test]
    fn test_boolean_is_strict() {
        assert!(validator()
            .sanitize(&raw(&[("publications", "true")]))
            .unwrap()
            .show_publications);
        assert!(!validator()
            .sanitize(&raw(&[("publications", "false")]))
            .unwrap()
            .show_publications);

        let err = validator().sanitize(&raw(&[("publications", "yes")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid param \"publications\" should be a boolean but got \"yes\"."
        );
    }

    #[test]
    fn test_focused_on_parcel() {
        let request = validator()
            .sanitize(&raw(&[("x", "5"), ("y", "-5"), ("selected", "9,9"), ("center", "1,1")]))
            .unwrap()
            .focused_on_parcel();
        assert_eq!(request.center, Coordinate::new(5, -5));
        assert_eq!(request.selected, vec![Coordinate::new(5, -5)]);
    }

    #[test]
    fn test_path_coordinate_clamped_to_bounds() {
        let request = RequestValidator::new(GridBounds::new(-10, 10, -10, 10))
            .sanitize(&raw(&[("x", "500"), ("y", "-500")]))
            .unwrap();
        assert_eq!((request.x, request.y), (10, -10));
    }
}
