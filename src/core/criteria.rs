use thiserror::Error;
use crate::models::DiscoveryParams;

/// Sentinel meaning "no constraint" for cuisine and price range
pub const ANY: &str = "all";

/// Errors produced while parsing discovery query parameters
#[derive(Debug, Error, PartialEq)]
pub enum CriteriaError {
    #[error("Invalid {field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid {field}: '{value}' must be 'true' or 'false'")]
    InvalidFlag { field: &'static str, value: String },

    #[error("Invalid {field}: {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Center point and maximum distance for radius filtering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRadius {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters
    pub radius_m: f64,
}

/// Parsed restaurant discovery criteria
///
/// Boolean flags are tri-state: `None` (absent), `Some(false)` and `Some(true)`.
/// Only `Some(true)` constrains results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryCriteria {
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub min_rating: Option<f64>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub open_now: Option<bool>,
    pub radius: Option<GeoRadius>,
}

impl DiscoveryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw query parameters, rejecting malformed numbers and flags
    pub fn from_params(params: &DiscoveryParams) -> Result<Self, CriteriaError> {
        let min_rating = parse_number("minRating", &params.min_rating)?;
        let radius_m = parse_number("radius", &params.radius)?;
        let latitude = parse_number("latitude", &params.latitude)?;
        let longitude = parse_number("longitude", &params.longitude)?;

        if let Some(lat) = latitude {
            check_range("latitude", lat, -90.0, 90.0)?;
        }
        if let Some(lng) = longitude {
            check_range("longitude", lng, -180.0, 180.0)?;
        }
        if let Some(radius) = radius_m {
            check_range("radius", radius, 0.0, f64::MAX)?;
        }

        // Radius filtering needs all three values; a partial set is ignored
        let radius = match (radius_m, latitude, longitude) {
            (Some(radius_m), Some(latitude), Some(longitude)) => Some(GeoRadius {
                latitude,
                longitude,
                radius_m,
            }),
            _ => None,
        };

        Ok(Self {
            location: present(&params.location).map(str::to_string),
            cuisine: exact_match(&params.cuisine),
            price_range: exact_match(&params.price_range),
            min_rating,
            vegetarian: parse_flag("vegetarian", &params.vegetarian)?,
            vegan: parse_flag("vegan", &params.vegan)?,
            gluten_free: parse_flag("glutenFree", &params.gluten_free)?,
            open_now: parse_flag("openNow", &params.open_now)?,
            radius,
        })
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn within(mut self, latitude: f64, longitude: f64, radius_m: f64) -> Self {
        self.radius = Some(GeoRadius {
            latitude,
            longitude,
            radius_m,
        });
        self
    }
}

/// Empty query values count as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn exact_match(value: &Option<String>) -> Option<String> {
    present(value)
        .filter(|v| *v != ANY)
        .map(str::to_string)
}

fn parse_number(field: &'static str, value: &Option<String>) -> Result<Option<f64>, CriteriaError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(CriteriaError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(field: &'static str, value: &Option<String>) -> Result<Option<bool>, CriteriaError> {
    match present(value) {
        None => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(CriteriaError::InvalidFlag {
            field,
            value: other.to_string(),
        }),
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), CriteriaError> {
    if value < min || value > max {
        return Err(CriteriaError::OutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DiscoveryParams {
        DiscoveryParams::default()
    }

    #[test]
    fn test_empty_params_impose_nothing() {
        let criteria = DiscoveryCriteria::from_params(&params()).unwrap();
        assert_eq!(criteria, DiscoveryCriteria::default());
    }

    #[test]
    fn test_all_sentinel_is_dropped() {
        let mut p = params();
        p.cuisine = Some("all".to_string());
        p.price_range = Some("all".to_string());

        let criteria = DiscoveryCriteria::from_params(&p).unwrap();
        assert!(criteria.cuisine.is_none());
        assert!(criteria.price_range.is_none());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut p = params();
        p.location = Some(String::new());
        p.min_rating = Some(String::new());
        p.vegan = Some(String::new());

        let criteria = DiscoveryCriteria::from_params(&p).unwrap();
        assert_eq!(criteria, DiscoveryCriteria::default());
    }

    #[test]
    fn test_flags_are_tri_state() {
        let mut p = params();
        p.vegetarian = Some("true".to_string());
        p.vegan = Some("false".to_string());

        let criteria = DiscoveryCriteria::from_params(&p).unwrap();
        assert_eq!(criteria.vegetarian, Some(true));
        assert_eq!(criteria.vegan, Some(false));
        assert_eq!(criteria.gluten_free, None);
    }

    #[test]
    fn test_malformed_flag_is_rejected() {
        let mut p = params();
        p.open_now = Some("yes".to_string());

        let err = DiscoveryCriteria::from_params(&p).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidFlag { field: "openNow", .. }));
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let mut p = params();
        p.min_rating = Some("four".to_string());

        let err = DiscoveryCriteria::from_params(&p).unwrap_err();
        assert_eq!(
            err,
            CriteriaError::InvalidNumber {
                field: "minRating",
                value: "four".to_string()
            }
        );
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut p = params();
        p.radius = Some("NaN".to_string());

        assert!(DiscoveryCriteria::from_params(&p).is_err());
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        let mut p = params();
        p.radius = Some("1000".to_string());
        p.latitude = Some("0".to_string());
        p.longitude = Some("0".to_string());

        let criteria = DiscoveryCriteria::from_params(&p).unwrap();
        assert_eq!(
            criteria.radius,
            Some(GeoRadius {
                latitude: 0.0,
                longitude: 0.0,
                radius_m: 1000.0
            })
        );
    }

    #[test]
    fn test_radius_without_center_is_ignored() {
        let mut p = params();
        p.radius = Some("5000".to_string());
        p.latitude = Some("40.7".to_string());

        let criteria = DiscoveryCriteria::from_params(&p).unwrap();
        assert!(criteria.radius.is_none());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let mut p = params();
        p.latitude = Some("91".to_string());

        let err = DiscoveryCriteria::from_params(&p).unwrap_err();
        assert!(matches!(err, CriteriaError::OutOfRange { field: "latitude", .. }));
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let mut p = params();
        p.radius = Some("-1".to_string());

        assert!(DiscoveryCriteria::from_params(&p).is_err());
    }
}
