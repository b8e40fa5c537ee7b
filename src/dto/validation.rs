use validator::ValidationError;

/// A standard course has 18 holes; shotgun starts still address them 1-18.
pub fn validate_hole_number(hole: u8) -> Result<(), ValidationError> {
    if (1..=18).contains(&hole) {
        Ok(())
    } else {
        Err(ValidationError::new("hole_number_out_of_range")
            .with_message("hole number must be between 1 and 18".into()))
    }
}

/// Latitude bounds in decimal degrees.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(ValidationError::new("latitude_out_of_range")
            .with_message("latitude must be between -90 and 90".into()))
    }
}

/// Longitude bounds in decimal degrees.
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(ValidationError::new("longitude_out_of_range")
            .with_message("longitude must be between -180 and 180".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hole_number_bounds() {
        assert!(validate_hole_number(1).is_ok());
        assert!(validate_hole_number(18).is_ok());
        assert!(validate_hole_number(0).is_err());
        assert!(validate_hole_number(19).is_err());
    }

    #[test]
    fn coordinate_bounds() {
        assert!(validate_latitude(45.8).is_ok());
        assert!(validate_latitude(-91.0).is_err());
        assert!(validate_longitude(9.1).is_ok());
        assert!(validate_longitude(181.0).is_err());
    }
}
