//! Decimal degrees to `DDMM.MMH/DDDMM.MMH`

use crate::error::EncodeError;

/// Encode a position as `DDMM.MMH/DDDMM.MMH`
///
/// Minutes are rounded to hundredths; a value that rounds to 60.00 carries
/// into the degrees. Exactly zero takes the positive hemisphere.
pub fn encode_position(latitude: f64, longitude: f64) -> Result<String, EncodeError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(EncodeError::InvalidLatitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(EncodeError::InvalidLongitude(longitude));
    }

    let lat = encode_coordinate(latitude, 2, ('N', 'S'));
    let lon = encode_coordinate(longitude, 3, ('E', 'W'));
    Ok(format!("{lat}/{lon}"))
}

fn encode_coordinate(value: f64, degree_width: usize, hemispheres: (char, char)) -> String {
    let hemisphere = if value >= 0.0 {
        hemispheres.0
    } else {
        hemispheres.1
    };

    let minutes_total = value.abs() * 60.0;
    let mut degrees = (minutes_total / 60.0).floor() as u32;
    let mut hundredths = ((minutes_total - f64::from(degrees) * 60.0) * 100.0).round() as u32;
    if hundredths >= 6000 {
        degrees += 1;
        hundredths -= 6000;
    }

    format!(
        "{degrees:0degree_width$}{:02}.{:02}{hemisphere}",
        hundredths / 100,
        hundredths % 100
    )
}
