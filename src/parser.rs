use glam::Vec3;
use thiserror::Error;

/// Decoded sample handed from ingestion to the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorVectors {
    pub acceleration: Vec3,
    pub angular_rate: Vec3,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed sample line (expected 6 comma-separated fields): {0:?}")]
    MalformedLine(String),

    #[error("invalid number in sample line: {0:?}")]
    InvalidNumber(String),
}

/// Decode one wire line: `ax,ay,az,gx,gy,gz`.
///
/// Accelerometer XYZ first, gyroscope XYZ second, in the sensor's native
/// units. Pure function; malformed input never reaches the integrator.
pub fn parse_line(line: &str) -> Result<SensorVectors, ParseError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 6 {
        return Err(ParseError::MalformedLine(line.to_string()));
    }

    let mut values = [0f32; 6];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = field
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidNumber(line.to_string()))?;
    }

    Ok(SensorVectors {
        acceleration: Vec3::new(values[0], values[1], values[2]),
        angular_rate: Vec3::new(values[3], values[4], values[5]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_fields_in_order() {
        let vectors = parse_line("1.0,-2.5,9.81,0.0,10.0,-45.5").unwrap();
        assert_eq!(vectors.acceleration, Vec3::new(1.0, -2.5, 9.81));
        assert_eq!(vectors.angular_rate, Vec3::new(0.0, 10.0, -45.5));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let vectors = parse_line(" 1, 2, 3, 4, 5, 6 \r").unwrap();
        assert_eq!(vectors.acceleration, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(vectors.angular_rate, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(matches!(
            parse_line("1,2,3,4,5"),
            Err(ParseError::MalformedLine(_))
        ));
        assert!(matches!(
            parse_line("1,2,3,4,5,6,7"),
            Err(ParseError::MalformedLine(_))
        ));
        assert!(matches!(parse_line(""), Err(ParseError::MalformedLine(_))));
    }

    #[test]
    fn rejects_non_numeric_token() {
        let err = parse_line("1,2,abc,4,5,6").unwrap_err();
        match err {
            ParseError::InvalidNumber(line) => assert!(line.contains("abc")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_token_is_invalid_number() {
        assert!(matches!(
            parse_line("1,2,,4,5,6"),
            Err(ParseError::InvalidNumber(_))
        ));
    }
}
