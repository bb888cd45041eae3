use serde_json::Value;

/// Degrees/minutes/seconds triple, as found in survey-style datasets.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    pub fn new(degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
        }
    }
}

/// Convert a DMS triple to decimal degrees.
///
/// The sign of `degrees` applies to the whole value; minutes and seconds are
/// taken as magnitudes.
pub fn dms_to_decimal(dms: Dms) -> f64 {
    let magnitude = dms.degrees.abs() + dms.minutes.abs() / 60.0 + dms.seconds.abs() / 3600.0;
    if dms.degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Read a degree value from a loosely-typed JSON field.
///
/// Numbers are taken as-is; strings are trimmed and parsed. Everything else
/// (null, bool, objects, unparsable text, NaN/inf) yields `None`.
pub fn parse_degrees(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::{Dms, dms_to_decimal, parse_degrees};
    use serde_json::json;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn converts_positive_dms() {
        assert_close(dms_to_decimal(Dms::new(37.0, 33.0, 59.4)), 37.566_5, 1e-9);
    }

    #[test]
    fn negative_degrees_negate_whole_value() {
        assert_close(dms_to_decimal(Dms::new(-33.0, 52.0, 4.8)), -33.868, 1e-9);
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        assert_eq!(parse_degrees(&json!(127.03)), Some(127.03));
        assert_eq!(parse_degrees(&json!(" 37.5 ")), Some(37.5));
        assert_eq!(parse_degrees(&json!("north")), None);
        assert_eq!(parse_degrees(&json!(null)), None);
        assert_eq!(parse_degrees(&json!("NaN")), None);
        assert_eq!(parse_degrees(&json!({"lat": 1})), None);
    }
}
