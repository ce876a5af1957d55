// Integer fields that also accept whole-number floats such as `50.0`
use serde::{Deserializer, de};
use std::fmt;

struct WholeNumberVisitor;

impl<'de> de::Visitor<'de> for WholeNumberVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // Bounds are exclusive at the top: i64::MAX is not representable as f64
        if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(WholeNumberVisitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Speed {
        #[serde(deserialize_with = "super::deserialize")]
        speed: i64,
    }

    fn parse(value: serde_json::Value) -> Result<i64, serde_json::Error> {
        serde_json::from_value::<Speed>(value).map(|s| s.speed)
    }

    #[test]
    fn test_accepts_integers_and_whole_floats() {
        assert_eq!(parse(json!({"speed": 50})).unwrap(), 50);
        assert_eq!(parse(json!({"speed": -1})).unwrap(), -1);
        assert_eq!(parse(json!({"speed": 50.0})).unwrap(), 50);
        assert_eq!(parse(json!({"speed": -1.0})).unwrap(), -1);
    }

    #[test]
    fn test_rejects_fractions_and_other_types() {
        assert!(parse(json!({"speed": 50.5})).is_err());
        assert!(parse(json!({"speed": "50"})).is_err());
        assert!(parse(json!({"speed": null})).is_err());
        assert!(parse(json!({"speed": 1e300})).is_err());
    }
}
