use serde::{Deserialize, Deserializer, Serializer};

/// Rounds to three decimal places; non-finite values are written as `null`.
pub(crate) fn round_float<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64((value * 1000.0).round() / 1000.0)
    } else {
        serializer.serialize_none()
    }
}

pub(crate) fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(|value| value.unwrap_or(f64::NAN))
}
