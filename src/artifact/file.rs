//! File descriptors attached to an artifact.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// One file of an artifact, as listed under `storage.files`.
///
/// Keys this type does not model are kept in `extra` and written back
/// unchanged, so records survive a decode/encode cycle intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fname: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dname: Option<String>,

    /// Size in bytes.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub fsize: Option<u64>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Playback length in seconds.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(rename = "sugPlay", default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub suggested_play_cost: Option<f64>,

    #[serde(rename = "sugBuy", default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub suggested_buy_cost: Option<f64>,

    #[serde(rename = "minPlay", default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub minimum_play_cost: Option<f64>,

    #[serde(rename = "minBuy", default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub minimum_buy_cost: Option<f64>,

    #[serde(rename = "disPlay", default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub disallow_play: Option<bool>,

    #[serde(rename = "disBuy", default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub disallow_buy: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Keys modelled as plain strings.
const STRING_KEYS: [&str; 4] = ["fname", "dname", "type", "subtype"];

impl ArtifactFile {
    pub fn named(fname: impl Into<String>) -> Self {
        Self {
            fname: Some(fname.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, file_type: impl Into<String>, subtype: Option<&str>) -> Self {
        self.file_type = Some(file_type.into());
        self.subtype = subtype.map(str::to_string);
        self
    }

    /// Build a descriptor from a raw list entry.
    ///
    /// Objects are read field by field; strings holding a JSON object are
    /// parsed, any other string is taken as a file name. An object always
    /// yields a descriptor: values of an unexpected type are kept in `extra`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_object(map)),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Some(Self::from_object(&map)),
                _ if s.trim().is_empty() => None,
                _ => Some(Self::named(s.as_str())),
            },
            _ => None,
        }
    }

    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        let (typed, odd): (serde_json::Map<String, Value>, serde_json::Map<String, Value>) =
            map.iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .partition(|(key, value)| {
                    !STRING_KEYS.contains(&key.as_str())
                        || matches!(value, Value::String(_) | Value::Null)
                });

        match serde_json::from_value::<Self>(Value::Object(typed)) {
            Ok(mut file) => {
                file.extra.extend(odd);
                file
            }
            Err(err) => {
                debug!(%err, "keeping file entry verbatim");
                Self {
                    extra: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    ..Self::default()
                }
            }
        }
    }

    /// Cost used when nothing else is specified; free if unset.
    pub fn play_cost(&self) -> f64 {
        self.suggested_play_cost.unwrap_or(0.0)
    }

    /// A file is paid if any of its play or buy costs is positive.
    pub fn is_paid(&self) -> bool {
        [
            self.suggested_play_cost,
            self.suggested_buy_cost,
            self.minimum_play_cost,
            self.minimum_buy_cost,
        ]
        .iter()
        .flatten()
        .any(|cost| *cost > 0.0)
    }

    pub(crate) fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|f| *f >= 0.0)
        .map(|f| f as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_object_reads_known_and_extra_keys() {
        let file = ArtifactFile::from_value(&json!({
            "fname": "headshot.jpg",
            "fsize": 100677,
            "type": "Image",
            "cType": "image/jpeg"
        }))
        .unwrap();
        assert_eq!(file.fname.as_deref(), Some("headshot.jpg"));
        assert_eq!(file.fsize, Some(100677));
        assert_eq!(file.file_type.as_deref(), Some("Image"));
        assert_eq!(file.extra.get("cType"), Some(&json!("image/jpeg")));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let file = ArtifactFile::from_value(&json!({
            "fname": "track.mp3",
            "fsize": "2048",
            "duration": "215.5",
            "sugPlay": "not a number"
        }))
        .unwrap();
        assert_eq!(file.fsize, Some(2048));
        assert_eq!(file.duration, Some(215.5));
        assert_eq!(file.suggested_play_cost, None);
    }

    #[test]
    fn test_from_string() {
        let plain = ArtifactFile::from_value(&json!("movie.mp4")).unwrap();
        assert_eq!(plain.fname.as_deref(), Some("movie.mp4"));

        let encoded = ArtifactFile::from_value(&json!("{\"fname\":\"a.txt\",\"fsize\":3}")).unwrap();
        assert_eq!(encoded.fname.as_deref(), Some("a.txt"));
        assert_eq!(encoded.fsize, Some(3));

        assert!(ArtifactFile::from_value(&json!("")).is_none());
        assert!(ArtifactFile::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_flags_given_as_strings() {
        let file = ArtifactFile::from_value(&json!({
            "fname": "a.mp4",
            "disBuy": "true",
            "disPlay": "False"
        }))
        .unwrap();
        assert_eq!(file.disallow_buy, Some(true));
        assert_eq!(file.disallow_play, Some(false));
    }

    #[test]
    fn test_mistyped_name_is_kept_in_extra() {
        let raw = json!({"fname": 42, "fsize": 10, "type": "Audio"});
        let file = ArtifactFile::from_value(&raw).unwrap();
        assert_eq!(file.fname, None);
        assert_eq!(file.fsize, Some(10));
        assert_eq!(file.extra.get("fname"), Some(&json!(42)));
        assert_eq!(file.to_value(), raw);
    }

    #[test]
    fn test_is_paid() {
        let mut file = ArtifactFile::named("a.mp3");
        assert!(!file.is_paid());
        file.suggested_buy_cost = Some(0.0);
        assert!(!file.is_paid());
        file.minimum_play_cost = Some(0.25);
        assert!(file.is_paid());
    }

    #[test]
    fn test_to_value_round_trips_extra_keys() {
        let raw = json!({"fname": "a.bin", "duration": 30.0, "software": "linux"});
        let file = ArtifactFile::from_value(&raw).unwrap();
        let value = file.to_value();
        assert_eq!(value["software"], "linux");
        assert_eq!(value["duration"], json!(30.0));
        assert!(value.get("dname").is_none());
    }
}
