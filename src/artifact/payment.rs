//! Payment rules attached to an artifact.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fiat scale as published: either a plain number or a string such as
/// `"1000:1"`. The stored form is kept so re-encoding is byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scale {
    Number(u64),
    Ratio(String),
}

impl Scale {
    /// Accept a JSON number or string; anything else is ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64))
                .map(Scale::Number),
            Value::String(s) if !s.trim().is_empty() => Some(Scale::Ratio(s.clone())),
            _ => None,
        }
    }

    /// Resolve to a positive integer; anything unusable resolves to 1.
    pub fn resolve(&self) -> u64 {
        let resolved = match self {
            Scale::Number(n) => Some(*n),
            Scale::Ratio(s) => {
                let s = s.trim();
                match s.parse::<f64>() {
                    Ok(f) if f.is_finite() => Some(f as u64),
                    _ => {
                        let mut sides = s.split(':');
                        match (sides.next(), sides.next(), sides.next()) {
                            (Some(lhs), Some(_), None) => lhs.trim().parse::<u64>().ok(),
                            _ => None,
                        }
                    }
                }
            }
        };
        resolved.filter(|n| *n > 0).unwrap_or(1)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scale::Number(n) => Value::from(*n),
            Scale::Ratio(s) => Value::from(s.as_str()),
        }
    }
}

/// Payment terms. Percentages are stored as published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payment {
    pub fiat: Option<String>,
    pub scale: Option<Scale>,
    /// Suggested tips, in fiat divided by the scale.
    pub tips: Vec<f64>,
    /// Coin ticker (lower case) to receiving address.
    pub addresses: BTreeMap<String, String>,
    pub retailer: Option<f64>,
    pub promoter: Option<f64>,
    pub max_discount: Option<f64>,
    /// Token gating rules, kept as published.
    pub tokens: Vec<Value>,
}

impl Payment {
    /// Record a receiving address; the coin key is lower-cased.
    pub fn add_address(&mut self, coin: &str, address: impl Into<String>) {
        self.addresses.insert(coin.to_lowercase(), address.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fiat.is_none()
            && self.scale.is_none()
            && self.tips.is_empty()
            && self.addresses.is_empty()
            && self.retailer.is_none()
            && self.promoter.is_none()
            && self.max_discount.is_none()
            && self.tokens.is_empty()
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(fiat) = &self.fiat {
            map.insert("fiat".into(), Value::from(fiat.as_str()));
        }
        if let Some(scale) = &self.scale {
            map.insert("scale".into(), scale.to_value());
        }
        if !self.tips.is_empty() {
            map.insert("sugTip".into(), Value::from(self.tips.clone()));
        }
        if !self.addresses.is_empty() {
            let addresses = self
                .addresses
                .iter()
                .map(|(coin, addr)| (coin.clone(), Value::from(addr.as_str())))
                .collect();
            map.insert("addresses".into(), Value::Object(addresses));
        }
        for (key, value) in [
            ("retailer", self.retailer),
            ("promoter", self.promoter),
            ("maxdisc", self.max_discount),
        ] {
            if let Some(v) = value {
                map.insert(key.into(), Value::from(v));
            }
        }
        if !self.tokens.is_empty() {
            map.insert("tokens".into(), Value::Array(self.tokens.clone()));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scale_ratio_resolves_to_left_side() {
        assert_eq!(Scale::Ratio("1000:1".into()).resolve(), 1000);
        assert_eq!(Scale::Ratio("250".into()).resolve(), 250);
        assert_eq!(Scale::Number(20).resolve(), 20);
    }

    #[test]
    fn test_scale_unusable_resolves_to_one() {
        assert_eq!(Scale::Ratio("abc".into()).resolve(), 1);
        assert_eq!(Scale::Ratio("1:2:3".into()).resolve(), 1);
        assert_eq!(Scale::Number(0).resolve(), 1);
        assert_eq!(Scale::Ratio("0:1".into()).resolve(), 1);
    }

    #[test]
    fn test_scale_from_value() {
        assert_eq!(Scale::from_value(&json!(1000)), Some(Scale::Number(1000)));
        assert_eq!(
            Scale::from_value(&json!("1000:1")),
            Some(Scale::Ratio("1000:1".into()))
        );
        assert_eq!(Scale::from_value(&json!(null)), None);
        assert_eq!(Scale::from_value(&json!("")), None);
    }

    #[test]
    fn test_addresses_lowercase_coin() {
        let mut payment = Payment::default();
        payment.add_address("BTC", "19HuaNprtc8MpG6bmiPoZigjaEu9xccxps");
        assert_eq!(
            payment.addresses.get("btc").map(String::as_str),
            Some("19HuaNprtc8MpG6bmiPoZigjaEu9xccxps")
        );
        assert!(!payment.is_empty());
    }

    #[test]
    fn test_to_value_omits_unset_fields() {
        let payment = Payment {
            retailer: Some(15.0),
            max_discount: Some(12.5),
            tips: vec![1.0, 2.5],
            ..Payment::default()
        };
        let value = payment.to_value();
        assert_eq!(value["retailer"], json!(15.0));
        assert_eq!(value["maxdisc"], json!(12.5));
        assert_eq!(value["sugTip"], json!([1.0, 2.5]));
        assert!(value.get("promoter").is_none());
        assert!(value.get("tokens").is_none());
    }
}
