//! Fixed-schema person description and normalization of loose JSON into it.
//!
//! Enumerated fields are matched case-insensitively with spaces and hyphens
//! treated as underscores. Anything unrecognized falls back to the field's
//! sentinel, so a normalized description is always valid.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::constants::CLOTHING_MAX_CHARS;

const UNKNOWN_TEXT: &str = "unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    Child,
    Teen,
    YoungAdult,
    Adult,
    Senior,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadAccessory {
    #[default]
    None,
    Beard,
    Mustache,
    Tattoos,
    Beanie,
    Cap,
    Hood,
    Hat,
    Glasses,
    Sunglasses,
    Other,
}

/// Lowercases and maps separators to `_`.
fn label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match label(raw).as_str() {
            "male" | "man" => Gender::Male,
            "female" | "woman" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl AgeBracket {
    pub fn parse(raw: &str) -> Self {
        match label(raw).as_str() {
            "child" => AgeBracket::Child,
            "teen" | "teenager" => AgeBracket::Teen,
            "young_adult" => AgeBracket::YoungAdult,
            "adult" => AgeBracket::Adult,
            "senior" | "elderly" => AgeBracket::Senior,
            _ => AgeBracket::Unknown,
        }
    }
}

impl HeadAccessory {
    /// Empty input is `None`; any other unlisted value is `Other`.
    pub fn parse(raw: &str) -> Self {
        match label(raw).as_str() {
            "" | "none" => HeadAccessory::None,
            "beard" => HeadAccessory::Beard,
            "mustache" | "moustache" => HeadAccessory::Mustache,
            "tattoos" | "tattoo" => HeadAccessory::Tattoos,
            "beanie" => HeadAccessory::Beanie,
            "cap" => HeadAccessory::Cap,
            "hood" => HeadAccessory::Hood,
            "hat" => HeadAccessory::Hat,
            "glasses" => HeadAccessory::Glasses,
            "sunglasses" => HeadAccessory::Sunglasses,
            _ => HeadAccessory::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedDescription {
    pub gender: Gender,
    pub age: AgeBracket,
    pub upper_clothing: String,
    pub lower_clothing: String,
    pub head_accessory: HeadAccessory,
}

impl Default for ConsolidatedDescription {
    fn default() -> Self {
        Self {
            gender: Gender::Unknown,
            age: AgeBracket::Unknown,
            upper_clothing: UNKNOWN_TEXT.to_string(),
            lower_clothing: UNKNOWN_TEXT.to_string(),
            head_accessory: HeadAccessory::None,
        }
    }
}

impl ConsolidatedDescription {
    /// Normalizes a JSON object into the schema. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).map(value_text).unwrap_or_default();

        Some(Self {
            gender: Gender::parse(&text("gender")),
            age: AgeBracket::parse(&text("age")),
            upper_clothing: clothing(&text("upper_clothing")),
            lower_clothing: clothing(&text("lower_clothing")),
            head_accessory: HeadAccessory::parse(&text("head_accessory")),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Strings as-is; arrays joined with ", "; null as empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn clothing(raw: &str) -> String {
    let truncated: String = raw.trim().chars().take(CLOTHING_MAX_CHARS).collect();
    let truncated = truncated.trim_end();
    if truncated.is_empty() {
        UNKNOWN_TEXT.to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::exact("male", Gender::Male)]
    #[case::upper("FEMALE", Gender::Female)]
    #[case::padded("  Male ", Gender::Male)]
    #[case::unlisted("robot", Gender::Unknown)]
    fn test_gender_parse(#[case] raw: &str, #[case] expected: Gender) {
        assert_eq!(Gender::parse(raw), expected);
    }

    #[rstest]
    #[case::underscore("young_adult", AgeBracket::YoungAdult)]
    #[case::space("Young Adult", AgeBracket::YoungAdult)]
    #[case::hyphen("young-adult", AgeBracket::YoungAdult)]
    #[case::senior("SENIOR", AgeBracket::Senior)]
    #[case::number("35", AgeBracket::Unknown)]
    fn test_age_parse(#[case] raw: &str, #[case] expected: AgeBracket) {
        assert_eq!(AgeBracket::parse(raw), expected);
    }

    #[rstest]
    #[case::empty("", HeadAccessory::None)]
    #[case::none("None", HeadAccessory::None)]
    #[case::listed("Sunglasses", HeadAccessory::Sunglasses)]
    #[case::unlisted("scarf", HeadAccessory::Other)]
    fn test_head_accessory_parse(#[case] raw: &str, #[case] expected: HeadAccessory) {
        assert_eq!(HeadAccessory::parse(raw), expected);
    }

    #[test]
    fn test_from_value_normalizes_every_field() {
        let value = json!({
            "gender": "Female",
            "age": "adult",
            "upper_clothing": "red hoodie with a large white logo on the front",
            "lower_clothing": "  ",
            "head_accessory": "cap",
            "extra": "ignored"
        });
        let desc = ConsolidatedDescription::from_value(&value).unwrap();
        assert_eq!(desc.gender, Gender::Female);
        assert_eq!(desc.age, AgeBracket::Adult);
        assert_eq!(desc.upper_clothing, "red hoodie with a large w");
        assert_eq!(desc.upper_clothing.chars().count(), 25);
        assert_eq!(desc.lower_clothing, "unknown");
        assert_eq!(desc.head_accessory, HeadAccessory::Cap);
    }

    #[test]
    fn test_from_value_missing_fields_use_sentinels() {
        let desc = ConsolidatedDescription::from_value(&json!({})).unwrap();
        assert_eq!(desc, ConsolidatedDescription::default());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(ConsolidatedDescription::from_value(&json!(["male"])).is_none());
        assert!(ConsolidatedDescription::from_value(&json!("male")).is_none());
    }

    #[test]
    fn test_array_clothing_is_joined() {
        let desc = ConsolidatedDescription::from_value(&json!({
            "upper_clothing": ["shirt", "vest"]
        }))
        .unwrap();
        assert_eq!(desc.upper_clothing, "shirt, vest");
    }

    #[test]
    fn test_to_value_uses_snake_case_labels() {
        let desc = ConsolidatedDescription {
            age: AgeBracket::YoungAdult,
            ..Default::default()
        };
        let value = desc.to_value();
        assert_eq!(value["age"], "young_adult");
        assert_eq!(value["head_accessory"], "none");
        assert_eq!(value["gender"], "unknown");
    }

    #[test]
    fn test_normalizing_serialized_description_is_identity() {
        let desc = ConsolidatedDescription {
            gender: Gender::Male,
            age: AgeBracket::Senior,
            upper_clothing: "grey coat".into(),
            lower_clothing: "jeans".into(),
            head_accessory: HeadAccessory::Hat,
        };
        assert_eq!(ConsolidatedDescription::from_value(&desc.to_value()), Some(desc));
    }
}
