// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Accepts file patterns as a single string or a list of strings.

use nonempty::NonEmpty;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Patterns {
    One(String),
    Many(Vec<String>),
}

pub fn deserialize_patterns<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = match Patterns::deserialize(deserializer)? {
        Patterns::One(s) => vec![s],
        Patterns::Many(v) => v,
    };

    let patterns: Vec<String> = values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    NonEmpty::from_vec(patterns)
        .ok_or_else(|| serde::de::Error::custom("at least one file pattern is required"))
}
