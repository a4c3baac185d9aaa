//! Structural window matching.
//!
//! A [`MatchRule`] is the "expected subset" of a window's attributes.  Each
//! expected value is tagged once, at load time, as one of the [`RuleValue`]
//! variants, and evaluated by a single `match` in [`RuleValue::matches`]:
//!
//! | rule value        | window value must...                              |
//! |-------------------|---------------------------------------------------|
//! | string            | contain it as a **substring**                     |
//! | array             | contain every element (subset, order ignored)     |
//! | object            | be an object matching it recursively              |
//! | number/bool/null  | be exactly equal                                  |
//!
//! Keys within one rule are AND'd; the rules of one app entry are OR'd
//! ([`matches_any`]).
//!
//! String matching is deliberately lax: `{"title": "Spotify"}` matches a
//! window titled `"Not Spotify At All"`.

use crate::window::Client;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One expected attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    /// Substring of the window's string (or member of the window's array).
    Text(String),
    /// Every element must appear in the window's array.
    Subset(Vec<Value>),
    /// Recursive match against a nested object (e.g. `workspace`).
    Nested(MatchRule),
    /// Exact equality for every other JSON type.
    Exact(Value),
}

impl RuleValue {
    /// Evaluate this expectation against the window's value for the same key.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            RuleValue::Text(expected) => match actual {
                Value::String(s) => s.contains(expected.as_str()),
                Value::Array(items) => items.iter().any(|v| v.as_str() == Some(expected)),
                _ => false,
            },
            RuleValue::Subset(expected) => match actual {
                Value::Array(items) => expected.iter().all(|e| items.contains(e)),
                _ => false,
            },
            RuleValue::Nested(rule) => match actual {
                Value::Object(map) => rule.matches_map(map),
                _ => false,
            },
            RuleValue::Exact(expected) => expected == actual,
        }
    }
}

impl From<Value> for RuleValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RuleValue::Text(s),
            Value::Array(items) => RuleValue::Subset(items),
            Value::Object(map) => RuleValue::Nested(MatchRule::from(map)),
            other => RuleValue::Exact(other),
        }
    }
}

impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(RuleValue::from)
    }
}

/// A conjunction of attribute expectations.
///
/// The empty rule matches every window; an app entry with *no* rules matches
/// none (see [`matches_any`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRule {
    fields: Vec<(String, RuleValue)>,
}

impl MatchRule {
    pub fn new(fields: impl IntoIterator<Item = (String, RuleValue)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn fields(&self) -> &[(String, RuleValue)] {
        &self.fields
    }

    /// `true` if every key of the rule is present in `window` and satisfied.
    pub fn matches(&self, window: &Client) -> bool {
        self.matches_map(window.attributes())
    }

    fn matches_map(&self, attributes: &Map<String, Value>) -> bool {
        self.fields.iter().all(|(key, expected)| {
            attributes
                .get(key)
                .map_or(false, |actual| expected.matches(actual))
        })
    }
}

impl From<Map<String, Value>> for MatchRule {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map.into_iter().map(|(k, v)| (k, RuleValue::from(v))))
    }
}

impl<'de> Deserialize<'de> for MatchRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(MatchRule::from)
    }
}

/// `true` if `window` satisfies at least one of `rules`.
///
/// An empty rule list never matches, so an entry without rules is always
/// considered missing.
pub fn matches_any(window: &Client, rules: &[MatchRule]) -> bool {
    rules.iter().any(|rule| rule.matches(window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(value: Value) -> Client {
        Client::from_value(value).unwrap()
    }

    fn rule(value: Value) -> MatchRule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn values_are_tagged_by_json_type() {
        let r = rule(json!({
            "class": "foot",
            "tags": ["a"],
            "workspace": { "name": "x" },
            "floating": true
        }));
        let kinds: Vec<_> = r
            .fields()
            .iter()
            .map(|(_, v)| match v {
                RuleValue::Text(_) => "text",
                RuleValue::Subset(_) => "subset",
                RuleValue::Nested(_) => "nested",
                RuleValue::Exact(_) => "exact",
            })
            .collect();
        assert_eq!(kinds, ["text", "subset", "nested", "exact"]);
    }

    #[test]
    fn string_rule_is_a_substring_test() {
        let r = rule(json!({ "title": "Spotify" }));
        assert!(r.matches(&client(json!({ "title": "Spotify Free" }))));
        assert!(r.matches(&client(json!({ "title": "Not Spotify At All" }))));
        assert!(!r.matches(&client(json!({ "title": "spotify" }))));
    }

    #[test]
    fn missing_key_fails() {
        let r = rule(json!({ "class": "discord" }));
        assert!(!r.matches(&client(json!({ "title": "discord" }))));
    }

    #[test]
    fn nested_workspace_rule() {
        let w = client(json!({ "workspace": { "id": -97, "name": "special:sysmon" } }));
        assert!(rule(json!({ "workspace": { "name": "special:sysmon" } })).matches(&w));
        assert!(!rule(json!({ "workspace": { "name": "special:other" } })).matches(&w));
    }

    #[test]
    fn nested_rule_against_scalar_fails() {
        let w = client(json!({ "workspace": "special:sysmon" }));
        assert!(!rule(json!({ "workspace": { "name": "special:sysmon" } })).matches(&w));
    }

    #[test]
    fn list_rule_is_a_subset_test() {
        let w = client(json!({ "tags": ["a", "b", "c"] }));
        assert!(rule(json!({ "tags": ["c", "a"] })).matches(&w));
        assert!(!rule(json!({ "tags": ["a", "d"] })).matches(&w));
        assert!(!rule(json!({ "tags": ["a"] })).matches(&client(json!({ "tags": "abc" }))));
    }

    #[test]
    fn string_rule_against_list_is_membership() {
        let w = client(json!({ "tags": ["pinned", "scratch"] }));
        assert!(rule(json!({ "tags": "scratch" })).matches(&w));
        assert!(!rule(json!({ "tags": "scr" })).matches(&w));
    }

    #[test]
    fn other_types_need_exact_equality() {
        let w = client(json!({ "floating": true, "pid": 42 }));
        assert!(rule(json!({ "floating": true, "pid": 42 })).matches(&w));
        assert!(!rule(json!({ "pid": 43 })).matches(&w));
        assert!(!rule(json!({ "floating": "true" })).matches(&w));
    }

    #[test]
    fn fields_within_a_rule_are_anded() {
        let r = rule(json!({ "class": "btop", "title": "btop" }));
        assert!(r.matches(&client(json!({ "class": "btop", "title": "btop" }))));
        assert!(!r.matches(&client(json!({ "class": "btop", "title": "fish" }))));
    }

    #[test]
    fn rules_are_ored() {
        let rules = vec![rule(json!({ "class": "X" })), rule(json!({ "class": "Y" }))];
        assert!(matches_any(&client(json!({ "class": "Y" })), &rules));
        assert!(!matches_any(&client(json!({ "class": "Z" })), &rules));
    }

    #[test]
    fn no_rules_never_match() {
        assert!(!matches_any(&client(json!({ "class": "anything" })), &[]));
    }

    #[test]
    fn empty_rule_matches_everything() {
        assert!(MatchRule::default().matches(&client(json!({ "class": "x" }))));
    }
}
