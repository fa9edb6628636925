//! Strongly-typed identifiers for oncall-sim

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Service-issued identifiers arrive as either JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Opaque identifier of a workday session, issued by the simulation service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkdayId(#[serde(deserialize_with = "string_or_number")] String);

impl WorkdayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkdayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkdayId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkdayId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a generated incident
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(#[serde(deserialize_with = "string_or_number")] String);

impl IncidentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IncidentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Numeric identifier of a company persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(i64);

impl CompanyId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CompanyId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workday_id_equality() {
        let id1 = WorkdayId::new("wd-1");
        let id2 = WorkdayId::new("wd-1");
        let id3 = WorkdayId::new("wd-2");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ids_serialize_as_plain_values() {
        let company = CompanyId::new(7);
        assert_eq!(serde_json::to_string(&company).unwrap(), "7");

        let incident = IncidentId::new("inc-42");
        let json = serde_json::to_string(&incident).unwrap();
        assert_eq!(json, "\"inc-42\"");
        let parsed: IncidentId = serde_json::from_str(&json).unwrap();
        assert_eq!(incident, parsed);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let workday: WorkdayId = serde_json::from_str("12").unwrap();
        assert_eq!(workday.as_str(), "12");

        let incident: IncidentId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(incident.as_str(), "abc");
    }
}
