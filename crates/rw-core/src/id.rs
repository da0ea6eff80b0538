use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A handle for a page element the extension has observed.
///
/// Handles are minted by the page adapter; the element itself stays owned
/// by the page. Holding a handle says nothing about whether the element is
/// still attached, so always ask the host before touching it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(u32);

impl ElementId {
    /// Mint a fresh handle, unique for the lifetime of the process.
    pub fn next() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#el{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#el{}", self.0)
    }
}

/// Identifier of a rewrite agent on the remote service.
///
/// The service has shipped both numeric and string ids, so deserialization
/// accepts either and normalizes to a string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent:{}", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for AgentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Numeric ids go back out as numbers so the service sees what it sent.
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for AgentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AgentIdVisitor;

        impl Visitor<'_> for AgentIdVisitor {
            type Value = AgentId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an agent id as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AgentId, E> {
                Ok(AgentId::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<AgentId, E> {
                Ok(AgentId::new(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<AgentId, E> {
                Ok(AgentId::new(v.to_string()))
            }
        }

        deserializer.deserialize_any(AgentIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn agent_id_accepts_numbers_and_strings() {
        let n: AgentId = serde_json::from_str("42").unwrap();
        let s: AgentId = serde_json::from_str(r#""formal""#).unwrap();
        assert_eq!(n.as_str(), "42");
        assert_eq!(s.as_str(), "formal");
    }

    #[test]
    fn numeric_agent_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&AgentId::new("7")).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&AgentId::new("007")).unwrap(),
            r#""007""#
        );
    }
}
