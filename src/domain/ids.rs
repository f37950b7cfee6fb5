use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier as it may arrive over the wire: the API hands out both quoted
/// and bare numeric ids for the same records.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
    Float(f64),
}

impl RawId {
    fn into_canonical(self) -> Result<String, String> {
        match self {
            RawId::Text(text) => Ok(text.trim().to_string()),
            RawId::Number(number) => Ok(number.to_string()),
            RawId::Float(number) if number.is_finite() && number.fract() == 0.0 => {
                Ok(format!("{number:.0}"))
            }
            RawId::Float(number) => Err(format!("id {number} is not a whole number")),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into().trim().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = RawId::deserialize(deserializer)?;
                raw.into_canonical().map(Self).map_err(D::Error::custom)
            }
        }
    };
}

string_id!(
    /// Ticket identifier, always held in its string form.
    TicketId
);

string_id!(
    /// Workflow state identifier, always held in its string form.
    StateId
);

string_id!(
    /// Reference to any other record (priority, type, user, sprint, label, link type).
    RecordId
);

impl StateId {
    /// Id of one of the seeded states (1 = Created .. 7 = Duplicate).
    pub fn well_known(number: u8) -> Self {
        Self(number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_ids_compare_equal() {
        let from_number: TicketId = serde_json::from_str("7").unwrap();
        let from_text: TicketId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(from_number.as_str(), "7");
    }

    #[test]
    fn serializes_as_string() {
        let id = StateId::well_known(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5\"");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(TicketId::new(" 42 ").as_str(), "42");
        let parsed: StateId = serde_json::from_str("\" 3\"").unwrap();
        assert_eq!(parsed, StateId::well_known(3));
    }

    #[test]
    fn accepts_whole_float_ids() {
        let state: StateId = serde_json::from_str("1.0").unwrap();
        assert_eq!(state, StateId::well_known(1));
        assert!(serde_json::from_str::<StateId>("1.5").is_err());
    }

    #[test]
    fn rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<TicketId>("{\"id\": 1}").is_err());
    }
}
