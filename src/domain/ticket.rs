use std::collections::{HashMap, HashSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::ids::{RecordId, StateId, TicketId};

/// Mongo documents carry `_id` next to the application's own `id`. `id` wins;
/// `_id` only stands in when `id` is missing.
fn resolve_record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    let mut record = Map::<String, Value>::deserialize(deserializer)?;
    let mongo_id = record.remove("_id");
    let has_id = record.get("id").is_some_and(|id| !id.is_null());
    if let (false, Some(mongo_id)) = (has_id, mongo_id) {
        record.insert("id".to_string(), mongo_id);
    }
    Ok(Value::Object(record))
}

/// Wires the trait impls to the inherent ones generated by `#[serde(remote = "Self")]`,
/// routing deserialization through [`resolve_record_id`].
macro_rules! api_record {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $name::serialize(self, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let record = resolve_record_id(deserializer)?;
                $name::deserialize(record).map_err(D::Error::custom)
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub state_id: Option<StateId>,
    #[serde(default)]
    pub priority_id: Option<RecordId>,
    #[serde(default)]
    pub type_id: Option<RecordId>,
    #[serde(default)]
    pub assigned_to_user_id: Option<RecordId>,
    #[serde(default)]
    pub created_by_user_id: Option<RecordId>,
    #[serde(default)]
    pub story_points: Option<f32>,
    #[serde(default)]
    pub sprints: Vec<RecordId>,
    #[serde(default)]
    pub labels: Vec<RecordId>,
    #[serde(default)]
    pub parent_ticket_id: Option<TicketId>,
    #[serde(default)]
    pub links: Vec<TicketLink>,
}

api_record!(Ticket);

#[cfg(test)]
impl Ticket {
    pub fn new(id: impl Into<String>, title: impl Into<String>, state_id: Option<StateId>) -> Self {
        Self {
            id: TicketId::new(id),
            title: title.into(),
            description: String::new(),
            state_id,
            priority_id: None,
            type_id: None,
            assigned_to_user_id: None,
            created_by_user_id: None,
            story_points: None,
            sprints: Vec::new(),
            labels: Vec::new(),
            parent_ticket_id: None,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLink {
    #[serde(default)]
    pub link_type_id: Option<RecordId>,
    #[serde(default, alias = "linkedTicketId")]
    pub ticket_id: Option<TicketId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    #[default]
    Open,
    Closed,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Open => "open",
            Disposition::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct WorkflowState {
    pub id: StateId,
    pub name: String,
    #[serde(default)]
    pub disposition: Disposition,
    /// Allowed transition targets. Empty means unrestricted.
    #[serde(default)]
    pub workflow: Vec<StateId>,
}

api_record!(WorkflowState);

impl WorkflowState {
    #[cfg(test)]
    pub fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            disposition: Disposition::Open,
            workflow: Vec::new(),
        }
    }

    pub fn allows_transition_to(&self, target: &StateId) -> bool {
        self.workflow.is_empty() || self.id == *target || self.workflow.contains(target)
    }
}

/// Returns true when making `new_parent` the parent of `child` would close a
/// loop in the parent chain.
pub fn parent_chain_has_cycle(tickets: &[Ticket], child: &TicketId, new_parent: &TicketId) -> bool {
    let parents: HashMap<&TicketId, &TicketId> = tickets
        .iter()
        .filter_map(|ticket| ticket.parent_ticket_id.as_ref().map(|parent| (&ticket.id, parent)))
        .collect();

    let mut seen = HashSet::new();
    let mut cursor = Some(new_parent);
    while let Some(current) = cursor {
        if current == child {
            return true;
        }
        // An existing loop that does not pass through `child` is not ours to report.
        if !seen.insert(current) {
            return false;
        }
        cursor = parents.get(current).copied();
    }
    false
}
