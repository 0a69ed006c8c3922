use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::OrderStatus;
use super::errors::OrderError;
use super::value_objects::OrderChanges;

// ============================================================================
// Order Commands - Represent user intent against an existing order
// ============================================================================
//
// Bodies are kept as raw JSON until the policy has seen which fields they
// name. Typed values are only read by `changes()`, after authorization and
// the visibility check.
//
// ============================================================================

pub const STATUS_FIELD: &str = "status";
pub const DELIVERY_CREW_FIELD: &str = "delivery_crew";

/// A JSON object body that may have failed to parse.
#[derive(Debug, Clone, Default)]
struct RawBody {
    fields: Map<String, Value>,
    malformed: Option<String>,
}

impl RawBody {
    fn from_slice(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(e) => Self::malformed(format!("Malformed JSON body: {e}")),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields, malformed: None },
            _ => Self::malformed("Expected a JSON object".to_string()),
        }
    }

    fn malformed(message: String) -> Self {
        Self { fields: Map::new(), malformed: Some(message) }
    }

    fn check(&self) -> Result<(), OrderError> {
        match &self.malformed {
            Some(message) => Err(OrderError::InvalidBody(message.clone())),
            None => Ok(()),
        }
    }

    fn field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, OrderError> {
        self.fields
            .get(name)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| OrderError::InvalidBody(format!("Invalid `{name}`: {e}")))
            })
            .transpose()
    }
}

/// Partial update body (PATCH).
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    body: RawBody,
}

impl OrderPatch {
    pub fn from_slice(body: &[u8]) -> Self {
        Self { body: RawBody::from_slice(body) }
    }

    #[cfg(test)]
    pub fn from_value(body: Value) -> Self {
        Self { body: RawBody::from_value(body) }
    }

    /// Names of every field the request tries to write.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.body.fields.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }

    /// The requested status, if present and well-formed.
    pub fn requested_status(&self) -> Option<OrderStatus> {
        self.body.field(STATUS_FIELD).ok().flatten()
    }

    /// Typed changes. `delivery_crew: null` unassigns.
    pub fn changes(&self) -> Result<OrderChanges, OrderError> {
        self.body.check()?;
        let delivery_crew = match self.body.fields.get(DELIVERY_CREW_FIELD) {
            None => None,
            Some(_) => Some(self.body.field::<Option<Uuid>>(DELIVERY_CREW_FIELD)?.flatten()),
        };
        Ok(OrderChanges {
            status: self.body.field(STATUS_FIELD)?,
            delivery_crew,
        })
    }
}

/// Full replacement of the mutable fields (PUT): `status` is required,
/// `delivery_crew` defaults to unassigned.
#[derive(Debug, Clone, Default)]
pub struct OrderReplace {
    body: RawBody,
}

impl OrderReplace {
    #[cfg(test)]
    pub fn new(status: OrderStatus, delivery_crew: Option<Uuid>) -> Self {
        let mut fields = Map::new();
        fields.insert(STATUS_FIELD.to_string(), serde_json::json!(status));
        fields.insert(DELIVERY_CREW_FIELD.to_string(), serde_json::json!(delivery_crew));
        Self::from_value(Value::Object(fields))
    }

    pub fn from_slice(body: &[u8]) -> Self {
        Self { body: RawBody::from_slice(body) }
    }

    #[cfg(test)]
    pub fn from_value(body: Value) -> Self {
        Self { body: RawBody::from_value(body) }
    }

    pub fn changes(&self) -> Result<OrderChanges, OrderError> {
        self.body.check()?;
        if let Some(unknown) = self
            .body
            .fields
            .keys()
            .find(|key| *key != STATUS_FIELD && *key != DELIVERY_CREW_FIELD)
        {
            return Err(OrderError::InvalidBody(format!("Unknown field `{unknown}`")));
        }
        let status = self
            .body
            .field::<OrderStatus>(STATUS_FIELD)?
            .ok_or_else(|| OrderError::InvalidBody(format!("`{STATUS_FIELD}` is required")))?;
        let delivery_crew = self.body.field::<Option<Uuid>>(DELIVERY_CREW_FIELD)?.flatten();

        Ok(OrderChanges {
            status: Some(status),
            delivery_crew: Some(delivery_crew),
        })
    }
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    Patch(OrderPatch),
    Replace(OrderReplace),
    Delete,
}

impl OrderCommand {
    pub fn action(&self) -> &'static str {
        match self {
            OrderCommand::Patch(_) => "patch",
            OrderCommand::Replace(_) => "replace",
            OrderCommand::Delete => "delete",
        }
    }

    pub fn changes(&self) -> Result<OrderChanges, OrderError> {
        match self {
            OrderCommand::Patch(patch) => patch.changes(),
            OrderCommand::Replace(replace) => replace.changes(),
            OrderCommand::Delete => Ok(OrderChanges::default()),
        }
    }
}
