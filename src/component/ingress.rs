//! Decoding component records delivered by the external store
//!
//! A delivery is a JSON array of `{ "id", "kind", "payload" }` objects. Each
//! record is decoded on its own so one bad record never hides the others.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::IngressError;

use super::{Component, ComponentData, ComponentKind};

/// A record as it arrives, before the payload is checked against the kind
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Result of decoding one delivery
#[derive(Debug, Default)]
pub struct IngressBatch {
    pub components: Vec<Component>,
    pub errors: Vec<IngressError>,
}

impl IngressBatch {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Component {
    /// Decode one record, rejecting unknown kinds and mismatched payloads
    pub fn from_record(record: RawRecord) -> Result<Component, IngressError> {
        let kind = ComponentKind::from_tag(&record.kind)
            .ok_or_else(|| IngressError::unknown_kind(&record.id, &record.kind))?;
        let data = decode_payload(&record.id, kind, record.payload)?;
        Ok(Component::new(record.id, data))
    }
}

fn payload<T: DeserializeOwned>(id: &str, kind: ComponentKind, value: Value) -> Result<T, IngressError> {
    serde_json::from_value(value)
        .map_err(|e| IngressError::malformed_payload(id, kind, e.to_string()))
}

fn decode_payload(id: &str, kind: ComponentKind, value: Value) -> Result<ComponentData, IngressError> {
    Ok(match kind {
        ComponentKind::Stock => ComponentData::Stock(payload(id, kind, value)?),
        ComponentKind::Flow => ComponentData::Flow(payload(id, kind, value)?),
        ComponentKind::Parameter => ComponentData::Parameter(payload(id, kind, value)?),
        ComponentKind::Variable => ComponentData::Variable(payload(id, kind, value)?),
        ComponentKind::SumVariable => ComponentData::SumVariable(payload(id, kind, value)?),
        ComponentKind::Connection => ComponentData::Connection(payload(id, kind, value)?),
        ComponentKind::Cloud => ComponentData::Cloud(payload(id, kind, value)?),
        ComponentKind::StaticModel => ComponentData::StaticModel(payload(id, kind, value)?),
        ComponentKind::Substitution => ComponentData::Substitution(payload(id, kind, value)?),
        ComponentKind::Scenario => ComponentData::Scenario(payload(id, kind, value)?),
        ComponentKind::CldVertex => ComponentData::CldVertex(payload(id, kind, value)?),
        ComponentKind::CldLink => ComponentData::CldLink(payload(id, kind, value)?),
        ComponentKind::StickyNote => ComponentData::StickyNote(payload(id, kind, value)?),
        ComponentKind::LoopIcon => ComponentData::LoopIcon(payload(id, kind, value)?),
    })
}

/// Decode already-parsed JSON values, isolating failures per record
pub fn from_values(values: Vec<Value>) -> IngressBatch {
    let mut batch = IngressBatch::default();

    for (index, value) in values.into_iter().enumerate() {
        let decoded = serde_json::from_value::<RawRecord>(value)
            .map_err(|e| IngressError::malformed_record(index, e.to_string()))
            .and_then(Component::from_record);

        match decoded {
            Ok(component) => batch.components.push(component),
            Err(err) => {
                tracing::warn!(%err, "rejected component record");
                batch.errors.push(err);
            }
        }
    }

    batch
}

/// Decode a delivery given as JSON text.
///
/// Fails only when the text is not a JSON array; bad records end up in
/// [`IngressBatch::errors`].
pub fn parse_records(json: &str) -> Result<IngressBatch, IngressError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(from_values(values))
}
