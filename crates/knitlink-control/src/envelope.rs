use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ControlError, Result};
use crate::id::{MessageId, WireId};
use crate::payload::NetworkParams;

/// One control-channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Status code on set/delete replies; 0 is success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    /// Top-level members other than `id`, `data` and `result`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Create a bare envelope for an arbitrary id.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            data: None,
            result: None,
            extra: Map::new(),
        }
    }

    /// Create a request with no payload.
    pub fn request(message: MessageId) -> Self {
        Self::new(message.request_id())
    }

    /// Create a set-network-params request.
    pub fn set_network_params(params: &NetworkParams) -> Result<Self> {
        let mut envelope = Self::request(MessageId::SetNetworkParams);
        envelope.data = Some(serde_json::to_value(params)?);
        Ok(envelope)
    }

    /// Create a delete-files request. The paths travel at top level.
    pub fn delete_files<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = paths
            .into_iter()
            .map(|path| Value::String(path.into()))
            .collect();
        let mut envelope = Self::request(MessageId::DeleteFiles);
        envelope
            .extra
            .insert("list_files".to_string(), Value::Array(list));
        envelope
    }

    /// Known-message classification of this envelope's id.
    pub fn wire_id(&self) -> WireId {
        MessageId::from_wire(self.id)
    }

    /// Deserialize `data` into a typed payload.
    ///
    /// A missing `data` member is treated as JSON `null`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|source| ControlError::Payload {
            id: self.id,
            source,
        })
    }

    /// True when no `result` is present or it is 0.
    pub fn is_success(&self) -> bool {
        self.result.is_none_or(|code| code == 0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse a text unit into an envelope.
pub fn parse(text: &str) -> Result<Envelope> {
    serde_json::from_str(text).map_err(|err| ControlError::MalformedJson {
        text: text.to_string(),
        message: err.to_string(),
    })
}
