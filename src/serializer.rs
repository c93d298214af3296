use crate::error::SerializationError;
use crate::frame::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Body codecs selectable by the serializer id carried in each header.
///
/// The id is part of the wire format, so existing discriminants must never be
/// renumbered. Ids above 15 cannot be expressed in the packed header layout.
#[repr(u8)]
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    /// Fixed-layout binary encoding (`bincode`).
    Native = 0,
    #[default]
    Json = 1,
    /// Bit-packed binary encoding (`bitcode`).
    Compact = 2,
}

impl SerializerKind {
    pub fn id(self) -> u8 {
        self.into()
    }

    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        Self::try_from(id).map_err(|_| ProtocolError::UnknownSerializer(id))
    }

    pub fn name(self) -> &'static str {
        match self {
            SerializerKind::Native => "native",
            SerializerKind::Json => "json",
            SerializerKind::Compact => "compact",
        }
    }

    pub fn serialize<T>(self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: Serialize + ?Sized,
    {
        let result = match self {
            SerializerKind::Native => bincode::serialize(value).map_err(|e| e.to_string()),
            SerializerKind::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
            SerializerKind::Compact => bitcode::serialize(value).map_err(|e| e.to_string()),
        };

        result.map_err(|reason| SerializationError::Serialize {
            serializer: self.name(),
            reason,
        })
    }

    pub fn deserialize<T>(self, bytes: &[u8]) -> Result<T, SerializationError>
    where
        T: DeserializeOwned,
    {
        let result = match self {
            SerializerKind::Native => bincode::deserialize(bytes).map_err(|e| e.to_string()),
            SerializerKind::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            SerializerKind::Compact => bitcode::deserialize(bytes).map_err(|e| e.to_string()),
        };

        result.map_err(|reason| SerializationError::Deserialize {
            serializer: self.name(),
            reason,
        })
    }
}
