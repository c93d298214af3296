use crate::constants::DEFAULT_SERVICE_VERSION;
use crate::error::{RpcError, SerializationError};
use crate::serializer::SerializerKind;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A remote call, immutable once built.
///
/// Arguments travel pre-encoded with the serializer named in the frame
/// header, one entry per positional parameter. `parameter_types` carries a
/// descriptor per argument in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub service_name: String,
    pub method_name: String,
    pub service_version: String,
    pub parameter_types: Vec<String>,
    pub args: Vec<Vec<u8>>,
}

impl RpcRequest {
    pub fn new(service_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            parameter_types: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Starts a request whose arguments will be encoded with `serializer`.
    pub fn builder(
        serializer: SerializerKind,
        service_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> RpcRequestBuilder {
        RpcRequestBuilder {
            serializer,
            request: Self::new(service_name, method_name),
        }
    }

    /// `name:version`, the key under which providers of this service register.
    pub fn service_key(&self) -> String {
        format!("{}:{}", self.service_name, self.service_version)
    }

    /// Decodes the positional argument at `index`.
    pub fn arg<T>(&self, serializer: SerializerKind, index: usize) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.args.get(index).ok_or_else(|| {
            RpcError::Serialization(SerializationError::Deserialize {
                serializer: serializer.name(),
                reason: format!(
                    "{}.{} has no argument at position {index}",
                    self.service_name, self.method_name
                ),
            })
        })?;

        Ok(serializer.deserialize(bytes)?)
    }
}

pub struct RpcRequestBuilder {
    serializer: SerializerKind,
    request: RpcRequest,
}

impl RpcRequestBuilder {
    pub fn version(mut self, service_version: impl Into<String>) -> Self {
        self.request.service_version = service_version.into();
        self
    }

    /// Appends a positional argument, recording its Rust type name as the
    /// parameter descriptor.
    pub fn arg<T>(mut self, value: &T) -> Result<Self, SerializationError>
    where
        T: Serialize,
    {
        let bytes = self.serializer.serialize(value)?;
        self.request
            .parameter_types
            .push(std::any::type_name::<T>().to_string());
        self.request.args.push(bytes);
        Ok(self)
    }

    pub fn build(self) -> RpcRequest {
        self.request
    }
}

/// The outcome of a remote call.
///
/// A carried `exception` means the provider ran the call and it failed; the
/// transport itself succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub data: Option<Vec<u8>>,
    pub data_type: Option<String>,
    pub message: String,
    pub exception: Option<String>,
}

impl RpcResponse {
    /// A response carrying no data and no exception.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_data<T>(serializer: SerializerKind, value: &T) -> Result<Self, SerializationError>
    where
        T: Serialize,
    {
        Ok(Self::from_encoded(
            serializer.serialize(value)?,
            std::any::type_name::<T>(),
        ))
    }

    pub fn from_encoded(data: Vec<u8>, data_type: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            data_type: Some(data_type.into()),
            message: "ok".to_string(),
            exception: None,
        }
    }

    pub fn failure(message: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exception: Some(exception.into()),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.exception.is_some()
    }

    /// Decodes `data`, yielding `None` when the response carries nothing.
    pub fn decode_data<T>(&self, serializer: SerializerKind) -> Result<Option<T>, SerializationError>
    where
        T: DeserializeOwned,
    {
        self.data
            .as_deref()
            .map(|bytes| serializer.deserialize(bytes))
            .transpose()
    }
}
