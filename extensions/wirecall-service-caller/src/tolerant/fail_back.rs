use crate::{TolerantContext, TolerantStrategy};
use serde::Serialize;
use std::collections::HashMap;
use wirecall::error::{RpcError, SerializationError};
use wirecall::rpc::RpcResponse;
use wirecall::serializer::SerializerKind;

/// Answers failed calls from a table of per-method defaults.
///
/// Entries are encoded up front with the serializer the caller decodes with.
/// Methods without an entry get an empty response. No network calls are made.
#[derive(Debug, Clone)]
pub struct FailBackTolerant {
    serializer: SerializerKind,
    defaults: HashMap<String, (Vec<u8>, String)>,
}

impl FailBackTolerant {
    pub fn new(serializer: SerializerKind) -> Self {
        Self {
            serializer,
            defaults: HashMap::new(),
        }
    }

    pub fn with_default<T>(
        mut self,
        method_name: impl Into<String>,
        value: &T,
    ) -> Result<Self, SerializationError>
    where
        T: Serialize,
    {
        let data = self.serializer.serialize(value)?;
        self.defaults.insert(
            method_name.into(),
            (data, std::any::type_name::<T>().to_string()),
        );
        Ok(self)
    }

    pub fn has_default(&self, method_name: &str) -> bool {
        self.defaults.contains_key(method_name)
    }
}

#[async_trait::async_trait]
impl TolerantStrategy for FailBackTolerant {
    async fn do_tolerant(
        &self,
        context: TolerantContext,
        error: RpcError,
    ) -> Result<RpcResponse, RpcError> {
        let method = &context.request.method_name;
        tracing::warn!(%method, %error, "call failed; serving fail-back default");

        let mut response = match self.defaults.get(method) {
            Some((data, data_type)) => RpcResponse::from_encoded(data.clone(), data_type.clone()),
            None => RpcResponse::empty(""),
        };
        response.message = format!("fail-back: {error}");
        Ok(response)
    }
}
