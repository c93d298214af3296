use crate::service_definition::{USER_SERVICE, User, user_methods};
use wirecall::error::RpcError;
use wirecall_service_caller::ServiceProxy;

/// Hand-written stub for `UserService`.
#[derive(Clone)]
pub struct UserServiceClient {
    proxy: ServiceProxy,
}

impl UserServiceClient {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub async fn get_user(&self, user: &User) -> Result<Option<User>, RpcError> {
        let request = self
            .proxy
            .request(USER_SERVICE, user_methods::GET_USER)
            .arg(user)?
            .build();
        self.proxy.call(request).await
    }

    /// Falls back to `1` when the provider sends no number back.
    pub async fn get_number(&self) -> Result<i16, RpcError> {
        let request = self
            .proxy
            .request(USER_SERVICE, user_methods::GET_NUMBER)
            .build();
        Ok(self.proxy.call(request).await?.unwrap_or(1))
    }
}
