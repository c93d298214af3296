use crate::frame::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum MessageType {
    Request = 0,
    Response = 1,
    HeartBeat = 2,
    Others = 3,
}

impl MessageType {
    pub fn id(self) -> u8 {
        self.into()
    }

    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        Self::try_from(id).map_err(|_| ProtocolError::UnknownMessageType(id))
    }
}

/// Outcome code carried in every header.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum MessageStatus {
    Ok = 20,
    BadRequest = 40,
    BadResponse = 50,
}
