pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod rpc;
pub mod serializer;
pub mod utils;
