mod bind_tcp_listener_on_random_port;
mod listener_service_info;

pub use bind_tcp_listener_on_random_port::bind_tcp_listener_on_random_port;
pub use listener_service_info::listener_service_info;
