mod request_id_generator;

pub use request_id_generator::RequestIdGenerator;
