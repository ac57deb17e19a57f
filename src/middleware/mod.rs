pub mod client_ip;

pub use client_ip::stamp_client_ip;
