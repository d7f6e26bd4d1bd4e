pub mod client;
pub mod resolver;

pub use client::HttpPeerClient;
pub use resolver::resolve;
