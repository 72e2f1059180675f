// Outbound backend client

pub mod client;

pub use client::DispatchClientImpl;
