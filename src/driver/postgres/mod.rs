mod client;

pub use client::{ConnectionOptions, PostgresClient};
