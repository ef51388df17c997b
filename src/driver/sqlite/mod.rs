mod client;

pub use client::{ConnectionOptions, SqliteClient};
