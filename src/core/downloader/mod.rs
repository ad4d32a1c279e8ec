mod client;

pub use client::{is_not_found, Downloader};
