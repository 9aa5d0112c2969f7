pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod rankings;
pub mod scoring;
pub mod storage;
pub mod supplier;
