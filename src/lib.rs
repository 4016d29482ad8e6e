pub mod api;
pub mod chunker;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod logging;
pub mod middleware;
pub mod pdf;
pub mod session;
pub mod storage;

pub use api::{start_api_server, AppState};
pub use chunker::{TextChunk, TextChunker};
pub use config::ApiConfig;
