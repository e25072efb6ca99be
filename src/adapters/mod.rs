// Adapters layer: concrete implementations of the domain ports.

pub mod anthropic;
pub mod http;
pub mod storage;

pub use anthropic::AnthropicOracle;
pub use http::HttpPageRenderer;
pub use storage::LocalStorage;
