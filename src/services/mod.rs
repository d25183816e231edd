pub mod ai_service;
pub mod cache; // Analysis result cache
pub mod openai; // OpenAI chat-completions client

pub use ai_service::LabelModel;
pub use cache::{cache_key, AnalysisCache, CacheSweeper, MemoryCache, CACHE_TTL_SECS};
pub use openai::OpenAiService;
