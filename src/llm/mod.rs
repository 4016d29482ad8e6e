pub mod provider;

pub use provider::{
    create_llm_provider, GroqProvider, LLMConfig, LLMError, LLMProvider, OllamaProvider,
    PromptMessage, PromptRole, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE,
};
