// src/context.rs
// Joins chunks into the grounding context and wraps it in the system prompt.

use tracing::warn;

use crate::chunker::TextChunk;

pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

const SYSTEM_TEMPLATE_HEAD: &str = "You are a helpful AI assistant. Answer the user's question based on the provided context from the document.
If the answer is not in the context, say so clearly.

Context from document:
";

pub fn join_chunks(chunks: &[TextChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    warn_chars: usize,
}

impl ContextAssembler {
    /// `warn_chars` is a soft limit: larger contexts are logged, never cut.
    pub fn new(warn_chars: usize) -> Self {
        Self { warn_chars }
    }

    pub fn system_prompt(&self, chunks: &[TextChunk]) -> String {
        let context = join_chunks(chunks);
        let context_chars = context.chars().count();
        if context_chars > self.warn_chars {
            warn!(
                context_chars,
                limit = self.warn_chars,
                chunks = chunks.len(),
                "Assembled context exceeds soft limit and may not fit the model input"
            );
        }

        let mut prompt = String::with_capacity(SYSTEM_TEMPLATE_HEAD.len() + context.len());
        prompt.push_str(SYSTEM_TEMPLATE_HEAD);
        prompt.push_str(&context);
        prompt
    }
}
