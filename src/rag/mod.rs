// RAG (Retrieval-Augmented Generation) module
// Retrieval + generation orchestration for chat sessions

pub mod errors;
pub mod generation;
pub mod responder;
pub mod response_formatter;
pub mod retriever;

pub use errors::RagError;
pub use generation::{ChatCompletionsGenerator, GenerationConfig, TextGenerator};
pub use responder::{
    ResponderConfig, RetrievalResponder, EMPTY_ANSWER_FALLBACK, FALLBACK_ANSWER,
};
pub use response_formatter::format_advisory_response;
pub use retriever::{ContextRetriever, Passage, VectorSearchClient};
