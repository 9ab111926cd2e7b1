//! RAG question answering over the SQuAD v2 dataset: hybrid Qdrant
//! retrieval with client-side Reciprocal Rank Fusion, grounded prompting,
//! and an OpenAI-compatible completion backend.

pub mod core;
pub mod dataset;
pub mod db;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod server;
pub mod state;
pub mod text;
pub mod vector;
