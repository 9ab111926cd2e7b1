//! Grounding prompt construction.
//!
//! The retrieved documents are the only knowledge the model is allowed to
//! use; the system turn pins that contract and the exact fallback wording
//! so the no-answer case is testable.

use crate::llm::ChatMessage;
use crate::vector::ScoredResult;

/// Literal the model must return when the context does not support an
/// answer. Also returned directly when retrieval comes back empty.
pub const FALLBACK_ANSWER: &str = "I don't know. This is beyond my knowledge base.";

/// Labels are padded so the longest one, `Has_answer:`, still aligns.
const LABEL_WIDTH: usize = 11;

const SYSTEM_PROMPT: &str = "You are a precise and reliable assistant. Your goal is to answer the question using *only* the information provided in the CONTEXT. Do not guess or make up any information.
Instructions:
- If the `Has_answer` flag is false, check the context carefully for relevant details. If no answer is clearly supported, reply with: \"I don't know. This is beyond my knowledge base.\"
- If the answer *is* supported in the context, rephrase and present it clearly and concisely, ensuring it is directly grounded in the information provided.
- Do not use any external knowledge or assumptions. Stick strictly to the *CONTEXT*.
- Do not fabricate answers or speculate beyond the given information.";

fn render_block(result: &ScoredResult) -> String {
    let meta = &result.metadata;
    format!(
        "{:<width$}{}\n{:<width$}{}\n{:<width$}{}\n{:<width$}{}",
        "Context:",
        meta.context,
        "Question:",
        meta.question,
        "Answer:",
        meta.answer,
        "Has_answer:",
        meta.has_answer,
        width = LABEL_WIDTH,
    )
}

/// Build the two-turn prompt: the fixed system contract plus a user turn
/// embedding the raw query and the retrieved blocks in fused order (most
/// relevant first).
pub fn build_prompt(query: &str, results: &[ScoredResult]) -> Vec<ChatMessage> {
    let context = results
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "QUESTION:\n{}\nCONTEXT:\n{}",
            query,
            context.trim()
        )),
    ]
}
