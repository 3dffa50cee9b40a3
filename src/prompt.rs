//! Prompt rendering for completion requests.
//!
//! A prompt is a single text block assembled from four pieces, in an order the providers are
//! sensitive to: the instruction header carrying the fallback sentence, prior conversation
//! turns, the document summary, and the current question last. Rendering is pure; the caller
//! owns the conversation history and supplies it on every request.

use serde::{Deserialize, Serialize};

/// One prior question/answer exchange supplied by the caller for multi-turn context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Question the user asked earlier in the session.
    pub query: String,
    /// Answer returned for that question.
    pub answer: String,
}

/// Render the full prompt sent to a completion provider.
///
/// The fallback sentence is embedded character-for-character; downstream code compares
/// provider replies against the same sentence to detect unanswerable questions.
pub fn build_prompt(
    summary: &str,
    query: &str,
    history: &[ConversationTurn],
    fallback: &str,
) -> String {
    let history_block = history
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.query, turn.answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an assistant that answers questions based solely on the following JSON data. \
         Answer to the point; do not describe the steps taken to find the answer. \
         If the question cannot be answered using the data, respond with: \"{fallback}\"\n\
         \n\
         Previous interactions:\n\
         {history_block}\n\
         \n\
         JSON Data:\n\
         {summary}\n\
         \n\
         Question:\n\
         {query}"
    )
}

/// Whether a provider reply actually answers the question.
///
/// Providers are instructed to return the fallback sentence verbatim when the summary cannot
/// answer; any other reply counts as an answer.
pub fn is_answerable(response: &str, fallback: &str) -> bool {
    response != fallback
}
