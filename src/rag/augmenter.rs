use crate::rag::store::ScoredDocument;

const CONTEXT_TEMPLATE: &str = "Context information is below.

---------------------
{context}
---------------------

Given the context information and no prior knowledge, answer the query.

Follow these rules:

1. If the answer is not in the context, just say that you don't know.
2. Avoid statements like \"Based on the context...\" or \"The provided information...\".

Query: {query}

Answer:
";

const EMPTY_CONTEXT_PROMPT: &str = "The user query is outside your knowledge base.
Politely inform the user that you can't answer it.
";

/// Rewrites the user query around the retrieved documents.
///
/// Empty context is not allowed through: with no hits the model is told to decline.
pub fn augment_query(query: &str, documents: &[ScoredDocument]) -> String {
    if documents.is_empty() {
        return EMPTY_CONTEXT_PROMPT.to_string();
    }

    let context = documents
        .iter()
        .map(|hit| hit.document.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    CONTEXT_TEMPLATE
        .replace("{context}", &context)
        .replace("{query}", query)
}
