use crate::langflow::ExtractedAnswer;

/// Terminal rendering: text answers print as-is, everything else as
/// indented JSON.
pub fn render(answer: &ExtractedAnswer) -> String {
    match answer {
        ExtractedAnswer::Text(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to render answer");
            format!("{other:?}")
        }),
    }
}
