
use serde::Serialize;
use serde_json::Value;

const EXTRACTION_FAILED: &str = "Failed to extract answer";
const NO_OUTPUTS: &str = "Key 'outputs' not found in response";
const NO_ANSWER_TEXT: &str = "No answer text found";

/// The answer shown to the user: structured data, plain text, or an error
/// record that still holds the whole upstream response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedAnswer {
    Json(Value),
    Text(String),
    Error {
        error: String,
        details: String,
        response: Value,
    },
}

impl ExtractedAnswer {
    fn failed(details: &str, response: &Value) -> Self {
        ExtractedAnswer::Error {
            error: EXTRACTION_FAILED.to_string(),
            details: details.to_string(),
            response: response.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractedAnswer::Error { .. })
    }
}

/// Find the answer text in a workflow run response and clean it up.
///
/// Lookup order, first hit wins:
/// `outputs[0].outputs[0].results.text.data.text`,
/// `outputs[0].outputs[0].results.message.data.text`,
/// `outputs[0].messages[0].message`.
/// Only non-empty strings count as a hit.
pub fn extract_answer(response: &Value) -> ExtractedAnswer {
    let Some(output0) = response
        .get("outputs")
        .and_then(Value::as_array)
        .and_then(|outputs| outputs.first())
    else {
        return ExtractedAnswer::failed(NO_OUTPUTS, response);
    };

    let raw = results_text(output0).or_else(|| first_message(output0));

    let Some(raw) = raw else {
        tracing::debug!("no answer text in workflow response");
        return ExtractedAnswer::failed(NO_ANSWER_TEXT, response);
    };

    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => ExtractedAnswer::Json(value),
        Err(_) => ExtractedAnswer::Text(cleaned),
    }
}

fn results_text(output0: &Value) -> Option<&str> {
    let inner = output0.get("outputs")?.as_array()?.first()?;
    let results = inner.get("results")?;

    ["text", "message"]
        .iter()
        .find_map(|&key| results.get(key)?.as_object()?.get("data")?.get("text"))
        .and_then(answer_str)
}

fn first_message(output0: &Value) -> Option<&str> {
    output0
        .get("messages")?
        .as_array()?
        .first()?
        .get("message")
        .and_then(answer_str)
}

fn answer_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Remove every ```` ```json ```` and ```` ``` ```` fence, then trim.
///
/// Removal repeats until nothing changes, so fences that only appear once an
/// inner fence is cut out are removed as well.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let next = text.replace("```json", "").replace("```", "");
        if next == text {
            break;
        }
        text = next;
    }
    text.trim().to_string()
}
