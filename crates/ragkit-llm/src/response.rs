//! Provider response shape normalization.
//!
//! Providers disagree on envelope shapes. Embedding responses arrive as
//! either `{"embeddings": [[..]]}` or `{"data": [{"embedding": [..]}]}`;
//! chat responses as a bare `content` field, an Anthropic-style content
//! block array, an OpenAI-style choice array, or an Ollama `response`
//! field. Anything else is an error.

use ragkit_core::{EmbeddingError, GenerationError};
use serde_json::Value;

/// Normalize an embedding response into one vector per input.
pub fn parse_embeddings(value: &Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    // {"embeddings": [[...], [...]]}
    if let Some(embeddings) = value.get("embeddings").and_then(Value::as_array) {
        return embeddings.iter().map(parse_vector).collect();
    }

    // {"data": [{"embedding": [...]}, ...]}
    if let Some(data) = value.get("data").and_then(Value::as_array) {
        return data
            .iter()
            .map(|item| {
                item.get("embedding")
                    .ok_or_else(|| {
                        EmbeddingError::UnrecognizedShape("data item missing embedding".to_string())
                    })
                    .and_then(parse_vector)
            })
            .collect();
    }

    Err(EmbeddingError::UnrecognizedShape(shape_of(value)))
}

/// Parse one flat float array.
fn parse_vector(value: &Value) -> Result<Vec<f32>, EmbeddingError> {
    let array = value.as_array().ok_or_else(|| {
        EmbeddingError::UnrecognizedShape("embedding is not an array".to_string())
    })?;

    array
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                EmbeddingError::UnrecognizedShape("non-numeric embedding element".to_string())
            })
        })
        .collect()
}

/// Normalize a chat completion response into the assistant text.
pub fn parse_chat(value: &Value) -> Result<String, GenerationError> {
    // {"content": "..."}
    if let Some(text) = value.get("content").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    // Anthropic: {"content": [{"type": "text", "text": "..."}]}
    if let Some(blocks) = value.get("content").and_then(Value::as_array) {
        let text: String = blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }

    // OpenAI: {"choices": [{"message": {"content": "..."}}]}
    if let Some(text) = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        return Ok(text.to_string());
    }

    // Ollama: {"response": "..."}
    if let Some(text) = value.get("response").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    Err(GenerationError::UnrecognizedShape(shape_of(value)))
}

/// Short description of an unexpected payload for error messages.
fn shape_of(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).take(5).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        other => format!("{other:?}").chars().take(60).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_embeddings_flat_shape() {
        let value = json!({"embeddings": [[0.1, 0.2], [0.3, 0.4]]});
        let vectors = parse_embeddings(&value).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1, 0.2]);
    }

    #[test]
    fn test_parse_embeddings_data_shape() {
        let value = json!({"data": [{"embedding": [1.0, 2.0], "index": 0}]});
        let vectors = parse_embeddings(&value).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn test_parse_embeddings_unknown_shape_fails() {
        let value = json!({"vectors": [[1.0]]});
        let err = parse_embeddings(&value).unwrap_err();
        assert!(matches!(err, EmbeddingError::UnrecognizedShape(_)));
        assert!(err.to_string().contains("vectors"));
    }

    #[test]
    fn test_parse_embeddings_non_numeric_fails() {
        let value = json!({"embeddings": [["a"]]});
        assert!(parse_embeddings(&value).is_err());
    }

    #[test]
    fn test_parse_chat_bare_content() {
        let value = json!({"content": "hello"});
        assert_eq!(parse_chat(&value).unwrap(), "hello");
    }

    #[test]
    fn test_parse_chat_anthropic_blocks() {
        let value = json!({"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]});
        assert_eq!(parse_chat(&value).unwrap(), "ab");
    }

    #[test]
    fn test_parse_chat_openai_choices() {
        let value = json!({"choices": [{"message": {"role": "assistant", "content": "answer"}}]});
        assert_eq!(parse_chat(&value).unwrap(), "answer");
    }

    #[test]
    fn test_parse_chat_ollama_response() {
        let value = json!({"response": "generated", "done": true});
        assert_eq!(parse_chat(&value).unwrap(), "generated");
    }

    #[test]
    fn test_parse_chat_unknown_shape_fails() {
        let value = json!({"output": "x"});
        let err = parse_chat(&value).unwrap_err();
        assert!(matches!(err, GenerationError::UnrecognizedShape(_)));
    }
}
