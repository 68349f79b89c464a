use crate::error::EmbeddingError;
use serde_json::Value;

/// Field paths tried, in priority order, when reading a vector out of an
/// embedding service response. Segments are separated by `.`; numeric
/// segments index into arrays.
pub fn default_response_fields() -> Vec<String> {
    vec![
        "embedding".to_string(),
        "vector".to_string(),
        "data.embedding".to_string(),
        "data.0.embedding".to_string(),
    ]
}

/// Extract and validate an embedding vector.
///
/// The first path that resolves to a non-null value is the only one
/// considered; a present but malformed value is rejected rather than
/// skipped.
pub fn parse_embedding(
    body: &Value,
    fields: &[String],
    dimension: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let Some((field, value)) = fields
        .iter()
        .find_map(|field| lookup(body, field).map(|value| (field, value)))
    else {
        return Err(EmbeddingError::InvalidResponse(format!(
            "no embedding field found (tried: {})",
            fields.join(", ")
        )));
    };

    let Value::Array(items) = value else {
        return Err(EmbeddingError::InvalidResponse(format!(
            "field `{field}` is not an array"
        )));
    };

    if items.is_empty() {
        return Err(EmbeddingError::InvalidResponse(format!(
            "field `{field}` is an empty array"
        )));
    }

    let mut vector = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let number = item
            .as_f64()
            .map(|n| n as f32)
            .filter(|n| n.is_finite())
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse(format!(
                    "field `{field}` holds a non-numeric value at index {idx}"
                ))
            })?;
        vector.push(number);
    }

    if vector.len() != dimension {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {dimension} dimensions, got {}",
            vector.len()
        )));
    }

    Ok(vector)
}

fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}
