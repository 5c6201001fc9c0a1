use crate::error::{Result, TallyError};
use crate::llm::types::{Blob, Part};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::{Map, Value};
use std::path::Path;

// Schema keywords the generateContent endpoint accepts.
const SCHEMA_KEYS: [&str; 10] = [
    "type",
    "format",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minItems",
    "maxItems",
];

fn prune_schema(schema: &Value) -> Value {
    let object = match schema {
        Value::Object(object) => object,
        other => return other.clone(),
    };
    let mut pruned = Map::new();
    for (key, value) in object {
        if !SCHEMA_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("properties", Value::Object(props)) => Value::Object(
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), prune_schema(prop)))
                    .collect(),
            ),
            ("items", items) => prune_schema(items),
            (_, other) => other.clone(),
        };
        pruned.insert(key.clone(), value);
    }
    Value::Object(pruned)
}

/// Inlined OpenAPI-style schema for `T`, reduced to the keywords Gemini understands.
pub fn response_schema<T: JsonSchema>() -> Result<Value> {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    Ok(prune_schema(&serde_json::to_value(schema)?))
}

/// Reads an image into an inline part, guessing its MIME type from the extension.
pub fn inline_image(path: &Path) -> Result<Part> {
    let bytes = std::fs::read(path)?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
    if !mime_type.starts_with("image/") {
        return Err(TallyError::Generation(format!(
            "{} is not an image ({})",
            path.display(),
            mime_type
        )));
    }
    Ok(Part::InlineData {
        inline_data: Blob {
            mime_type,
            data: BASE64.encode(bytes),
        },
    })
}

/// Model output with an optional Markdown code fence removed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ChartSpec;

    #[test]
    fn test_chart_schema_is_inlined_and_pruned() {
        let schema = response_schema::<ChartSpec>().unwrap();
        let text = schema.to_string();
        assert!(!text.contains("$ref"));
        assert!(!text.contains("$schema"));
        assert!(!text.contains("\"title\":\"ChartSpec\""));
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["kind"]["enum"], serde_json::json!(["bar", "pie"]));
        assert_eq!(schema["properties"]["points"]["items"]["properties"]["value"]["type"], "number");
        // A property literally named "title" must survive pruning.
        assert_eq!(schema["properties"]["title"]["type"], "string");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_inline_image() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("chart.png");
        std::fs::write(&png, [0x89, b'P', b'N', b'G']).unwrap();
        match inline_image(&png).unwrap() {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/png");
                assert_eq!(inline_data.data, "iVBORw==");
            }
            Part::Text { .. } => panic!("expected inline data"),
        }

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(inline_image(&txt).is_err());
    }
}
