//! Pulls the JSON object out of a model completion.
//!
//! Completions often wrap the object in a markdown fence or surround it
//! with prose. The first balanced `{...}` wins.

use serde_json::{Map, Value};

use crate::ports::ServiceError;

/// Parses the first JSON object found in `response`.
pub fn extract_json_object(response: &str) -> Result<Map<String, Value>, ServiceError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::contract_violation("empty completion"));
    }

    let body = fenced_block(trimmed).unwrap_or(trimmed);
    let candidate = body
        .find('{')
        .and_then(|start| balanced_object(body, start))
        .ok_or_else(|| ServiceError::contract_violation("no JSON object in completion"))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ServiceError::contract_violation("completion is not a JSON object")),
        Err(e) => Err(ServiceError::contract_violation(format!("invalid JSON: {}", e))),
    }
}

/// Contents of the first ```json or ``` fence, if any.
fn fenced_block(s: &str) -> Option<&str> {
    let open = s.find("```")?;
    let after_ticks = &s[open + 3..];
    let body_start = after_ticks.find('\n')? + 1;
    let body = &after_ticks[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// The balanced object starting at byte `start`, respecting strings.
fn balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        let map = extract_json_object(r#"{"status": "SUFFICIENT"}"#).unwrap();
        assert_eq!(map["status"], "SUFFICIENT");
    }

    #[test]
    fn fenced_object() {
        let text = "Here is the plan:\n```json\n{\"tool_calls\": []}\n```\nDone.";
        let map = extract_json_object(text).unwrap();
        assert!(map["tool_calls"].as_array().unwrap().is_empty());
    }

    #[test]
    fn object_surrounded_by_prose() {
        let text = "Thinking... {\"thought\": \"resolve {drug} first\", \"n\": 1} trailing";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["thought"], "resolve {drug} first");
    }

    #[test]
    fn multibyte_text_before_object() {
        let text = "Résumé → {\"ok\": true}";
        assert_eq!(extract_json_object(text).unwrap()["ok"], true);
    }

    #[test]
    fn missing_object_is_contract_violation() {
        let err = extract_json_object("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ServiceError::ContractViolation(_)));
        assert!(extract_json_object("   ").is_err());
        assert!(extract_json_object("{\"open\": ").is_err());
    }
}
