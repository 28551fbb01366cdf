use serde_json::Value;

/// Default spoken-text template per wire event name.
pub fn default_template(event: &str) -> Option<&'static str> {
    match event {
        "comment" | "emotion" => Some("{content}"),
        "gift" => Some("{userName}さんが{itemName}を贈りました"),
        "notification" => Some("{message}"),
        "operatorComment" => Some("運営コメント: {content}"),
        _ => None,
    }
}

/// Fill `{field}` placeholders from the payload's scalar fields. A missing
/// field becomes an empty string; an all-blank result means there is nothing
/// to say and yields `None`.
pub fn format_speech_text(template: &str, payload: &Value) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&field_text(payload, &after[..end]));
                rest = &after[end + 1..];
            }
            None => {
                // unbalanced brace, keep it literal
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    let trimmed = out.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn field_text(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}
