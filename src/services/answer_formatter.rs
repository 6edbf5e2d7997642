//! 答案格式化 - 纯函数
//!
//! 把求解程序产出的原始值按题目要求的答案类型转换后再提交

use serde_json::Value as JsonValue;

use crate::models::AnswerType;

/// 把原始答案转换成目标类型
///
/// 转换失败时原样返回，`None`/`null` 总是返回 `None`
pub fn format_answer(raw: Option<JsonValue>, answer_type: AnswerType) -> Option<JsonValue> {
    let raw = match raw {
        None | Some(JsonValue::Null) => return None,
        Some(value) => value,
    };

    let formatted = match answer_type {
        AnswerType::Number => to_number(raw),
        AnswerType::Boolean => to_boolean(&raw),
        AnswerType::Json => to_json(raw),
        AnswerType::String | AnswerType::File => raw,
    };

    Some(formatted)
}

/// 字符串形式含小数点时按浮点解析，否则按整数解析
fn to_number(raw: JsonValue) -> JsonValue {
    let repr = string_repr(&raw);
    let repr = repr.trim();

    let parsed = if repr.contains('.') {
        repr.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
    } else {
        repr.parse::<i64>().ok().map(JsonValue::from)
    };

    parsed.unwrap_or(raw)
}

fn to_boolean(raw: &JsonValue) -> JsonValue {
    if let JsonValue::Bool(b) = raw {
        return JsonValue::Bool(*b);
    }

    let repr = string_repr(raw).trim().to_lowercase();
    JsonValue::Bool(matches!(repr.as_str(), "true" | "yes" | "1"))
}

fn to_json(raw: JsonValue) -> JsonValue {
    match &raw {
        JsonValue::Object(_) | JsonValue::Array(_) => raw,
        JsonValue::String(text) => serde_json::from_str(text).unwrap_or(raw),
        _ => raw,
    }
}

/// 字符串取其本身，其他值取 JSON 文本
fn string_repr(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
