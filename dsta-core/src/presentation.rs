//! Rendering tool calls and results for people.
//!
//! Campaign tools answer with a handful of recurring shapes: a `{"success": ...}`
//! confirmation, mutate resource names, or a reconciliation report with a
//! `matches` flag. Those get a one-line headline. Everything else is shown as
//! pretty JSON, cut after [`MAX_BODY_LINES`].

use serde_json::Value;

use crate::tool::ToolResult;

pub const MAX_BODY_LINES: usize = 30;
const MAX_ARG_CHARS: usize = 60;

/// Output medium for [`render_call`] and [`render_result`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Presentation {
    #[default]
    Plain,
    Ansi,
    Markdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Done,
    Refused,
}

fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn argument(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", clip(s, MAX_ARG_CHARS)),
        Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => {
            clip(&value.to_string(), MAX_ARG_CHARS)
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => format!("{{{} fields}}", map.len()),
        other => other.to_string(),
    }
}

/// One line naming the tool and its arguments, e.g.
/// `update_campaign_status(campaign_id="42", status="PAUSED")`.
pub fn render_call(style: Presentation, tool_name: &str, params: &Value) -> String {
    let args = params
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(key, value)| format!("{}={}", key, argument(value)))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    match style {
        Presentation::Plain => format!("{}({})", tool_name, args),
        Presentation::Ansi => format!("\x1b[1;36m{}\x1b[0m({})", tool_name, args),
        Presentation::Markdown => format!("`{}({})`", tool_name, args),
    }
}

/// Headline for the result shapes campaign tools return, if recognised.
fn headline(value: &Value) -> Option<(Outcome, String)> {
    if let Some(matches) = value.get("matches").and_then(Value::as_bool) {
        let campaign = value["campaign_id"].as_str().unwrap_or("?");
        if matches {
            return Some((Outcome::Done, format!("campaign {}: sheet row matches SA360", campaign)));
        }
        let fields: Vec<&str> = value["mismatches"]
            .as_array()
            .map(|list| list.iter().filter_map(|m| m["field"].as_str()).collect())
            .unwrap_or_default();
        return Some((
            Outcome::Refused,
            format!("campaign {}: {} field(s) differ: {}", campaign, fields.len(), fields.join(", ")),
        ));
    }

    match value.get("success")? {
        Value::String(message) => Some((Outcome::Done, message.clone())),
        Value::Bool(true) => {
            let line = if let Some(message) = value["message"].as_str() {
                message.to_string()
            } else if let Some(name) = value["resource_name"].as_str() {
                format!("updated {}", name)
            } else if let Some(names) = value["resource_names"].as_array() {
                format!("{} resource(s) changed", names.len())
            } else {
                "done".to_string()
            };
            Some((Outcome::Done, line))
        }
        _ => None,
    }
}

/// Whether the headline already says everything the payload holds
fn headline_only(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.get("success").is_some_and(Value::is_string))
}

fn body_text(result: &ToolResult) -> Option<String> {
    match result {
        ToolResult::Text(text) => Some(text.clone()),
        ToolResult::Json(value) if headline_only(value) => None,
        ToolResult::Json(value) => {
            Some(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
        }
    }
}

/// `(kept lines, number of lines cut)`
fn cut(text: &str) -> (String, usize) {
    let total = text.lines().count();
    if total <= MAX_BODY_LINES {
        return (text.to_string(), 0);
    }
    let kept: Vec<&str> = text.lines().take(MAX_BODY_LINES).collect();
    (kept.join("\n"), total - MAX_BODY_LINES)
}

pub fn render_result(style: Presentation, result: &ToolResult) -> String {
    let mut parts = Vec::new();

    if let Some((outcome, line)) = result.as_json().and_then(headline) {
        parts.push(match (style, outcome) {
            (Presentation::Plain, Outcome::Done) => format!("ok: {}", line),
            (Presentation::Plain, Outcome::Refused) => format!("mismatch: {}", line),
            (Presentation::Ansi, Outcome::Done) => format!("\x1b[32m✓\x1b[0m {}", line),
            (Presentation::Ansi, Outcome::Refused) => format!("\x1b[33m✗\x1b[0m {}", line),
            (Presentation::Markdown, Outcome::Done) => format!("**ok**: {}", line),
            (Presentation::Markdown, Outcome::Refused) => format!("**mismatch**: {}", line),
        });
    }

    if let Some(text) = body_text(result) {
        let (kept, dropped) = cut(&text);
        let is_json = matches!(result, ToolResult::Json(_));
        parts.push(match style {
            Presentation::Markdown if is_json => format!("```json\n{}\n```", kept),
            _ => kept,
        });
        if dropped > 0 {
            parts.push(match style {
                Presentation::Plain => format!("({} more lines, use --raw)", dropped),
                Presentation::Ansi => format!("\x1b[2m({} more lines, use --raw)\x1b[0m", dropped),
                Presentation::Markdown => format!("*{} more lines*", dropped),
            });
        }
    }

    parts.join("\n")
}
