//! Inline directive parser.
//!
//! A document may override its compile options on its first line with a
//! line comment of comma-separated `key: value` pairs:
//!
//! ```text
//! // out: ../css/, sourceMap: true, autoprefixer: "> 5%, last 2 versions"
//! ```
//!
//! `out` is an alias of `outputPath`. Values `true`/`false` become booleans,
//! integers become numbers, quoted values have their quotes removed, anything
//! else is a string. Parsing never fails: entries that do not fit the option
//! model are skipped with a warning.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use stylepress_shared::CompileOptions;

/// Parse the directive line of `content` into an option layer.
pub fn parse(content: &str) -> CompileOptions {
    static DIRECTIVE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*//\s*(.*?)\s*$").expect("valid regex"));

    let Some(first_line) = content.lines().next() else {
        return CompileOptions::default();
    };
    let Some(caps) = DIRECTIVE_RE.captures(first_line) else {
        return CompileOptions::default();
    };

    let mut layer = CompileOptions::default();

    for entry in split_entries(&caps[1]) {
        let Some((key, raw)) = entry.split_once(':') else {
            continue;
        };
        let key = match key.trim() {
            "" => continue,
            "out" => "outputPath",
            other => other,
        };
        let value = parse_value(raw.trim());

        match option_layer(key, value) {
            Some(entry_layer) => layer = layer.merge(entry_layer),
            None => warn!(key, "ignoring inline directive with an unusable value"),
        }
    }

    debug!(?layer, "parsed inline directives");
    layer
}

/// Split on commas that are not inside quotes.
fn split_entries(line: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ',') => {
                entries.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&line[start..]);
    entries
}

fn parse_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }

    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw);

    Value::String(unquoted.to_string())
}

/// Build a single-key layer, or `None` if the value has the wrong shape.
fn option_layer(key: &str, value: Value) -> Option<CompileOptions> {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), value);
    serde_json::from_value(Value::Object(map)).ok()
}
