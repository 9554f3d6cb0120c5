//! Intrinsic function helpers.
//!
//! Intrinsics are plain `serde_json` objects with a single `Ref` or `Fn::*`
//! key, so they can be dropped into any property bag. The helpers here build
//! them, find the logical ids they point at, and serialise a value containing
//! them to a JSON string that CloudFormation resolves at deploy time.

use std::collections::BTreeSet;

use serde_json::{Value, json};

pub const REGION: &str = "AWS::Region";
pub const PARTITION: &str = "AWS::Partition";
pub const URL_SUFFIX: &str = "AWS::URLSuffix";
pub const ACCOUNT_ID: &str = "AWS::AccountId";

/// `{"Ref": id}`
#[must_use]
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [id, attribute]}`
#[must_use]
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Join": [separator, parts]}`
#[must_use]
pub fn join(separator: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [separator, parts] })
}

/// `{"Fn::Select": [index, list]}`
#[must_use]
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{"Fn::GetAZs": ""}`, the availability zones of the deployment region.
#[must_use]
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

/// Whether `value` is a single intrinsic function call.
#[must_use]
pub fn is_intrinsic(value: &Value) -> bool {
    match value.as_object() {
        Some(map) if map.len() == 1 => map
            .keys()
            .next()
            .is_some_and(|k| k == "Ref" || k.starts_with("Fn::")),
        _ => false,
    }
}

/// Collect every logical id referenced by `Ref` or `Fn::GetAtt` inside
/// `value`. Pseudo parameters (`AWS::*`) are not logical ids and are skipped.
#[must_use]
pub fn references(value: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_references(value, &mut out);
    out
}

fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    if !id.starts_with("AWS::") {
                        out.insert(id.clone());
                    }
                    return;
                }
                if let Some(target) = map.get("Fn::GetAtt") {
                    match target {
                        Value::Array(items) => {
                            if let Some(Value::String(id)) = items.first() {
                                out.insert(id.clone());
                            }
                        }
                        Value::String(dotted) => {
                            if let Some((id, _)) = dotted.split_once('.') {
                                out.insert(id.to_string());
                            }
                        }
                        _ => {}
                    }
                    return;
                }
            }
            for v in map.values() {
                collect_references(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_references(v, out);
            }
        }
        _ => {}
    }
}

enum Fragment {
    Literal(String),
    Token(Value),
}

/// Serialise `value` to JSON text, keeping embedded intrinsics resolvable.
///
/// Without intrinsics the result is a plain JSON string. Otherwise the text
/// is split around each intrinsic and returned as `Fn::Join` with an empty
/// separator; every intrinsic is assumed to resolve to a string and is
/// quoted in the output.
#[must_use]
pub fn stringify(value: &Value) -> Value {
    let mut fragments = Vec::new();
    write_fragments(value, &mut fragments);

    let mut parts: Vec<Value> = Vec::new();
    let mut pending = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Literal(s) => pending.push_str(&s),
            Fragment::Token(v) => {
                if !pending.is_empty() {
                    parts.push(Value::String(std::mem::take(&mut pending)));
                }
                parts.push(v);
            }
        }
    }

    if parts.is_empty() {
        return Value::String(pending);
    }
    if !pending.is_empty() {
        parts.push(Value::String(pending));
    }
    join("", parts)
}

fn write_fragments(value: &Value, out: &mut Vec<Fragment>) {
    if is_intrinsic(value) {
        out.push(Fragment::Literal("\"".to_string()));
        out.push(Fragment::Token(value.clone()));
        out.push(Fragment::Literal("\"".to_string()));
        return;
    }
    match value {
        Value::Object(map) => {
            out.push(Fragment::Literal("{".to_string()));
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(Fragment::Literal(",".to_string()));
                }
                out.push(Fragment::Literal(format!("{}:", Value::String(k.clone()))));
                write_fragments(v, out);
            }
            out.push(Fragment::Literal("}".to_string()));
        }
        Value::Array(items) => {
            out.push(Fragment::Literal("[".to_string()));
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(Fragment::Literal(",".to_string()));
                }
                write_fragments(v, out);
            }
            out.push(Fragment::Literal("]".to_string()));
        }
        scalar => out.push(Fragment::Literal(scalar.to_string())),
    }
}
