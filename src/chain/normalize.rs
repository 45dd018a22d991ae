use std::collections::HashSet;

use log::warn;
use serde_json::Value;
use thiserror::Error;

use super::graph::{Link, NetworkGraph, Node, NodeKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("network response is not a JSON object")]
    NotAnObject,
    #[error("network response is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("no valid network data was returned")]
    NoNodes,
}

/// Coerces an identifier to its canonical string form.
fn coerce_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Finite non-negative amount, or zero.
fn coerce_value(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .unwrap_or(0.0)
}

fn field_array<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a Vec<Value>, NormalizeError> {
    object
        .get(name)
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField(name))
}

fn normalize_nodes(raw_nodes: &[Value]) -> Vec<Node> {
    let mut seen = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());

    for (position, raw) in raw_nodes.iter().enumerate() {
        let Some(id) = coerce_id(raw.get("id")) else {
            warn!("skipping network node #{position}: missing or non-scalar id");
            continue;
        };
        if !seen.insert(id.clone()) {
            warn!("skipping duplicate network node {id}");
            continue;
        }

        let label = raw
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| id.clone());
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .map(NodeKind::parse)
            .unwrap_or(NodeKind::Target);

        nodes.push(Node { id, label, kind });
    }

    nodes
}

fn enforce_single_source(nodes: &mut [Node], root: Option<&str>) {
    let mut found = false;
    for node in nodes.iter_mut().filter(|node| node.is_source()) {
        if found {
            warn!("demoting extra source node {}", node.id);
            node.kind = NodeKind::Target;
        }
        found = true;
    }

    if found {
        return;
    }

    if let Some(root) = root
        && let Some(node) = nodes
            .iter_mut()
            .find(|node| node.id == root || node.label == root)
    {
        node.kind = NodeKind::Source;
    }
}

/// Claims `base`, or the first `{base}#{n}` (from `n = position`) not yet taken.
fn unique_link_id(seen: &mut HashSet<String>, base: String, position: usize) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut suffix = position;
    loop {
        let candidate = format!("{base}#{suffix}");
        if seen.insert(candidate.clone()) {
            warn!("renaming duplicate link id {base} to {candidate}");
            return candidate;
        }
        suffix += 1;
    }
}

fn normalize_links(raw_links: &[Value], known: &HashSet<&str>) -> Vec<Link> {
    let mut seen = HashSet::with_capacity(raw_links.len());
    let mut links = Vec::with_capacity(raw_links.len());

    for (position, raw) in raw_links.iter().enumerate() {
        let (Some(source), Some(target)) =
            (coerce_id(raw.get("source")), coerce_id(raw.get("target")))
        else {
            warn!("skipping network link #{position}: missing endpoint");
            continue;
        };
        if !known.contains(source.as_str()) || !known.contains(target.as_str()) {
            warn!("skipping network link {source} -> {target}: unknown endpoint");
            continue;
        }

        let base = coerce_id(raw.get("id")).unwrap_or_else(|| format!("{source}-{target}"));
        let id = unique_link_id(&mut seen, base, position);

        links.push(Link {
            id,
            source,
            target,
            value: coerce_value(raw.get("value")),
        });
    }

    links
}

/// Validates a raw `{ nodes, links }` payload into a [`NetworkGraph`].
///
/// `root` is the searched address; it marks the source node when the backend did not.
pub fn normalize(raw: &Value, root: Option<&str>) -> Result<NetworkGraph, NormalizeError> {
    let object = raw.as_object().ok_or(NormalizeError::NotAnObject)?;
    let raw_nodes = field_array(object, "nodes")?;
    let raw_links = field_array(object, "links")?;

    let mut nodes = normalize_nodes(raw_nodes);
    if nodes.is_empty() {
        return Err(NormalizeError::NoNodes);
    }
    enforce_single_source(&mut nodes, root);

    let known = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
    let links = normalize_links(raw_links, &known);

    Ok(NetworkGraph::from_parts(nodes, links))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn coerces_numeric_ids_to_strings() {
        let raw = json!({
            "nodes": [
                { "id": 1, "label": "1A1zP1eP", "type": "source" },
                { "id": "2", "label": "3J98t1Wp", "type": "target" }
            ],
            "links": [{ "id": 12, "source": 1, "target": 2, "value": 0.5 }]
        });

        let graph = normalize(&raw, None).unwrap();
        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.links[0].id, "12");
        assert_eq!(graph.links[0].source, "1");
        assert_eq!(graph.links[0].target, "2");
        assert_eq!(graph.node_index("1"), Some(0));
    }

    #[test]
    fn invalid_values_become_zero() {
        let raw = json!({
            "nodes": [{ "id": "a", "type": "source" }, { "id": "b" }],
            "links": [
                { "id": "1", "source": "a", "target": "b", "value": "1.5" },
                { "id": "2", "source": "a", "target": "b", "value": -3.0 },
                { "id": "3", "source": "a", "target": "b", "value": null },
                { "id": "4", "source": "a", "target": "b" },
                { "id": "5", "source": "a", "target": "b", "value": 2.25 }
            ]
        });

        let graph = normalize(&raw, None).unwrap();
        let values = graph.links.iter().map(|link| link.value).collect::<Vec<_>>();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 0.0, 2.25]);
    }

    #[test]
    fn missing_fields_and_empty_nodes_are_errors() {
        assert_eq!(
            normalize(&json!({ "links": [] }), None).unwrap_err(),
            NormalizeError::MissingField("nodes")
        );
        assert_eq!(
            normalize(&json!({ "nodes": [{ "id": "a" }] }), None).unwrap_err(),
            NormalizeError::MissingField("links")
        );
        assert_eq!(
            normalize(&json!({ "nodes": [], "links": [] }), None).unwrap_err(),
            NormalizeError::NoNodes
        );
        assert_eq!(normalize(&json!([]), None).unwrap_err(), NormalizeError::NotAnObject);
    }

    #[test]
    fn keeps_exactly_one_source() {
        let raw = json!({
            "nodes": [
                { "id": "a", "type": "source" },
                { "id": "b", "type": "source" },
                { "id": "c", "type": "address" }
            ],
            "links": []
        });

        let graph = normalize(&raw, None).unwrap();
        let sources = graph.nodes.iter().filter(|node| node.is_source()).count();
        assert_eq!(sources, 1);
        assert_eq!(graph.source().map(|node| node.id.as_str()), Some("a"));
        assert_eq!(graph.nodes[2].kind, NodeKind::Other("address".to_owned()));
    }

    #[test]
    fn promotes_root_address_when_backend_marks_no_source() {
        let raw = json!({
            "nodes": [
                { "id": "0xabc", "label": "0xabc", "type": "address" },
                { "id": "0xdef", "label": "0xdef", "type": "address" }
            ],
            "links": [{ "id": "l", "source": "0xdef", "target": "0xabc", "value": 1 }]
        });

        let graph = normalize(&raw, Some("0xdef")).unwrap();
        assert_eq!(graph.source_index(), Some(1));
    }

    #[test]
    fn drops_dangling_links_and_duplicate_nodes() {
        let raw = json!({
            "nodes": [{ "id": "a", "type": "source" }, { "id": "a" }, { "id": true }],
            "links": [
                { "source": "a", "target": "ghost", "value": 1 },
                { "source": "a", "target": "a", "value": 1 },
                { "source": "a", "target": "a", "value": 2 }
            ]
        });

        let graph = normalize(&raw, None).unwrap();
        assert_eq!(graph.node_count(), 1);
        let ids = graph.links.iter().map(|link| link.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a-a", "a-a#2"]);
    }

    #[test]
    fn renamed_duplicate_link_ids_skip_ids_already_taken() {
        let raw = json!({
            "nodes": [{ "id": "a", "type": "source" }, { "id": "b" }],
            "links": [
                { "id": "a-b#2", "source": "a", "target": "b", "value": 1 },
                { "source": "a", "target": "b", "value": 2 },
                { "source": "a", "target": "b", "value": 3 },
                { "id": "a-b#2", "source": "a", "target": "b", "value": 4 }
            ]
        });

        let graph = normalize(&raw, None).unwrap();
        let ids = graph.links.iter().map(|link| link.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a-b#2", "a-b", "a-b#3", "a-b#2#3"]);
    }
}
