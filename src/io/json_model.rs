//! DICOM JSON Model reader and writer (PS3.18 Annex F.2)
//!
//! ```json
//! {
//!   "00100010": { "vr": "PN", "Value": [ { "Alphabetic": "Doe^John" } ] },
//!   "00081140": { "vr": "SQ", "Value": [ { "00081155": { "vr": "UI", "Value": ["1.2.3"] } } ] },
//!   "7FE00010": { "vr": "OW", "BulkDataURI": "pixels.raw" }
//! }
//! ```
//!
//! Person names are held in the tree as `Alphabetic=Ideographic=Phonetic`. IS and DS
//! values are held as text and written back as JSON numbers when they parse as one.

use super::{TreeLoader, TreeWriter};
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use crate::domain::tag::Tag;
use crate::domain::tree::{AttributeTree, DatasetId, Element, Value};
use crate::domain::vr::{Vr, VrClass};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value as Json};
use std::path::Path;

const PN_COMPONENTS: [&str; 3] = ["Alphabetic", "Ideographic", "Phonetic"];

/// DICOM JSON Model collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModel;

impl JsonModel {
    pub fn new() -> Self {
        Self
    }

    /// Whether `path` looks like a JSON Model file (`.json`, any case)
    pub fn is_data_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }

    /// Parses JSON Model text; `path` only names the source in errors
    pub fn parse_str(text: &str, path: &Path) -> Result<AttributeTree> {
        let json: Json = serde_json::from_str(text)
            .map_err(|e| DeidError::not_a_data_file(path, format!("invalid JSON: {e}")))?;
        let Json::Object(root) = json else {
            return Err(DeidError::not_a_data_file(path, "root is not a JSON object"));
        };

        let mut tree = AttributeTree::new();
        let dataset = tree.root();
        parse_dataset(&mut tree, dataset, &root, path)?;
        Ok(tree)
    }

    /// Renders a tree as a JSON Model value
    pub fn to_json(tree: &AttributeTree) -> Json {
        Json::Object(write_dataset(tree, tree.root()))
    }

    /// Renders a tree as pretty-printed JSON Model text
    pub fn to_string_pretty(tree: &AttributeTree) -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::to_json(tree))?)
    }
}

impl TreeLoader for JsonModel {
    fn load(&self, path: &Path) -> Result<AttributeTree> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                DeidError::not_a_data_file(path, "content is not UTF-8 text")
            }
            _ => DeidError::Io(format!("Failed to read {}: {e}", path.display())),
        })?;
        Self::parse_str(&text, path)
    }
}

impl TreeWriter for JsonModel {
    fn write(&self, tree: &AttributeTree, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, Self::to_string_pretty(tree)?)?;
        Ok(())
    }
}

fn parse_tag_key(key: &str) -> Option<Tag> {
    if key.len() != 8 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let group = u16::from_str_radix(&key[..4], 16).ok()?;
    let element = u16::from_str_radix(&key[4..], 16).ok()?;
    Some(Tag::new(group, element))
}

fn parse_dataset(
    tree: &mut AttributeTree,
    dataset: DatasetId,
    object: &Map<String, Json>,
    path: &Path,
) -> Result<()> {
    for (key, attribute) in object {
        let tag = parse_tag_key(key)
            .ok_or_else(|| DeidError::not_a_data_file(path, format!("invalid tag key '{key}'")))?;
        let Json::Object(attribute) = attribute else {
            return Err(DeidError::not_a_data_file(
                path,
                format!("attribute {tag} is not an object"),
            ));
        };
        let vr: Vr = attribute
            .get("vr")
            .and_then(Json::as_str)
            .ok_or_else(|| DeidError::not_a_data_file(path, format!("attribute {tag} has no vr")))?
            .parse()
            .map_err(|e: String| DeidError::not_a_data_file(path, format!("{tag}: {e}")))?;

        let value = parse_value(tree, tag, vr, attribute, path)?;
        tree.insert(dataset, Element::new(tag, vr, value));
    }
    Ok(())
}

fn parse_value(
    tree: &mut AttributeTree,
    tag: Tag,
    vr: Vr,
    attribute: &Map<String, Json>,
    path: &Path,
) -> Result<Value> {
    let malformed = |reason: &str| DeidError::not_a_data_file(path, format!("{tag}: {reason}"));

    if vr == Vr::SQ {
        let mut items = Vec::new();
        if let Some(values) = attribute.get("Value") {
            let Json::Array(values) = values else {
                return Err(malformed("sequence Value is not an array"));
            };
            for item in values {
                let Json::Object(item) = item else {
                    return Err(malformed("sequence item is not an object"));
                };
                let id = tree.new_item();
                parse_dataset(tree, id, item, path)?;
                items.push(id);
            }
        }
        return Ok(Value::Sequence(items));
    }

    if let Some(encoded) = attribute.get("InlineBinary") {
        let encoded = encoded
            .as_str()
            .ok_or_else(|| malformed("InlineBinary is not a string"))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| malformed(&format!("invalid InlineBinary: {e}")))?;
        return Ok(Value::Binary(bytes));
    }

    if let Some(uri) = attribute.get("BulkDataURI") {
        let uri = uri
            .as_str()
            .ok_or_else(|| malformed("BulkDataURI is not a string"))?;
        return Ok(Value::BulkData(uri.to_string()));
    }

    let Some(values) = attribute.get("Value") else {
        return Ok(Value::Empty);
    };
    let Json::Array(values) = values else {
        return Err(malformed("Value is not an array"));
    };
    if values.is_empty() {
        return Ok(Value::Empty);
    }

    if vr.class() == VrClass::Numeric && values.iter().all(Json::is_number) {
        let numbers = values
            .iter()
            .filter_map(|value| match value {
                Json::Number(n) => Some(n.clone()),
                _ => None,
            })
            .collect();
        return Ok(Value::Numbers(numbers));
    }

    let strings = values
        .iter()
        .map(|value| match value {
            Json::String(s) => Ok(s.clone()),
            Json::Number(n) => Ok(n.to_string()),
            Json::Null => Ok(String::new()),
            Json::Object(name) if vr == Vr::PN => Ok(person_name(name)),
            _ => Err(malformed("unsupported value type")),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Strings(strings))
}

fn person_name(object: &Map<String, Json>) -> String {
    let components: Vec<&str> = PN_COMPONENTS
        .iter()
        .map(|key| object.get(*key).and_then(Json::as_str).unwrap_or_default())
        .collect();
    components.join("=").trim_end_matches('=').to_string()
}

fn person_name_json(name: &str) -> Json {
    if name.is_empty() {
        return Json::Null;
    }
    let object: Map<String, Json> = PN_COMPONENTS
        .iter()
        .zip(name.split('='))
        .filter(|(_, component)| !component.is_empty())
        .map(|(key, component)| (key.to_string(), Json::String(component.to_string())))
        .collect();
    Json::Object(object)
}

fn write_dataset(tree: &AttributeTree, dataset: DatasetId) -> Map<String, Json> {
    let mut object = Map::new();
    for element in tree.dataset(dataset).iter() {
        let key = format!("{:04X}{:04X}", element.tag.group(), element.tag.element());
        let mut attribute = Map::new();
        attribute.insert("vr".to_string(), Json::String(element.vr.to_string()));

        match &element.value {
            Value::Empty => {}
            Value::Strings(values) => {
                let values = values
                    .iter()
                    .map(|value| string_json(element.vr, value))
                    .collect();
                attribute.insert("Value".to_string(), Json::Array(values));
            }
            Value::Numbers(values) => {
                let values = values.iter().cloned().map(Json::Number).collect();
                attribute.insert("Value".to_string(), Json::Array(values));
            }
            Value::Binary(bytes) => {
                attribute.insert("InlineBinary".to_string(), Json::String(STANDARD.encode(bytes)));
            }
            Value::BulkData(uri) => {
                attribute.insert("BulkDataURI".to_string(), Json::String(uri.clone()));
            }
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| Json::Object(write_dataset(tree, *item)))
                    .collect();
                attribute.insert("Value".to_string(), Json::Array(items));
            }
        }
        object.insert(key, Json::Object(attribute));
    }
    object
}

fn string_json(vr: Vr, value: &str) -> Json {
    match vr.class() {
        _ if vr == Vr::PN => person_name_json(value),
        VrClass::NumericString | VrClass::Numeric => serde_json::from_str::<Number>(value.trim())
            .map(Json::Number)
            .unwrap_or_else(|_| Json::String(value.to_string())),
        _ => Json::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "00080060": { "vr": "CS", "Value": ["MR"] },
        "00080008": { "vr": "CS", "Value": ["ORIGINAL", "PRIMARY"] },
        "00100010": { "vr": "PN", "Value": [ { "Alphabetic": "Doe^John", "Phonetic": "do^jon" } ] },
        "00200013": { "vr": "IS", "Value": [7] },
        "00280010": { "vr": "US", "Value": [256] },
        "00291010": { "vr": "OB", "InlineBinary": "AQID" },
        "7FE00010": { "vr": "OW", "BulkDataURI": "pixels.raw" },
        "00081140": { "vr": "SQ", "Value": [ { "00081155": { "vr": "UI", "Value": ["1.2.3"] } } ] },
        "00100030": { "vr": "DA" }
    }"#;

    fn parse(text: &str) -> Result<AttributeTree> {
        JsonModel::parse_str(text, Path::new("sample.json"))
    }

    #[test]
    fn test_parse_sample() {
        let tree = parse(SAMPLE).unwrap();
        let root = tree.root();

        assert_eq!(tree.string(root, Tag::new(0x0008, 0x0060)), Some("MR"));
        assert_eq!(
            tree.string(root, Tag::new(0x0010, 0x0010)),
            Some("Doe^John==do^jon")
        );
        assert_eq!(tree.string(root, Tag::new(0x0020, 0x0013)), Some("7"));
        assert_eq!(
            tree.get(root, Tag::new(0x0028, 0x0010)).unwrap().value,
            Value::Numbers(vec![Number::from(256)])
        );
        assert_eq!(
            tree.get(root, Tag::new(0x0029, 0x1010)).unwrap().value,
            Value::Binary(vec![1, 2, 3])
        );
        assert_eq!(
            tree.get(root, Tag::new(0x7FE0, 0x0010)).unwrap().value,
            Value::BulkData("pixels.raw".to_string())
        );
        assert_eq!(
            tree.get(root, Tag::new(0x0010, 0x0030)).unwrap().value,
            Value::Empty
        );

        let items = tree.get(root, Tag::new(0x0008, 0x1140)).unwrap().value.items().to_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(tree.string(items[0], Tag::new(0x0008, 0x1155)), Some("1.2.3"));
    }

    #[test]
    fn test_write_then_parse_preserves_content() {
        let tree = parse(SAMPLE).unwrap();
        let text = JsonModel::to_string_pretty(&tree).unwrap();
        let again = parse(&text).unwrap();
        assert_eq!(again.to_string(), tree.to_string());
    }

    #[test]
    fn test_written_json_shape() {
        let tree = parse(SAMPLE).unwrap();
        let json = JsonModel::to_json(&tree);
        assert_eq!(json["00100010"]["Value"][0]["Alphabetic"], "Doe^John");
        assert!(json["00100010"]["Value"][0].get("Ideographic").is_none());
        assert_eq!(json["00200013"]["Value"][0], 7);
        assert_eq!(json["00291010"]["InlineBinary"], "AQID");
        assert!(json["00100030"].get("Value").is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        for text in [
            "not json",
            "[1, 2]",
            r#"{"0010": {"vr": "PN"}}"#,
            r#"{"00100010": {"vr": "ZZ"}}"#,
            r#"{"00100010": {"Value": ["x"]}}"#,
            r#"{"00100010": "Doe"}"#,
        ] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, DeidError::NotADataFile { .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn test_is_data_file() {
        assert!(JsonModel::is_data_file(Path::new("a/b/scan.json")));
        assert!(JsonModel::is_data_file(Path::new("SCAN.JSON")));
        assert!(!JsonModel::is_data_file(Path::new("scan.dcm")));
        assert!(!JsonModel::is_data_file(Path::new("DICOMDIR")));
    }
}
