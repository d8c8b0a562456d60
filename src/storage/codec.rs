//! JSON form of the template tree.
//!
//! Each node is written as `{ name, content, is_folder, children }` where
//! `children` is an object keyed by child name. Object key order is the
//! display order, so both directions walk the map in document order instead
//! of going through a sorted map.

use crate::error::Result;
use crate::tree::{NodeKind, Subtree, TreeStore, ROOT_NAME};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

impl Serialize for Subtree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Subtree", 4)?;
        record.serialize_field("name", &self.name)?;
        record.serialize_field("content", &self.content)?;
        record.serialize_field("is_folder", &self.kind.is_folder())?;
        record.serialize_field("children", &OrderedChildren(&self.children))?;
        record.end()
    }
}

struct OrderedChildren<'a>(&'a [Subtree]);

impl Serialize for OrderedChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for child in self.0 {
            map.serialize_entry(&child.name, child)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    is_folder: bool,
    #[serde(default)]
    children: RawChildren,
}

impl RawRecord {
    /// `key` is the name under which the parent listed this record. It is
    /// used when the record does not carry a name of its own.
    fn into_subtree(self, key: String) -> Subtree {
        let name = self.name.filter(|n| !n.is_empty()).unwrap_or(key);
        Subtree {
            name,
            content: self.content.unwrap_or_default(),
            kind: if self.is_folder {
                NodeKind::Folder
            } else {
                NodeKind::Leaf
            },
            children: self
                .children
                .0
                .into_iter()
                .map(|(key, child)| child.into_subtree(key))
                .collect(),
        }
    }
}

/// Children in document order.
#[derive(Default)]
struct RawChildren(Vec<(String, RawRecord)>);

impl<'de> Deserialize<'de> for RawChildren {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ChildrenVisitor;

        impl<'de> Visitor<'de> for ChildrenVisitor {
            type Value = RawChildren;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of child records keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, record)) = map.next_entry::<String, RawRecord>()? {
                    entries.push((key, record));
                }
                Ok(RawChildren(entries))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(RawChildren::default())
            }
        }

        deserializer.deserialize_any(ChildrenVisitor)
    }
}

impl<'de> Deserialize<'de> for Subtree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RawRecord::deserialize(deserializer).map(|raw| raw.into_subtree(String::new()))
    }
}

/// Pretty-printed JSON for the whole tree.
pub fn to_json(tree: &TreeStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&tree.to_subtree())?)
}

/// Parse a stored tree, enforcing the same invariants the store does.
pub fn from_json(text: &str) -> Result<TreeStore> {
    let mut root: Subtree = serde_json::from_str(text)?;
    if root.name.is_empty() {
        root.name = ROOT_NAME.to_string();
    }
    TreeStore::from_subtree(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PasterError;

    #[test]
    fn test_children_keep_document_order() {
        let text = r#"{
            "name": "Root", "content": "", "is_folder": true,
            "children": {
                "zeta":  { "name": "zeta",  "content": "z", "is_folder": false, "children": {} },
                "alpha": { "name": "alpha", "content": "a", "is_folder": false, "children": {} },
                "mid":   { "name": "mid",   "content": "",  "is_folder": true,  "children": {} }
            }
        }"#;
        let tree = from_json(text).unwrap();
        let names: Vec<&str> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree.get(*id).unwrap().name())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_written_shape_uses_stored_field_names() {
        let mut tree = TreeStore::new();
        let root = tree.root();
        tree.add_leaf(root, "b", "second").unwrap();
        tree.add_leaf(root, "a", "first").unwrap();

        let json = to_json(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Root");
        assert_eq!(value["is_folder"], true);
        assert_eq!(value["children"]["a"]["content"], "first");
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        assert!(json.contains("\n  \"name\""));
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let text = r#"{ "is_folder": true, "children": { "note": { "content": "hi" } } }"#;
        let tree = from_json(text).unwrap();
        let note = tree.resolve_path("note").unwrap();
        assert_eq!(tree.get(note).unwrap().name(), "note");
        assert!(tree.get(note).unwrap().is_leaf());
        assert_eq!(tree.get(tree.root()).unwrap().name(), ROOT_NAME);
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let leaf_root = r#"{ "name": "Root", "content": "x", "is_folder": false, "children": {} }"#;
        assert!(matches!(from_json(leaf_root), Err(PasterError::InvalidData(_))));

        let clash = r#"{ "name": "Root", "is_folder": true, "children": {
            "a": { "name": "same", "content": "1" },
            "b": { "name": "same", "content": "2" }
        } }"#;
        assert!(matches!(from_json(clash), Err(PasterError::DuplicateName(_))));

        assert!(matches!(from_json("not json"), Err(PasterError::Json(_))));
    }

    #[test]
    fn test_text_survives_exactly() {
        let mut tree = TreeStore::new();
        let root = tree.root();
        let content = "Привет,\n\tмир! \u{1F600} \"quoted\" \\ back\r\nend";
        tree.add_leaf(root, "Юникод", content).unwrap();

        let json = to_json(&tree).unwrap();
        assert!(json.contains("Юникод"));
        let back = from_json(&json).unwrap();
        let leaf = back.resolve_path("Юникод").unwrap();
        assert_eq!(back.get(leaf).unwrap().content(), content);
    }
}
