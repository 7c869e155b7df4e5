//! The wire form of a diff: an ordered list of positional delete and insert
//! operations.

use core::fmt;
use std::collections::BTreeMap;

use derive_more::Display;
use itertools::Itertools;

use crate::dom::{Dom, NodeData, NodeId, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Action {
    #[display("delete")]
    Delete,
    #[display("insert")]
    Insert,
}

/// Description of a node for transport in an edit script. Fields that would
/// be empty are left out so that equality tests on scripts stay clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProperties {
    pub node_type: NodeType,
    /// The tag name; only present for elements.
    pub node_name: Option<String>,
    /// The text contents; only present for non-empty text nodes.
    pub node_value: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl NodeProperties {
    pub fn of(dom: &Dom, node: NodeId) -> Self {
        match dom.data(node) {
            NodeData::Element { name, attrs } => Self {
                node_type: NodeType::Element,
                node_name: Some(name.clone()),
                node_value: None,
                attributes: attrs.clone(),
            },
            NodeData::Text(value) => Self {
                node_type: NodeType::Text,
                node_name: None,
                node_value: if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                },
                attributes: BTreeMap::new(),
            },
        }
    }

    pub fn element(name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: Some(name.to_owned()),
            node_value: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: None,
            node_value: Some(value.to_owned()),
            attributes: BTreeMap::new(),
        }
    }
}

impl fmt::Display for NodeProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{node_type: {}", self.node_type.dom_code())?;
        if let Some(name) = &self.node_name {
            write!(f, ", node_name: {name}")?;
        }
        if let Some(value) = &self.node_value {
            write!(f, ", node_value: {value:?}")?;
        }
        if !self.attributes.is_empty() {
            write!(
                f,
                ", attributes: {{{}}}",
                self.attributes
                    .iter()
                    .format_with(", ", |(k, v), f| f(&format_args!("{k}: {v:?}")))
            )?;
        }
        write!(f, "}}")
    }
}

/// One step of an edit script: an action, the location it applies to in the
/// current state of the tree, and the properties of the affected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScriptEntry {
    pub action: Action,
    pub location: Vec<usize>,
    pub properties: NodeProperties,
}

impl EditScriptEntry {
    pub fn new(action: Action, location: Vec<usize>, properties: NodeProperties) -> Self {
        Self {
            action,
            location,
            properties,
        }
    }
}

impl fmt::Display for EditScriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, [{}], {})",
            self.action,
            self.location.iter().format(", "),
            self.properties
        )
    }
}
