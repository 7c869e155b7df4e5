use rustc_hash::FxHashMap;

use crate::dom::{Dom, NodeId, NodeType};
use crate::edit_script::{Action, EditScriptEntry, NodeProperties};
use crate::error::DiffError;

/// Where a node lived when the runner touched it: its parent and the sibling
/// that followed it, both captured against the tree state at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrigPosition {
    pub parent: NodeId,
    pub next_sibling: Option<NodeId>,
}

/// The result of running an edit script: the mutated tree, the affected
/// nodes in script order, and their original positions.
pub struct EditScriptOutcome {
    pub dom: Dom,
    pub inserted: Vec<NodeId>,
    pub deleted: Vec<NodeId>,
    pub origins: FxHashMap<NodeId, OrigPosition>,
}

/// Applies an edit script to a document, top to bottom.
pub struct EditScriptRunner {
    dom: Dom,
    inserted: Vec<NodeId>,
    deleted: Vec<NodeId>,
    origins: FxHashMap<NodeId, OrigPosition>,
}

impl EditScriptRunner {
    pub fn new(dom: Dom) -> Self {
        Self {
            dom,
            inserted: Vec::new(),
            deleted: Vec::new(),
            origins: FxHashMap::default(),
        }
    }

    pub fn run(mut self, edit_script: &[EditScriptEntry]) -> Result<EditScriptOutcome, DiffError> {
        for entry in edit_script {
            match entry.action {
                Action::Delete => self.apply_delete(entry)?,
                Action::Insert => self.apply_insert(entry)?,
            }
        }
        Ok(EditScriptOutcome {
            dom: self.dom,
            inserted: self.inserted,
            deleted: self.deleted,
            origins: self.origins,
        })
    }

    fn apply_delete(&mut self, entry: &EditScriptEntry) -> Result<(), DiffError> {
        let node = self
            .dom
            .resolve_location(&entry.location)
            .ok_or_else(|| DiffError::InvalidLocation(entry.location.clone()))?;
        let parent = self
            .dom
            .parent(node)
            .ok_or_else(|| DiffError::InvalidLocation(entry.location.clone()))?;
        let next_sibling = self.dom.next_sibling(node);
        self.dom.detach(node);
        self.origins.insert(node, OrigPosition { parent, next_sibling });
        self.deleted.push(node);
        Ok(())
    }

    fn apply_insert(&mut self, entry: &EditScriptEntry) -> Result<(), DiffError> {
        let Some((&child_index, parent_location)) = entry.location.split_last() else {
            return Err(DiffError::InvalidLocation(entry.location.clone()));
        };
        let parent = self
            .dom
            .resolve_location(parent_location)
            .ok_or_else(|| DiffError::InvalidLocation(entry.location.clone()))?;
        if child_index > self.dom.children(parent).len() {
            return Err(DiffError::InvalidLocation(entry.location.clone()));
        }
        let node = create_node(&mut self.dom, &entry.properties)?;
        // The node previously at the target index ends up shifted right.
        let next_sibling = self.dom.child(parent, child_index);
        self.dom.insert_before(parent, node, next_sibling);
        self.origins.insert(node, OrigPosition { parent, next_sibling });
        self.inserted.push(node);
        Ok(())
    }
}

fn create_node(dom: &mut Dom, properties: &NodeProperties) -> Result<NodeId, DiffError> {
    match properties.node_type {
        NodeType::Element => {
            let name = properties.node_name.as_deref().ok_or_else(|| {
                DiffError::MalformedProperties("element properties without a node_name".to_owned())
            })?;
            Ok(dom.create_element(name, properties.attributes.clone()))
        }
        NodeType::Text => {
            let value = properties.node_value.as_deref().ok_or_else(|| {
                DiffError::MalformedProperties("text properties without a node_value".to_owned())
            })?;
            Ok(dom.create_text(value))
        }
    }
}
