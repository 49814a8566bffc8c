//! The node graph store: sole owner of nodes, connections and the selection.
//!
//! Nodes are kept in insertion order, which is also the paint order (later nodes
//! draw on top). Every successful mutation bumps [`NodeGraphStore::revision`] so
//! derived data such as the minimap can be cached against it.

use crate::catalog;
use crate::types::*;
use crate::viewport::Point;

/// Errors returned by store mutations. A failed call leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node with this id already exists
    #[error("node id `{0}` is already in use")]
    DuplicateId(NodeId),
    /// No node has this id
    #[error("node `{0}` not found")]
    NotFound(NodeId),
    /// A connection would start and end at the same node
    #[error("node `{0}` cannot be connected to itself")]
    SelfConnection(NodeId),
}

/// Owns the workflow's nodes, their connections and the single selection.
#[derive(Debug, Clone, Default)]
pub struct NodeGraphStore {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    selected: Option<NodeId>,
    revision: u64,
}

impl NodeGraphStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a seed document, stopping at the first invalid entry.
    pub fn from_document(doc: &GraphDocument) -> Result<Self, GraphError> {
        let mut store = Self::new();
        for spec in &doc.nodes {
            store.add_node(spec.clone())?;
        }
        for conn in &doc.connections {
            store.connect(&conn.from, &conn.to)?;
        }
        Ok(store)
    }

    /// Exports nodes and connections in seed shape.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.iter().map(Node::to_spec).collect(),
            connections: self.connections.clone(),
        }
    }

    /// Counter incremented by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All connections.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by id.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns true if a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn index_of(&self, id: &str) -> Result<usize, GraphError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Inserts a node built from `spec`.
    ///
    /// Label, icon and color missing from `spec` are taken from the catalog entry
    /// for its type tag, falling back to the tag itself, a generic icon and gray.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node, GraphError> {
        if self.contains(&spec.id) {
            log::warn!("rejecting node with duplicate id `{}`", spec.id);
            return Err(GraphError::DuplicateId(spec.id));
        }
        let kind = catalog::lookup(&spec.node_type);
        let node = Node {
            label: spec
                .label
                .or_else(|| kind.map(|k| k.label.to_string()))
                .unwrap_or_else(|| spec.node_type.clone()),
            color_token: spec
                .color_token
                .or_else(|| kind.map(|k| k.color))
                .unwrap_or_default(),
            icon: spec.icon.or_else(|| kind.map(|k| k.icon)).unwrap_or_default(),
            id: spec.id,
            x: spec.x,
            y: spec.y,
            node_type: spec.node_type,
            config: spec.config,
        };
        log::debug!("added node `{}` at ({}, {})", node.id, node.x, node.y);
        self.nodes.push(node);
        self.touch();
        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Moves a node's top-left corner to `(x, y)` in world space.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<(), GraphError> {
        let idx = self.index_of(id)?;
        let node = &mut self.nodes[idx];
        node.x = x;
        node.y = y;
        self.touch();
        Ok(())
    }

    /// Inserts or replaces one config entry. Existing keys keep their position.
    pub fn update_config(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), GraphError> {
        let idx = self.index_of(id)?;
        let key = key.into();
        log::debug!("node `{id}` config `{key}` = {value}");
        self.nodes[idx].config.insert(key, value);
        self.touch();
        Ok(())
    }

    /// Removes one config entry, returning its previous value.
    pub fn remove_config(&mut self, id: &str, key: &str) -> Result<Option<serde_json::Value>, GraphError> {
        let idx = self.index_of(id)?;
        let removed = self.nodes[idx].config.shift_remove(key);
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    /// Renames a node.
    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> Result<(), GraphError> {
        let idx = self.index_of(id)?;
        self.nodes[idx].label = label.into();
        self.touch();
        Ok(())
    }

    /// Removes a node together with its connections and returns it.
    ///
    /// Deleting an id that is not present is a no-op, not an error: the UI can
    /// deliver a second delete for a node that is already gone.
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let idx = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(idx);
        self.connections.retain(|c| c.from != id && c.to != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.touch();
        log::debug!("deleted node `{id}`");
        Some(node)
    }

    /// Adds a directed connection. Re-adding an existing connection changes nothing.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.index_of(from)?;
        self.index_of(to)?;
        if from == to {
            return Err(GraphError::SelfConnection(from.to_string()));
        }
        if self.connections.iter().any(|c| c.from == from && c.to == to) {
            return Ok(());
        }
        self.connections.push(Connection::new(from, to));
        self.touch();
        Ok(())
    }

    /// Removes a connection. Returns true if it existed.
    pub fn disconnect(&mut self, from: &str, to: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| !(c.from == from && c.to == to));
        let removed = self.connections.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Selects a node, replacing any previous selection.
    pub fn select(&mut self, id: &str) -> Result<(), GraphError> {
        self.index_of(id)?;
        if self.selected.as_deref() != Some(id) {
            self.selected = Some(id.to_string());
            self.touch();
        }
        Ok(())
    }

    /// Clears the selection.
    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.touch();
        }
    }

    /// Id of the selected node, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Returns true if `id` is the selected node.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Topmost node whose box contains the world-space point.
    pub fn node_at(&self, world: Point) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.bounds().contains(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(ids: &[&str]) -> NodeGraphStore {
        let mut store = NodeGraphStore::new();
        for (i, id) in ids.iter().enumerate() {
            store
                .add_node(NodeSpec::new(*id, "calculator", i as f64 * 250.0, 0.0))
                .unwrap();
        }
        store
    }

    #[test]
    fn add_node_fills_catalog_defaults() {
        let mut store = NodeGraphStore::new();
        let node = store.add_node(NodeSpec::new("a", "openai", 1.0, 2.0)).unwrap();
        assert_eq!(node.label, "OpenAI");
        assert_eq!(node.icon, IconRef::Brain);
        assert_eq!(node.color_token, ColorToken::Green);
    }

    #[test]
    fn add_node_with_unknown_type_uses_fallbacks() {
        let mut store = NodeGraphStore::new();
        let node = store.add_node(NodeSpec::new("a", "mystery", 0.0, 0.0)).unwrap();
        assert_eq!(node.label, "mystery");
        assert_eq!(node.icon, IconRef::Generic);
        assert_eq!(node.color_token, ColorToken::Gray);
    }

    #[test]
    fn duplicate_id_is_rejected_and_store_unchanged() {
        let mut store = store_with(&["a"]);
        let revision = store.revision();
        let err = store
            .add_node(NodeSpec::new("a", "openai", 500.0, 500.0))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateId("a".into()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().x, 0.0);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn move_node_updates_position() {
        let mut store = store_with(&["a"]);
        store.move_node("a", 42.0, -7.5).unwrap();
        assert_eq!(store.get("a").unwrap().position(), Point::new(42.0, -7.5));
    }

    #[test]
    fn move_and_configure_unknown_node_fail() {
        let mut store = store_with(&["a"]);
        assert_eq!(
            store.move_node("b", 0.0, 0.0),
            Err(GraphError::NotFound("b".into()))
        );
        assert_eq!(
            store.update_config("b", "k", json!(1)),
            Err(GraphError::NotFound("b".into()))
        );
        assert!(store.get("a").unwrap().config.is_empty());
    }

    #[test]
    fn update_config_upserts_in_place() {
        let mut store = store_with(&["a"]);
        store.update_config("a", "model", json!("gpt-4")).unwrap();
        store.update_config("a", "temperature", json!(0.2)).unwrap();
        store.update_config("a", "model", json!("gpt-3.5-turbo")).unwrap();

        let config = &store.get("a").unwrap().config;
        let entries: Vec<(&str, &serde_json::Value)> =
            config.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            entries,
            vec![("model", &json!("gpt-3.5-turbo")), ("temperature", &json!(0.2))]
        );
    }

    #[test]
    fn remove_config_keeps_remaining_order() {
        let mut store = store_with(&["a"]);
        for key in ["one", "two", "three"] {
            store.update_config("a", key, json!(key)).unwrap();
        }
        assert_eq!(store.remove_config("a", "two").unwrap(), Some(json!("two")));
        let keys: Vec<&str> = store.get("a").unwrap().config.keys().map(String::as_str).collect();
        assert_eq!(keys, ["one", "three"]);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = store_with(&["a", "b"]);
        assert!(store.delete_node("a").is_some());
        assert_eq!(store.len(), 1);
        assert!(store.delete_node("a").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_clears_selection_and_connections() {
        let mut store = store_with(&["a", "b", "c"]);
        store.connect("a", "b").unwrap();
        store.connect("b", "c").unwrap();
        store.connect("a", "c").unwrap();
        store.select("b").unwrap();

        store.delete_node("b");

        assert_eq!(store.selected(), None);
        assert_eq!(store.connections(), &[Connection::new("a", "c")]);
    }

    #[test]
    fn deleting_other_node_keeps_selection() {
        let mut store = store_with(&["a", "b"]);
        store.select("a").unwrap();
        store.delete_node("b");
        assert_eq!(store.selected(), Some("a"));
    }

    #[test]
    fn selection_is_single() {
        let mut store = store_with(&["a", "b"]);
        store.select("a").unwrap();
        store.select("b").unwrap();
        assert!(!store.is_selected("a"));
        assert!(store.is_selected("b"));
        store.deselect();
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn selecting_unknown_node_keeps_selection() {
        let mut store = store_with(&["a"]);
        store.select("a").unwrap();
        assert!(store.select("zzz").is_err());
        assert_eq!(store.selected(), Some("a"));
    }

    #[test]
    fn connect_validates_endpoints() {
        let mut store = store_with(&["a", "b"]);
        assert_eq!(store.connect("a", "x"), Err(GraphError::NotFound("x".into())));
        assert_eq!(store.connect("a", "a"), Err(GraphError::SelfConnection("a".into())));
        store.connect("a", "b").unwrap();
        store.connect("a", "b").unwrap();
        assert_eq!(store.connections().len(), 1);
        assert!(store.disconnect("a", "b"));
        assert!(!store.disconnect("a", "b"));
    }

    #[test]
    fn node_at_prefers_topmost() {
        let mut store = NodeGraphStore::new();
        store.add_node(NodeSpec::new("under", "calculator", 0.0, 0.0)).unwrap();
        store.add_node(NodeSpec::new("over", "calculator", 100.0, 40.0)).unwrap();
        assert_eq!(store.node_at(Point::new(150.0, 60.0)).unwrap().id, "over");
        assert_eq!(store.node_at(Point::new(10.0, 10.0)).unwrap().id, "under");
        assert!(store.node_at(Point::new(-1.0, 10.0)).is_none());
    }

    #[test]
    fn document_round_trip_preserves_graph() {
        let mut store = store_with(&["a", "b"]);
        store.connect("a", "b").unwrap();
        store.update_config("b", "k", json!(true)).unwrap();

        let rebuilt = NodeGraphStore::from_document(&store.to_document()).unwrap();
        assert_eq!(rebuilt.nodes(), store.nodes());
        assert_eq!(rebuilt.connections(), store.connections());
    }

    #[test]
    fn from_document_reports_first_error() {
        let doc = GraphDocument {
            nodes: vec![
                NodeSpec::new("a", "openai", 0.0, 0.0),
                NodeSpec::new("a", "openai", 10.0, 0.0),
            ],
            connections: Vec::new(),
        };
        assert_eq!(
            NodeGraphStore::from_document(&doc).unwrap_err(),
            GraphError::DuplicateId("a".into())
        );
    }
}
