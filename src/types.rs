//! Core data types for the workflow canvas.
//!
//! Nodes are addressed by caller-supplied string ids and laid out in world space.
//! Colors and icons are closed enums with explicit lookup tables; nothing here is
//! derived by picking apart style strings.

use crate::constants::{NODE_HEIGHT, NODE_WIDTH};
use crate::viewport::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Unique identifier for workflow nodes.
pub type NodeId = String;

/// Ordered mapping of configuration keys to JSON values.
///
/// `serde_json` is built with `preserve_order`, so iteration follows insertion order.
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Theme color attached to a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ColorToken {
    Amber,
    Blue,
    Cyan,
    Emerald,
    #[default]
    Gray,
    Green,
    Indigo,
    Lime,
    Orange,
    Pink,
    Purple,
    Red,
    Slate,
    Teal,
    Yellow,
}

impl ColorToken {
    /// sRGB value of the token (the 500 shade of the palette).
    pub const fn rgb(self) -> [u8; 3] {
        match self {
            ColorToken::Amber => [245, 158, 11],
            ColorToken::Blue => [59, 130, 246],
            ColorToken::Cyan => [6, 182, 212],
            ColorToken::Emerald => [16, 185, 129],
            ColorToken::Gray => [107, 114, 128],
            ColorToken::Green => [34, 197, 94],
            ColorToken::Indigo => [99, 102, 241],
            ColorToken::Lime => [132, 204, 22],
            ColorToken::Orange => [249, 115, 22],
            ColorToken::Pink => [236, 72, 153],
            ColorToken::Purple => [168, 85, 247],
            ColorToken::Red => [239, 68, 68],
            ColorToken::Slate => [100, 116, 139],
            ColorToken::Teal => [20, 184, 166],
            ColorToken::Yellow => [234, 179, 8],
        }
    }
}

/// Symbolic icon shown in a node's header badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum IconRef {
    BarChart,
    Bot,
    Brain,
    Calculator,
    Calendar,
    Code,
    Database,
    FileText,
    GitBranch,
    Globe,
    Image,
    Link,
    Mail,
    MessageSquare,
    Search,
    Users,
    Wrench,
    #[default]
    Generic,
}

impl IconRef {
    /// Glyph used to draw the icon with egui's bundled fonts.
    pub const fn glyph(self) -> &'static str {
        match self {
            IconRef::BarChart => "📊",
            IconRef::Bot => "🤖",
            IconRef::Brain => "💡",
            IconRef::Calculator => "🖩",
            IconRef::Calendar => "📅",
            IconRef::Code => "⌨",
            IconRef::Database => "🗄",
            IconRef::FileText => "📄",
            IconRef::GitBranch => "⑂",
            IconRef::Globe => "🌐",
            IconRef::Image => "🖼",
            IconRef::Link => "🔗",
            IconRef::Mail => "✉",
            IconRef::MessageSquare => "🗨",
            IconRef::Search => "🔍",
            IconRef::Users => "👥",
            IconRef::Wrench => "🔧",
            IconRef::Generic => "⬜",
        }
    }
}

/// Seed record for a node, as delivered by the composer layer.
///
/// Label, color and icon are optional; missing values are filled from the node
/// catalog by type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Caller-chosen unique id
    pub id: NodeId,
    /// World x of the top-left corner
    pub x: f64,
    /// World y of the top-left corner
    pub y: f64,
    /// Node kind tag, e.g. `"openai"`
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Theme color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_token: Option<ColorToken>,
    /// Header icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
    /// Initial configuration
    #[serde(default)]
    pub config: NodeConfig,
}

impl NodeSpec {
    /// Creates a seed record with only the required fields set.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            node_type: node_type.into(),
            label: None,
            color_token: None,
            icon: None,
            config: NodeConfig::new(),
        }
    }

    /// Sets an explicit label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends one configuration entry.
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// A workflow step placed on the canvas.
///
/// Every node has the same fixed size ([`Node::WIDTH`] x [`Node::HEIGHT`]); the
/// layout and minimap math relies on it. Selection is tracked by the store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// World x of the top-left corner
    pub x: f64,
    /// World y of the top-left corner
    pub y: f64,
    /// Node kind tag
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display label
    pub label: String,
    /// Theme color
    pub color_token: ColorToken,
    /// Header icon
    pub icon: IconRef,
    /// Configuration entries in insertion order
    pub config: NodeConfig,
}

impl Node {
    /// Fixed node width in world units.
    pub const WIDTH: f64 = NODE_WIDTH;
    /// Fixed node height in world units.
    pub const HEIGHT: f64 = NODE_HEIGHT;

    /// Top-left corner in world space.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// World-space box covered by the node.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            min_x: self.x,
            min_y: self.y,
            width: Self::WIDTH,
            height: Self::HEIGHT,
        }
    }

    /// Converts the node back into a seed record with every field populated.
    pub fn to_spec(&self) -> NodeSpec {
        NodeSpec {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            node_type: self.node_type.clone(),
            label: Some(self.label.clone()),
            color_token: Some(self.color_token),
            icon: Some(self.icon),
            config: self.config.clone(),
        }
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// ID of the source node
    pub from: NodeId,
    /// ID of the destination node
    pub to: NodeId,
}

impl Connection {
    /// Creates a new connection between two nodes.
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Node list plus connections, the shape exchanged with the composer layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in render order
    pub nodes: Vec<NodeSpec>,
    /// Directed connections
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphDocument {
    /// Serializes the document to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses either a full document or a bare array of node specs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Document(GraphDocument),
            Nodes(Vec<NodeSpec>),
        }

        Ok(match serde_json::from_str(json)? {
            Shape::Document(doc) => doc,
            Shape::Nodes(nodes) => GraphDocument {
                nodes,
                connections: Vec::new(),
            },
        })
    }
}
