//! Built-in node kinds and workflow templates.
//!
//! The catalog supplies the label, icon and color for a node type tag, and the
//! templates give new users a few ready-made graphs to start from.

use crate::types::{ColorToken, Connection, GraphDocument, IconRef, NodeSpec};
use serde_json::json;

/// A node kind offered by the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKind {
    /// Type tag stored on nodes of this kind
    pub type_tag: &'static str,
    /// Human-friendly display name
    pub label: &'static str,
    /// Header icon
    pub icon: IconRef,
    /// Theme color
    pub color: ColorToken,
}

/// A named group of node kinds, as shown in the palette.
pub struct NodeCategory {
    /// Display name of the category
    pub name: &'static str,
    /// Kinds in display order
    pub kinds: &'static [NodeKind],
}

const fn kind(
    type_tag: &'static str,
    label: &'static str,
    icon: IconRef,
    color: ColorToken,
) -> NodeKind {
    NodeKind {
        type_tag,
        label,
        icon,
        color,
    }
}

/// Returns every palette category with its node kinds.
pub const fn categories() -> &'static [NodeCategory] {
    use ColorToken::*;
    use IconRef::*;

    const CATEGORIES: &[NodeCategory] = &[
        NodeCategory {
            name: "LLMs",
            kinds: &[
                kind("openai", "OpenAI", Brain, Green),
                kind("anthropic", "Anthropic", Brain, Orange),
                kind("cohere", "Cohere", Brain, Blue),
                kind("huggingface", "HuggingFace", Brain, Yellow),
                kind("ollama", "Ollama", Brain, Purple),
            ],
        },
        NodeCategory {
            name: "Chains",
            kinds: &[
                kind("llm-chain", "LLM Chain", Link, Indigo),
                kind("sequential-chain", "Sequential Chain", GitBranch, Teal),
                kind("router-chain", "Router Chain", GitBranch, Pink),
            ],
        },
        NodeCategory {
            name: "Agents",
            kinds: &[
                kind("zero-shot-agent", "Zero Shot Agent", Bot, Red),
                kind("conversational-agent", "Conversational Agent", MessageSquare, Cyan),
                kind("plan-execute-agent", "Plan & Execute Agent", Calendar, Lime),
            ],
        },
        NodeCategory {
            name: "Memory",
            kinds: &[
                kind("conversation-buffer", "Conversation Buffer", Database, Gray),
                kind("conversation-summary", "Conversation Summary", FileText, Slate),
                kind("vector-store", "Vector Store Memory", Database, Emerald),
            ],
        },
        NodeCategory {
            name: "Tools",
            kinds: &[
                kind("search-tool", "Search Tool", Search, Blue),
                kind("calculator", "Calculator", Calculator, Green),
                kind("code-interpreter", "Code Interpreter", Code, Purple),
                kind("web-scraper", "Web Scraper", Globe, Orange),
                kind("file-reader", "File Reader", FileText, Red),
                kind("image-generator", "Image Generator", Image, Pink),
                kind("email-tool", "Email Tool", Mail, Cyan),
            ],
        },
        NodeCategory {
            name: "Retrievers",
            kinds: &[
                kind("vector-retriever", "Vector Retriever", Database, Indigo),
                kind("bm25-retriever", "BM25 Retriever", Search, Teal),
                kind("ensemble-retriever", "Ensemble Retriever", Users, Amber),
            ],
        },
        NodeCategory {
            name: "Text Splitters",
            kinds: &[
                kind("recursive-splitter", "Recursive Splitter", Wrench, Gray),
                kind("token-splitter", "Token Splitter", Wrench, Slate),
            ],
        },
        NodeCategory {
            name: "Embeddings",
            kinds: &[
                kind("openai-embeddings", "OpenAI Embeddings", BarChart, Green),
                kind("huggingface-embeddings", "HuggingFace Embeddings", BarChart, Yellow),
            ],
        },
        NodeCategory {
            name: "Vector Stores",
            kinds: &[
                kind("chroma", "Chroma", Database, Purple),
                kind("pinecone", "Pinecone", Database, Blue),
                kind("faiss", "FAISS", Database, Red),
            ],
        },
        NodeCategory {
            name: "Input/Output",
            kinds: &[
                kind("text-input", "Text Input", MessageSquare, Blue),
                kind("chat-input", "Chat Input", MessageSquare, Green),
                kind("file-input", "File Input", FileText, Orange),
                kind("text-output", "Text Output", FileText, Red),
                kind("chat-output", "Chat Output", MessageSquare, Purple),
            ],
        },
    ];
    CATEGORIES
}

/// Finds the catalog entry for a type tag.
pub fn lookup(type_tag: &str) -> Option<&'static NodeKind> {
    categories()
        .iter()
        .flat_map(|category| category.kinds.iter())
        .find(|kind| kind.type_tag == type_tag)
}

/// Kinds of built-in workflow templates available from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Input -> retriever -> LLM -> output
    RagPipeline,
    /// Chat agent with memory and two tools
    ConversationalAgent,
    /// Document ingestion plus question answering
    DocumentQa,
}

/// Metadata for a single template.
pub struct TemplateInfo {
    /// Stable identifier for the template
    pub kind: TemplateKind,
    /// Human-friendly display name
    pub name: &'static str,
    /// Difficulty hint shown next to the name
    pub complexity: &'static str,
}

/// Returns all templates with their display names.
pub const fn all_templates() -> &'static [TemplateInfo] {
    const TEMPLATES: &[TemplateInfo] = &[
        TemplateInfo {
            kind: TemplateKind::RagPipeline,
            name: "RAG Pipeline",
            complexity: "Beginner",
        },
        TemplateInfo {
            kind: TemplateKind::ConversationalAgent,
            name: "Conversational Agent",
            complexity: "Intermediate",
        },
        TemplateInfo {
            kind: TemplateKind::DocumentQa,
            name: "Document Q&A System",
            complexity: "Advanced",
        },
    ];
    TEMPLATES
}

/// Builds the graph for a template.
///
/// Every node id gets `-{suffix}` appended so that loading the same template twice
/// never produces colliding ids. Connections are rewritten to match.
pub fn build_template(kind: TemplateKind, suffix: &str) -> GraphDocument {
    let mut doc = match kind {
        TemplateKind::RagPipeline => build_rag_pipeline(),
        TemplateKind::ConversationalAgent => build_conversational_agent(),
        TemplateKind::DocumentQa => build_document_qa(),
    };
    let rename = |id: &str| format!("{id}-{suffix}");
    for node in &mut doc.nodes {
        node.id = rename(&node.id);
    }
    for conn in &mut doc.connections {
        conn.from = rename(&conn.from);
        conn.to = rename(&conn.to);
    }
    doc
}

fn chain(pairs: &[(&str, &str)]) -> Vec<Connection> {
    pairs
        .iter()
        .map(|(from, to)| Connection::new(*from, *to))
        .collect()
}

fn build_rag_pipeline() -> GraphDocument {
    GraphDocument {
        nodes: vec![
            NodeSpec::new("input-1", "text-input", 100.0, 200.0)
                .with_config("placeholder", json!("Enter your question...")),
            NodeSpec::new("retriever-1", "vector-retriever", 300.0, 200.0)
                .with_config("top_k", json!(5))
                .with_config("collection", json!("documents")),
            NodeSpec::new("llm-1", "openai", 500.0, 200.0)
                .with_config("model", json!("gpt-3.5-turbo"))
                .with_config("temperature", json!(0.7)),
            NodeSpec::new("output-1", "text-output", 700.0, 200.0),
        ],
        connections: chain(&[
            ("input-1", "retriever-1"),
            ("retriever-1", "llm-1"),
            ("llm-1", "output-1"),
        ]),
    }
}

fn build_conversational_agent() -> GraphDocument {
    GraphDocument {
        nodes: vec![
            NodeSpec::new("chat-input-1", "chat-input", 100.0, 150.0),
            NodeSpec::new("memory-1", "conversation-buffer", 100.0, 300.0)
                .with_config("max_token_limit", json!(2000)),
            NodeSpec::new("agent-1", "conversational-agent", 350.0, 200.0)
                .with_config("model", json!("gpt-4")),
            NodeSpec::new("search-1", "search-tool", 350.0, 350.0)
                .with_config("engine", json!("google")),
            NodeSpec::new("calculator-1", "calculator", 500.0, 350.0),
            NodeSpec::new("chat-output-1", "chat-output", 600.0, 200.0),
        ],
        connections: chain(&[
            ("chat-input-1", "agent-1"),
            ("memory-1", "agent-1"),
            ("agent-1", "search-1"),
            ("agent-1", "calculator-1"),
            ("agent-1", "chat-output-1"),
        ]),
    }
}

fn build_document_qa() -> GraphDocument {
    GraphDocument {
        nodes: vec![
            NodeSpec::new("file-input-1", "file-input", 50.0, 100.0)
                .with_config("accept", json!(".pdf,.txt,.docx")),
            NodeSpec::new("splitter-1", "recursive-splitter", 200.0, 100.0)
                .with_config("chunk_size", json!(1000))
                .with_config("chunk_overlap", json!(200)),
            NodeSpec::new("embeddings-1", "openai-embeddings", 350.0, 100.0)
                .with_config("model", json!("text-embedding-ada-002")),
            NodeSpec::new("vectorstore-1", "chroma", 500.0, 100.0)
                .with_config("collection_name", json!("documents")),
            NodeSpec::new("question-input-1", "text-input", 50.0, 300.0)
                .with_config("placeholder", json!("Ask a question about the document...")),
            NodeSpec::new("retriever-1", "vector-retriever", 300.0, 300.0)
                .with_config("top_k", json!(3)),
            NodeSpec::new("llm-1", "openai", 500.0, 300.0)
                .with_config("model", json!("gpt-4"))
                .with_config("temperature", json!(0.1)),
            NodeSpec::new("output-1", "text-output", 650.0, 300.0),
        ],
        connections: chain(&[
            ("file-input-1", "splitter-1"),
            ("splitter-1", "embeddings-1"),
            ("embeddings-1", "vectorstore-1"),
            ("question-input-1", "retriever-1"),
            ("vectorstore-1", "retriever-1"),
            ("retriever-1", "llm-1"),
            ("llm-1", "output-1"),
        ]),
    }
}
