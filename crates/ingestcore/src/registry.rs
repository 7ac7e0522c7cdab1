use crate::form::FieldSpec;
use crate::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display metadata and configuration schema for one node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeDef {
    pub kind: NodeKind,
    pub label: String,
    pub category: String,
    pub fields: Vec<FieldSpec>,
}

/// Kind -> type-definition dispatch table
///
/// The kind set is data: alternative enumerations (coarser or finer stage
/// splits) are registered here rather than hardcoded at call sites.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: HashMap<NodeKind, NodeTypeDef>,
    order: Vec<NodeKind>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six standard ingestion-pipeline stages
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(data_source());
        registry.register(vision());
        registry.register(llm());
        registry.register(chunking());
        registry.register(embedding());
        registry.register(connector());
        registry
    }

    pub fn register(&mut self, def: NodeTypeDef) {
        tracing::debug!(kind = %def.kind, "registering node type");
        if !self.types.contains_key(&def.kind) {
            self.order.push(def.kind.clone());
        }
        self.types.insert(def.kind.clone(), def);
    }

    pub fn get(&self, kind: &str) -> Option<&NodeTypeDef> {
        self.types.get(kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> Vec<&NodeTypeDef> {
        self.order.iter().filter_map(|k| self.types.get(k)).collect()
    }
}

fn data_source() -> NodeTypeDef {
    NodeTypeDef {
        kind: "data-source".to_string(),
        label: "Data Source".to_string(),
        category: "input".to_string(),
        fields: vec![
            FieldSpec::select("source_type", "Source", &["upload", "s3", "url"])
                .with_default("upload"),
            FieldSpec::select("strategy", "Partition strategy", &[
                "auto", "hi_res", "fast", "ocr_only",
            ])
            .with_default("auto"),
            FieldSpec::boolean("extract_metadata", "Extract metadata").with_default(true),
            FieldSpec::text("bucket", "S3 bucket").when_equals("source_type", "s3"),
            FieldSpec::secret("aws_secret", "AWS secret key").when_equals("source_type", "s3"),
            FieldSpec::text("url", "Document URL").when_equals("source_type", "url"),
        ],
    }
}

fn vision() -> NodeTypeDef {
    NodeTypeDef {
        kind: "vision".to_string(),
        label: "Vision / OCR".to_string(),
        category: "processing".to_string(),
        fields: vec![
            FieldSpec::select("provider", "Provider", &["local", "openai", "ollama"])
                .with_default("local"),
            FieldSpec::text("model", "Model").with_default("tesseract"),
            FieldSpec::secret("api_key", "API key")
                .when_one_of("provider", &["openai", "ollama"]),
            FieldSpec::select("detail", "Detail level", &["low", "high"]).with_default("high"),
        ],
    }
}

fn llm() -> NodeTypeDef {
    NodeTypeDef {
        kind: "llm".to_string(),
        label: "LLM Processing".to_string(),
        category: "processing".to_string(),
        fields: vec![
            FieldSpec::select("provider", "Provider", &["openai", "ollama", "local"])
                .with_default("openai"),
            FieldSpec::text("model", "Model").with_default("gpt-4o-mini"),
            FieldSpec::secret("api_key", "API key")
                .when_one_of("provider", &["openai", "ollama"]),
            FieldSpec::select("task_type", "Task", &[
                "summarize", "extract", "classify", "custom",
            ])
            .with_default("summarize"),
            FieldSpec::multiline("custom_prompt", "Custom prompt")
                .when_equals("task_type", "custom"),
            FieldSpec::number("temperature", "Temperature", 0.0, 2.0, 0.1).with_default(0.7),
            FieldSpec::number("max_tokens", "Max tokens", 1.0, 32768.0, 1.0).with_default(1024),
        ],
    }
}

fn chunking() -> NodeTypeDef {
    NodeTypeDef {
        kind: "chunking".to_string(),
        label: "Chunking".to_string(),
        category: "processing".to_string(),
        fields: vec![
            FieldSpec::select("chunk_strategy", "Strategy", &[
                "by_title", "by_page", "fixed_size",
            ])
            .with_default("by_title"),
            FieldSpec::number("chunk_size", "Chunk size", 100.0, 8000.0, 50.0).with_default(1000),
            FieldSpec::number("chunk_overlap", "Overlap", 0.0, 1000.0, 10.0).with_default(0),
        ],
    }
}

fn embedding() -> NodeTypeDef {
    NodeTypeDef {
        kind: "embedding".to_string(),
        label: "Embedding".to_string(),
        category: "processing".to_string(),
        fields: vec![
            FieldSpec::select("provider", "Provider", &[
                "openai", "bedrock", "sentence_transformers", "local",
            ])
            .with_default("openai"),
            FieldSpec::text("model", "Model").with_default("text-embedding-3-small"),
            FieldSpec::number("dimensions", "Dimensions", 64.0, 4096.0, 1.0).with_default(1536),
            FieldSpec::number("batch_size", "Batch size", 1.0, 2048.0, 1.0).with_default(100),
            FieldSpec::secret("api_key", "API key").when_equals("provider", "openai"),
        ],
    }
}

fn connector() -> NodeTypeDef {
    NodeTypeDef {
        kind: "connector".to_string(),
        label: "Vector Store".to_string(),
        category: "output".to_string(),
        fields: vec![
            FieldSpec::select("store_type", "Store", &[
                "qdrant", "pinecone", "chroma", "in_memory",
            ])
            .with_default("in_memory"),
            FieldSpec::text("collection_name", "Collection").with_default("documents"),
            FieldSpec::text("url", "Store URL").when_one_of("store_type", &["qdrant", "chroma"]),
            FieldSpec::secret("api_key", "API key").when_equals("store_type", "pinecone"),
        ],
    }
}
