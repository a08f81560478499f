//! Serializable snapshot of the expectations still pending in a mock tree.
//!
//! A transcript is a JSONL file: one `header` entry followed by one `node`
//! entry per node, in the same order `stop()` visits them.

use crate::errors::RecorderError;
use crate::mock::MockPrimitive;
use crate::recorder::Recorder;
use crate::runtime::FileSystem;
use crate::types::{Call, Kwargs, Mode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const LARGE_SIGNATURE_THRESHOLD: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Rendered signature, or `<hash:sha256:XXXXXXXXXXXXXXXX>` when truncated.
    pub signature: String,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
    #[serde(default)]
    pub signature_truncated: bool,
}

impl CallRecord {
    pub fn from_call(signature: String, call: &Call) -> Self {
        let (signature, signature_truncated) = if signature.len() > LARGE_SIGNATURE_THRESHOLD {
            use sha2::{Digest, Sha256};
            let hash = Sha256::digest(signature.as_bytes());
            (format!("<hash:sha256:{}>", hex_bytes(&hash[..8])), true)
        } else {
            (signature, false)
        };
        Self {
            signature,
            args: call.args.clone(),
            kwargs: call.kwargs.clone(),
            signature_truncated,
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub path: String,
    pub mode: Mode,
    pub pending: Vec<CallRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptHeader {
    pub root: String,
    pub node_count: usize,
    pub recorder_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Header(TranscriptHeader),
    Node(NodeSnapshot),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub header: TranscriptHeader,
    pub nodes: Vec<NodeSnapshot>,
}

impl Transcript {
    pub fn pending_count(&self) -> usize {
        self.nodes.iter().map(|node| node.pending.len()).sum()
    }

    pub fn node(&self, path: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.path == path)
    }

    pub fn to_jsonl(&self) -> Result<String, RecorderError> {
        let mut lines = Vec::with_capacity(self.nodes.len() + 1);
        let entries = std::iter::once(TranscriptEntry::Header(self.header.clone()))
            .chain(self.nodes.iter().cloned().map(TranscriptEntry::Node));
        for entry in entries {
            let line = serde_json::to_string(&entry)
                .map_err(|e| RecorderError::Transcript(e.to_string()))?;
            lines.push(line);
        }
        Ok(lines.join("\n") + "\n")
    }

    pub fn from_jsonl(raw: &str) -> Result<Self, RecorderError> {
        let mut header: Option<TranscriptHeader> = None;
        let mut nodes = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: TranscriptEntry = serde_json::from_str(line).map_err(|e| {
                RecorderError::Transcript(format!("transcript line {}: {e}", idx + 1))
            })?;
            match entry {
                TranscriptEntry::Header(h) => header = Some(h),
                TranscriptEntry::Node(node) => nodes.push(node),
            }
        }
        let header = header.ok_or_else(|| {
            RecorderError::Transcript("transcript has no header entry".to_string())
        })?;
        if header.node_count != nodes.len() {
            return Err(RecorderError::Transcript(format!(
                "header announces {} nodes but {} were found",
                header.node_count,
                nodes.len()
            )));
        }
        Ok(Self { header, nodes })
    }

    pub fn write(&self, path: &Path, fs: &dyn FileSystem) -> Result<(), RecorderError> {
        if let Some(parent) = path.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.write_string(path, &self.to_jsonl()?)
    }

    pub fn load(path: &Path, fs: &dyn FileSystem) -> Result<Self, RecorderError> {
        Self::from_jsonl(&fs.read_to_string(path)?)
    }
}

impl<M: MockPrimitive> Recorder<M> {
    pub fn transcript(&self) -> Transcript {
        let nodes: Vec<NodeSnapshot> = self
            .walk()
            .into_iter()
            .map(|node| {
                let pending = node
                    .pending_calls()
                    .iter()
                    .zip(node.pending_signatures())
                    .map(|(call, signature)| CallRecord::from_call(signature, call))
                    .collect();
                NodeSnapshot {
                    path: node.name(),
                    mode: node.mode(),
                    pending,
                }
            })
            .collect();
        Transcript {
            header: TranscriptHeader {
                root: self.name(),
                node_count: nodes.len(),
                recorder_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            nodes,
        }
    }
}
