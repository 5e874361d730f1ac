//! JSON shapes of the compiler collaborator's output.
//!
//! The core does not invoke the compiler; it only deserializes whatever the
//! (out-of-scope) compiler-invocation layer hands it. These types are
//! intentionally narrower than a full `solc` "standard JSON" output — they
//! carry exactly the fields this crate's algorithms consume, `#[serde(default)]`
//! or otherwise tolerant of the rest.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level compiler output document.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerOutput {
    /// Keyed by `"<file>:<ContractName>"`.
    pub contracts: BTreeMap<String, ContractArtifact>,
    /// Source files in file-index order; the source map's `file_index`
    /// field indexes into this list.
    #[serde(rename = "sourceList")]
    pub source_list: Vec<String>,
    /// Keyed by source file path.
    pub sources: BTreeMap<String, SourceArtifact>,
}

/// The subset of a contract's compiler artifact this crate needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// The decompressible, semicolon-delimited runtime source map.
    #[serde(rename = "srcmap-runtime")]
    pub srcmap_runtime: String,
    /// `0x`-prefixed runtime bytecode, metadata tail included.
    #[serde(rename = "bin-runtime")]
    pub bin_runtime: String,
}

/// A single source file's compiler output.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceArtifact {
    #[serde(rename = "AST")]
    pub ast: JsonAstNode,
}

/// One node of the compiler's JSON AST. Additional fields beyond `id`,
/// `src`, and `children` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonAstNode {
    pub id: u64,
    /// `"offset:length:fileIndex"`.
    pub src: String,
    #[serde(default)]
    pub children: Vec<JsonAstNode>,
}

/// A single per-transaction trace, as handed over by the (out-of-scope)
/// trace collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    /// `0x`-prefixed runtime bytecode of the called contract.
    pub code: String,
    /// Program counters visited during execution, in order.
    pub ops: Vec<TraceOp>,
}

/// A single visited program counter within a [`Trace`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TraceOp {
    pub pc: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_compiler_output() {
        let json = r#"{
            "contracts": {
                "a.sol:A": { "srcmap-runtime": "0:1:0:-", "bin-runtime": "0x00" }
            },
            "sourceList": ["a.sol"],
            "sources": {
                "a.sol": { "AST": { "id": 1, "src": "0:10:0", "children": [] } }
            }
        }"#;
        let parsed: CompilerOutput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.source_list, vec!["a.sol".to_string()]);
        assert_eq!(parsed.contracts["a.sol:A"].bin_runtime, "0x00");
        assert_eq!(parsed.sources["a.sol"].ast.id, 1);
    }

    #[test]
    fn ast_children_default_to_empty() {
        let json = r#"{ "id": 1, "src": "0:1:0" }"#;
        let node: JsonAstNode = serde_json::from_str(json).unwrap();
        assert!(node.children.is_empty());
    }
}
