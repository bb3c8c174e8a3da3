use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::artifact::ContractArtifact;
use crate::error::{ArtifactError, ArtifactResult};
use crate::file::FileArtifactStore;
use crate::traits::validate_name;

/// Default location of Solidity sources.
pub const DEFAULT_SOURCE_DIR: &str = "contracts/sol";

/// Runs `solc --standard-json` and turns its output into artifacts.
#[derive(Clone, Debug)]
pub struct SolcCompiler {
    binary: PathBuf,
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self::new("solc")
    }
}

impl SolcCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    /// Standard-JSON input compiling a single source unit.
    pub fn standard_input(source_path: &str, content: &str) -> Value {
        json!({
            "language": "Solidity",
            "sources": {
                source_path: { "content": content }
            },
            "settings": {
                "outputSelection": {
                    "*": {
                        "*": ["metadata", "evm.bytecode", "evm.bytecode.sourceMap"]
                    }
                }
            }
        })
    }

    /// Compile `<source_dir>/<name>.sol` and return solc's raw output.
    pub fn compile(&self, source_dir: &Path, name: &str) -> ArtifactResult<Value> {
        let name = validate_name(name)?;
        let source = source_dir.join(format!("{name}.sol"));
        let content = std::fs::read_to_string(&source)?;
        let input = Self::standard_input(&source.to_string_lossy(), &content);

        debug!(binary = %self.binary.display(), source = %source.display(), "invoking solc");
        let mut child = Command::new(&self.binary)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ArtifactError::Compiler(format!("cannot run {}: {e}", self.binary.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.to_string().as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ArtifactError::Compiler(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let document: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ArtifactError::Compiler(format!("unreadable solc output: {e}")))?;
        check_diagnostics(&document)?;
        Ok(document)
    }

    /// Compile `name`, store the raw output, and return the parsed artifact.
    pub fn compile_into(
        &self,
        source_dir: &Path,
        name: &str,
        store: &FileArtifactStore,
    ) -> ArtifactResult<(ContractArtifact, PathBuf)> {
        let document = self.compile(source_dir, name)?;
        let artifact = ContractArtifact::from_document(name, &document)?;
        let path = store.save_document(name, &document)?;
        info!(contract = name, path = %path.display(), bytes = artifact.bytecode.len(), "contract compiled");
        Ok((artifact, path))
    }
}

/// Fail on any error-severity diagnostic; log warnings.
fn check_diagnostics(document: &Value) -> ArtifactResult<()> {
    let Some(errors) = document.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    let mut failures = Vec::new();
    for diagnostic in errors {
        let message = diagnostic
            .get("formattedMessage")
            .or_else(|| diagnostic.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown diagnostic")
            .trim();
        match diagnostic.get("severity").and_then(Value::as_str) {
            Some("error") => failures.push(message.to_string()),
            _ => warn!(diagnostic = message, "solc"),
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ArtifactError::Compiler(failures.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_input_selects_outputs() {
        let input = SolcCompiler::standard_input("contracts/sol/Validator.sol", "contract Validator {}");
        assert_eq!(input["language"], "Solidity");
        assert_eq!(
            input["sources"]["contracts/sol/Validator.sol"]["content"],
            "contract Validator {}"
        );
        let selection = &input["settings"]["outputSelection"]["*"]["*"];
        assert_eq!(selection, &json!(["metadata", "evm.bytecode", "evm.bytecode.sourceMap"]));
    }

    #[test]
    fn error_diagnostics_fail() {
        let doc = json!({"errors": [
            {"severity": "warning", "message": "unused variable"},
            {"severity": "error", "formattedMessage": "ParserError: expected ';'"}
        ]});
        match check_diagnostics(&doc) {
            Err(ArtifactError::Compiler(msg)) => assert_eq!(msg, "ParserError: expected ';'"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn warnings_only_pass() {
        let doc = json!({"errors": [{"severity": "warning", "message": "SPDX license"}]});
        assert!(check_diagnostics(&doc).is_ok());
        assert!(check_diagnostics(&json!({"contracts": {}})).is_ok());
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SolcCompiler::default().compile(dir.path(), "Validator").unwrap_err();
        assert!(matches!(err, ArtifactError::Io(_)));
    }

    #[test]
    fn missing_compiler_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Validator.sol"), "contract Validator {}").unwrap();
        let compiler = SolcCompiler::new(dir.path().join("no-such-solc"));
        assert!(matches!(
            compiler.compile(dir.path(), "Validator"),
            Err(ArtifactError::Compiler(_))
        ));
    }
}
