use std::fs;

use aid_conversation::Message;
use aid_llm::Usage;
use aid_tool::FunctionSchema;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::trace;

use crate::error::Result;

/// Everything that went into and came out of one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepRecord {
    /// The messages sent to the provider, starting with the system prompt.
    pub sent: Vec<Message>,

    /// The assistant message, as far as it was received.
    pub received: Option<Message>,

    pub tool_results: Vec<Message>,
    pub tools: Vec<FunctionSchema>,
    pub usage: Usage,

    /// Why the step failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Receives a record of every step, including failed ones.
pub trait Snapshot: Send + Sync {
    fn write(&self, record: &StepRecord) -> Result<()>;
}

/// Writes the latest step to a YAML file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct YamlSnapshot {
    path: Utf8PathBuf,
}

impl YamlSnapshot {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Snapshot for YamlSnapshot {
    fn write(&self, record: &StepRecord) -> Result<()> {
        let yaml = serde_yaml::to_string(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, yaml)?;
        trace!(path = %self.path, "Wrote step snapshot.");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aid_conversation::Role;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_yaml_snapshot_creates_parent_dirs() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("debug").join("step.yaml");
        let snapshot = YamlSnapshot::new(path.clone());

        let record = StepRecord {
            sent: vec![Message::system("Be nice."), Message::user("hi")],
            received: Some(Message::assistant()),
            usage: Usage::new(3, 1),
            error: Some("API error (500): boom".to_owned()),
            ..Default::default()
        };

        snapshot.write(&record).unwrap();

        let yaml: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(yaml["sent"][0]["role"].as_str(), Some("system"));
        assert_eq!(yaml["sent"][1]["content"].as_str(), Some("hi"));
        assert_eq!(yaml["usage"]["input_tokens"].as_u64(), Some(3));
        assert_eq!(yaml["error"].as_str(), Some("API error (500): boom"));
        assert_eq!(record.sent[0].role, Role::System);
    }
}
