use serde::Serialize;

/// JSON bodies the demo agent publishes.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum KafkaPayload {
    AgentStarted { agent: String, plugin: String },
    AgentStopping { agent: String, plugin: String },
}

impl KafkaPayload {
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
