#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum KafkaTopic {
    #[default]
    AgentLifecycle,
    Custom(String),
}

impl KafkaTopic {
    pub fn as_str(&self) -> &str {
        match self {
            KafkaTopic::AgentLifecycle => "agent-lifecycle",
            KafkaTopic::Custom(val) => val,
        }
    }
}
