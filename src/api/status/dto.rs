use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProducerState {
    Open,
    Closed,
    Disabled,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub producer: ProducerState,
}
