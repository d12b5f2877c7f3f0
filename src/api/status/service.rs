use warp::{Rejection, Reply};

use super::StatusState;
use super::dto::{HealthResponse, ProducerState};

pub fn producer_state(state: &StatusState) -> ProducerState {
    match state.producer.read().as_ref() {
        None => ProducerState::Disabled,
        Some(producer) if producer.is_closed() => ProducerState::Closed,
        Some(_) => ProducerState::Open,
    }
}

pub async fn health(state: StatusState) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&HealthResponse {
        status: "ok",
        producer: producer_state(&state),
    }))
}

pub async fn flags(state: StatusState) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&state.flags))
}
