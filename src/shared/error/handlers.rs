use crate::shared::error::ErrorResponse;
use std::convert::Infallible;
use tracing::warn;
use warp::{Rejection, Reply, http::StatusCode, reject::MethodNotAllowed};

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message, code_str) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "Resource not found".to_string(),
            "NOT_FOUND",
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
            "METHOD_NOT_ALLOWED",
        )
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
            "INTERNAL",
        )
    };

    let json = warp::reply::json(&ErrorResponse {
        message,
        code: Some(code_str.to_string()),
        status: code.as_u16(),
    });

    Ok(warp::reply::with_status(json, code))
}
