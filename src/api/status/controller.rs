use super::{StatusState, service};
use crate::shared::error::handlers::handle_rejection;
use warp::Filter;

fn with_state(
    state: StatusState,
) -> impl Filter<Extract = (StatusState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn status_routes(state: StatusState) -> warp::filters::BoxedFilter<(impl warp::Reply,)> {
    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(service::health);

    let flags = warp::path!("flags")
        .and(warp::get())
        .and(with_state(state))
        .and_then(service::flags);

    health
        .or(flags)
        .recover(handle_rejection)
        .with(warp::log("status"))
        .boxed()
}
