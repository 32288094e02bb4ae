use crate::error::Result;
use crate::AppState;
use async_stream::stream;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;
use sse::{ChannelSink, ConnectionId};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Opens a long-lived event stream for one browser.
///
/// The client is registered before the response is returned. Its stream only
/// ever carries `data: reload\n\n` frames and stays open until the client
/// disconnects or the broker drops the registration.
pub(crate) async fn subscribe(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(app_state): State<AppState>,
) -> Result<Response> {
    let connection_id = ConnectionId::from(peer);
    debug!("Establishing SSE connection for {connection_id}");

    let (sink, mut rx) = ChannelSink::channel();
    let subscription = app_state.broker.register(connection_id, sink)?;

    // The sender lives inside the body stream, so it is dropped together with
    // the response body when the transport gives up on the client.
    let (disconnect_tx, disconnect_rx) = oneshot::channel::<()>();
    tokio::spawn(subscription.hold(async move {
        let _ = disconnect_rx.await;
    }));

    let stream = stream! {
        let _disconnect = disconnect_tx;
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(chunk);
        }
    };

    Ok((
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Pushes a reload event to every connected browser.
pub(crate) async fn reload(State(app_state): State<AppState>) -> impl IntoResponse {
    debug!(
        "Reload requested, notifying {} connection(s)",
        app_state.broker.connection_count()
    );
    app_state.broker.broadcast();

    StatusCode::OK
}
