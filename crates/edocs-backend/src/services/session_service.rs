use edocs_bridge::{
    MessageFromBackend, alert::AlertLevel, connection::ConnectionState,
    notification::UnreadSnapshot, session::SessionCredentials,
};

use crate::session::Session;

/// Handles a login (see [`edocs_bridge::MessageToBackend::StartSession`]).
///
/// Replaces any active session, connects the push channel, then reconciles
/// counters and loads the notification list from the server.
pub async fn handle_start_session(
    context: super::AppContextHandle,
    credentials: SessionCredentials,
) {
    let previous = {
        let mut state = context.state.write().await;
        state.session.take()
    };
    if let Some(previous) = previous {
        log::info!("Replacing the session of user {}", previous.user_id);
        previous.shutdown().await;
    }

    let user_id = credentials.user_id;
    let started = {
        let mut state = context.state.write().await;
        state.session_generation += 1;
        match Session::start(
            state.session_generation,
            credentials,
            &state.config,
            state.request_client.clone(),
            context.tx.clone(),
        ) {
            Ok(session) => {
                state.session = Some(session);
                Ok(())
            }
            Err(e) => Err(e),
        }
    };

    if let Err(e) = started {
        log::error!("Cannot start session for user {user_id}: {e}");
        context
            .send_alert(AlertLevel::Error, format!("Cannot reach the document server: {e}"))
            .await;
        return;
    }

    context
        .send(MessageFromBackend::SessionStarted { user_id })
        .await;

    super::unread_service::handle_refresh_request(context.clone()).await;
    super::unread_service::handle_load_notifications_request(context).await;
}

/// Handles a logout (see [`edocs_bridge::MessageToBackend::EndSession`]).
/// Does nothing when no session is active.
pub async fn handle_end_session(context: super::AppContextHandle) {
    let session = {
        let mut state = context.state.write().await;
        state.session.take()
    };
    let Some(session) = session else {
        return;
    };

    session.shutdown().await;

    context
        .send(MessageFromBackend::ConnectionStateChanged(
            ConnectionState::Disconnected,
        ))
        .await;
    context
        .send(MessageFromBackend::UnreadStateChanged(
            UnreadSnapshot::default(),
        ))
        .await;
    context.send(MessageFromBackend::SessionEnded).await;
}
