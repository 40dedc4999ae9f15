//! One-shot flash messages carried in the session.

use tower_sessions::Session;

const FLASH_KEY: &str = "flash";

/// Queue a message for the next full-page render.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    let message = message.into();
    if let Err(e) = session.insert(FLASH_KEY, &message).await {
        tracing::debug!(error = %e, "failed to store flash message");
    }
}

/// Take the pending message, clearing it from the session.
pub async fn take_flash(session: &Session) -> Option<String> {
    match session.remove::<String>(FLASH_KEY).await {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read flash message");
            None
        }
    }
}
