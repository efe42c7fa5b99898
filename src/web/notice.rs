use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::Error;

const NOTICE_KEY: &str = "notice";

/// Outcome of an operation, shown on the next rendered page.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Notice {
    pub ok: bool,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        Self::error(err.message())
    }
}

/// Keeps `notice` in the session until the next page takes it.
pub async fn push(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(NOTICE_KEY, notice).await {
        tracing::warn!("failed to store notice: {e}");
    }
}

/// Removes the pending notice, if any.
pub async fn take(session: &Session) -> Option<Notice> {
    session.id()?;
    session.remove(NOTICE_KEY).await.unwrap_or_else(|e| {
        tracing::warn!("failed to read notice: {e}");
        None
    })
}
