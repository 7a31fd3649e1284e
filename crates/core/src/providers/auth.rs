use std::sync::RwLock;

use crate::errors::CoreError;

/// Holder of the session token used for authenticated requests.
///
/// The app persists tokens elsewhere (secure storage); the client only needs
/// to read the current one and drop it when the backend says it has expired.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;

    fn set_token(&self, token: Option<String>);

    fn clear(&self) {
        self.set_token(None);
    }
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

/// Body fragments that mark a 403 as an expired session rather than a
/// plain permission error.
const EXPIRED_MARKERS: [&str; 4] = ["expired", "invalid token", "jwt", "unauthorized"];

/// Map a response status (and its body, for 403s) to success or an error.
///
/// - 2xx → `Ok(())`
/// - 401, or 403 mentioning an expired/invalid token → `SessionExpired`
/// - anything else → `Api` with the status and a trimmed body
pub fn check_response(provider: &str, status: u16, body: &str) -> Result<(), CoreError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    if status == 401 {
        return Err(CoreError::SessionExpired);
    }

    if status == 403 {
        let lower = body.to_lowercase();
        if EXPIRED_MARKERS.iter().any(|m| lower.contains(m)) {
            return Err(CoreError::SessionExpired);
        }
    }

    let snippet: String = body.trim().chars().take(200).collect();
    Err(CoreError::Api {
        provider: provider.to_string(),
        message: if snippet.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {snippet}")
        },
    })
}
