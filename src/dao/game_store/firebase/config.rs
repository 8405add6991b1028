use super::error::{FirebaseError, FirebaseResult};

/// Location of the game document path inside the database when none is configured.
const DEFAULT_PATH: &str = "game";

/// Runtime configuration describing how to reach the Firebase Realtime Database.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub database_url: String,
    pub path: String,
    pub auth: Option<String>,
}

impl FirebaseConfig {
    /// Construct a configuration from an explicit database URL and document path.
    pub fn new(database_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            path: path.into(),
            auth: None,
        }
    }

    /// Attach a database secret or ID token sent as the `auth` query parameter.
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> FirebaseResult<Self> {
        let database_url = std::env::var("FIREBASE_DATABASE_URL").map_err(|_| {
            FirebaseError::MissingEnvVar {
                var: "FIREBASE_DATABASE_URL",
            }
        })?;
        let path = std::env::var("FIREBASE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let mut config = Self::new(database_url, path);
        if let Some(auth) = std::env::var("FIREBASE_AUTH")
            .ok()
            .filter(|value| !value.is_empty())
        {
            config = config.with_auth(auth);
        }

        Ok(config)
    }

    /// REST endpoint of the game document, e.g. `https://x.firebaseio.com/game.json`.
    pub fn document_url(&self) -> String {
        format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            self.path.trim_matches('/')
        )
    }
}
