// file: src/repository/clone.rs
// description: shallow repository clones using git2
// reference: https://docs.rs/git2

use crate::error::{ConnectError, Result};
use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Username and token used for HTTPS clones.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fetches a repository into an existing, empty directory. Blocking.
pub trait Cloner: Send + Sync {
    fn clone_repository(&self, url: &str, destination: &Path, depth: u32) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct GitCloner {
    credentials: Option<Credentials>,
}

impl GitCloner {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }
}

impl Cloner for GitCloner {
    fn clone_repository(&self, url: &str, destination: &Path, depth: u32) -> Result<()> {
        info!(repository = url, "cloning repository");

        let mut callbacks = RemoteCallbacks::new();

        if let Some(credentials) = self.credentials.clone() {
            // libgit2 keeps asking while the server rejects us
            let mut attempted = false;
            callbacks.credentials(move |_url, _username, _allowed| {
                if attempted {
                    return Err(git2::Error::from_str("authentication rejected"));
                }
                attempted = true;
                Cred::userpass_plaintext(&credentials.username, &credentials.token)
            });
        }

        callbacks.transfer_progress(|stats| {
            if stats.received_objects() == stats.total_objects() {
                debug!(
                    "Resolving deltas {}/{}",
                    stats.indexed_deltas(),
                    stats.total_deltas()
                );
            } else if stats.total_objects() > 0 {
                debug!(
                    "Received {}/{} objects",
                    stats.received_objects(),
                    stats.total_objects()
                );
            }
            true
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        fetch_options.depth(depth as i32);

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, destination)
            .map_err(|e| ConnectError::Clone {
                url: url.to_string(),
                message: e.message().to_string(),
            })?;

        debug!(repository = url, path = %destination.display(), "clone complete");
        Ok(())
    }
}
