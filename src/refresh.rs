//! End-to-end refresh: resolve the profile, then run the login.

use crate::executor::{CommandExecutor, SsoRefreshResult};
use crate::profile::{ProfileRequest, ProfileResolver};

pub struct SsoRefresher {
    resolver: ProfileResolver,
    executor: CommandExecutor,
    default_server: Option<String>,
}

impl SsoRefresher {
    pub fn new(resolver: ProfileResolver, executor: CommandExecutor) -> Self {
        Self {
            resolver,
            executor,
            default_server: None,
        }
    }

    pub fn system() -> Self {
        Self::new(ProfileResolver::system(), CommandExecutor::system())
    }

    /// Server name used for config lookup when a request names none.
    #[must_use]
    pub fn with_default_server(mut self, server: Option<String>) -> Self {
        self.default_server = server.filter(|s| !s.is_empty());
        self
    }

    pub fn request_for(&self, profile: Option<String>, server: Option<String>) -> ProfileRequest {
        let server = server
            .filter(|s| !s.is_empty())
            .or_else(|| self.default_server.clone());
        ProfileRequest::new(profile, server)
    }

    pub async fn refresh(&self, profile: Option<String>, server: Option<String>) -> SsoRefreshResult {
        let request = self.request_for(profile, server);
        let resolution = self.resolver.resolve(&request);
        self.executor.execute_login(&resolution).await
    }
}
