//! HTTP adapter onto the call platform

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::PlatformConfig;
use crate::domain::call::entity::CalleeInfo;
use crate::domain::call::platform::CallPlatform;
use crate::domain::call::value_object::CallTarget;
use crate::domain::shared::error::{DomainError, RemoteCommand};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, TenantId};

use super::wire::{
    CallSource, CreateCallRequest, CreateCallResponse, DirectoryUser, PlayPromptRequest,
    SubscribeToneRequest, TokenRequest, TokenResponse,
};

/// Refresh a cached token once it has less lifetime left than this
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn usable_at(&self, now: Instant) -> bool {
        self.expires_at.saturating_duration_since(now) > TOKEN_SLACK
    }
}

/// Talks to the communications platform over its REST surface.
///
/// Tokens are client-credentials grants scoped per tenant and cached
/// until shortly before expiry. Placement and directory lookups use the
/// target tenant's token; commands on live calls run under the home
/// service tenant.
pub struct HttpCallPlatform {
    client: Client,
    config: PlatformConfig,
    tokens: RwLock<HashMap<TenantId, CachedToken>>,
}

impl HttpCallPlatform {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch or reuse the bearer token for `tenant`
    async fn token(&self, tenant: &TenantId, command: RemoteCommand) -> Result<String> {
        {
            let cache = self.tokens.read().await;
            if let Some(cached) = cache.get(tenant) {
                if cached.usable_at(Instant::now()) {
                    return Ok(cached.token.clone());
                }
            }
        }

        let url = self.config.auth_base.replace("{tenant}", tenant.as_str());
        let form = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            scope: &self.config.token_scope,
        };

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| remote_failure(command, format!("token request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(remote_failure(
                command,
                format!("token endpoint returned {}: {}", status, body),
            ));
        }

        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| remote_failure(command, format!("token response: {}", e)))?;

        let expires_at = Instant::now() + Duration::from_secs(grant.expires_in);
        self.tokens.write().await.insert(
            tenant.clone(),
            CachedToken {
                token: grant.access_token.clone(),
                expires_at,
            },
        );
        debug!(tenant = %tenant, "refreshed platform token");

        Ok(grant.access_token)
    }

    /// Token for commands addressed to a live call rather than a tenant
    async fn service_token(&self, command: RemoteCommand) -> Result<String> {
        let tenant = TenantId::new(self.config.service_tenant.clone());
        self.token(&tenant, command).await
    }

    /// Send a prepared request and fail on non-success statuses
    async fn execute(
        &self,
        command: RemoteCommand,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| remote_failure(command, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(remote_failure(command, format!("{}: {}", status, body)));
        }

        Ok(response)
    }
}

fn remote_failure(command: RemoteCommand, detail: impl Into<String>) -> DomainError {
    DomainError::RemoteCommandFailure {
        command,
        detail: detail.into(),
    }
}

#[async_trait::async_trait]
impl CallPlatform for HttpCallPlatform {
    async fn lookup_callee(&self, target: &CallTarget, tenant: &TenantId) -> Result<CalleeInfo> {
        match target {
            // PSTN numbers have no directory record; announce the number itself
            CallTarget::Phone { number } => Ok(CalleeInfo::new(number.clone())),
            CallTarget::User { id } => {
                let token = self.token(tenant, RemoteCommand::DirectoryLookup).await?;
                let url = format!("{}/users/{}", self.config.api_base, id);
                let response = self
                    .execute(
                        RemoteCommand::DirectoryLookup,
                        self.client.get(&url).bearer_auth(token),
                    )
                    .await?;
                let user: DirectoryUser = response.json().await.map_err(|e| {
                    remote_failure(RemoteCommand::DirectoryLookup, format!("user record: {}", e))
                })?;
                Ok(CalleeInfo::new(user.display_name))
            }
        }
    }

    async fn place_call(
        &self,
        target: &CallTarget,
        tenant: &TenantId,
        prompt_url: &str,
    ) -> Result<CallId> {
        let token = self.token(tenant, RemoteCommand::PlaceCall).await?;

        let caller_id = match target {
            CallTarget::Phone { .. } => Some(self.config.pstn_caller_id.clone()),
            CallTarget::User { .. } => None,
        };
        let body = CreateCallRequest {
            source: CallSource {
                display_name: self.config.display_name.clone(),
                caller_id,
            },
            target,
            tenant: tenant.as_str(),
            callback_url: &self.config.callback_url,
            prompt_url,
        };

        let url = format!("{}/calls", self.config.api_base);
        let response = self
            .execute(
                RemoteCommand::PlaceCall,
                self.client.post(&url).bearer_auth(token).json(&body),
            )
            .await?;

        let created: CreateCallResponse = response.json().await.map_err(|e| {
            remote_failure(RemoteCommand::PlaceCall, format!("placement response: {}", e))
        })?;

        Ok(CallId::new(created.id))
    }

    async fn play_prompt(
        &self,
        call_id: &CallId,
        media_url: &str,
        client_context: &str,
    ) -> Result<()> {
        let token = self.service_token(RemoteCommand::PlayPrompt).await?;
        let url = format!("{}/calls/{}/play-prompt", self.config.api_base, call_id);
        let body = PlayPromptRequest {
            media_url,
            client_context,
        };
        self.execute(
            RemoteCommand::PlayPrompt,
            self.client.post(&url).bearer_auth(token).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn subscribe_tone(&self, call_id: &CallId, client_context: &str) -> Result<()> {
        let token = self.service_token(RemoteCommand::SubscribeTone).await?;
        let url = format!("{}/calls/{}/subscribe-tone", self.config.api_base, call_id);
        let body = SubscribeToneRequest { client_context };
        self.execute(
            RemoteCommand::SubscribeTone,
            self.client.post(&url).bearer_auth(token).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn end_call(&self, call_id: &CallId) -> Result<()> {
        let token = self.service_token(RemoteCommand::EndCall).await?;
        let url = format!("{}/calls/{}", self.config.api_base, call_id);
        self.execute(
            RemoteCommand::EndCall,
            self.client.delete(&url).bearer_auth(token),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cached_token_expiry_window() {
        let cached = CachedToken {
            token: "tok".to_string(),
            expires_at: Instant::now() + Duration::from_secs(90),
        };

        assert!(cached.usable_at(Instant::now()));

        // Inside the refresh slack the token counts as stale
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!cached.usable_at(Instant::now()));
    }

    #[test]
    fn test_tenant_substitution_in_auth_url() {
        let template = "https://login.example.com/{tenant}/oauth2/token";
        let url = template.replace("{tenant}", "acme");
        assert_eq!(url, "https://login.example.com/acme/oauth2/token");
    }
}
