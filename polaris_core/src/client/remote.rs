//! reqwest-backed implementation of [`ProposalToolApi`].

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ClientError, ClientResult, ErrorContext};
use super::proposal_tool::ProposalToolApi;
use crate::api::{
    catalog_from_wire, ErrorPayload, LoadTelescopeRequest, ObservationKeyDto,
    SaveTelescopeRequest, SavedTelescopeChoices, TelescopeNamesResponse,
    TelescopeSchemasResponse,
};
use crate::config::HttpSettings;
use crate::models::{
    AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId, ModeGradeTotal,
    ObservationConfiguration, ObservationKey, PolarisMode, TelescopeCatalog,
};

/// HTTP client for the proposal tool REST backend.
#[derive(Clone)]
pub struct HttpProposalToolApi {
    client: reqwest::Client,
    base: String,
    bearer_token: Option<String>,
}

impl HttpProposalToolApi {
    /// Build a client from the `[http]` settings.
    ///
    /// # Arguments
    /// * `settings` - base URL, API prefix, timeout and optional bearer token
    ///
    /// # Returns
    /// * `Err(ClientError::Configuration)` if the base URL is empty or the
    ///   underlying client cannot be built
    pub fn new(settings: &HttpSettings) -> ClientResult<Self> {
        let base_url = settings.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::configuration("http.base_url must not be empty"));
        }

        let prefix = settings.api_prefix.trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: format!("{}{}", base_url, prefix),
            bearer_token: settings.bearer_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Shortcut for a client against `base_url` with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> ClientResult<Self> {
        let settings = HttpSettings {
            base_url: base_url.into(),
            ..HttpSettings::default()
        };
        Self::new(&settings)
    }

    /// Full URL for an endpoint path such as `/opticalTelescopes/names`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// URL for an endpoint given as raw path segments; each segment is
    /// percent-encoded, so names may contain `/`, `?` or `#`.
    pub fn segment_url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base).map_err(|e| {
            ClientError::configuration(format!("Invalid base URL '{}': {}", self.base, e))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::configuration(format!("Base URL '{}' cannot take a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.client.request(method, self.url(path)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn transport failures and error statuses into
    /// [`ClientError`].
    async fn send(&self, builder: RequestBuilder, operation: &str) -> ClientResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from(e).with_operation(operation))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(operation, status = status.as_u16(), "backend returned an error status");
        Err(error_from_status(status, &body).with_operation(operation))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, operation: &str) -> ClientResult<T> {
        let response = self.send(self.request(Method::GET, path), operation).await?;
        read_json(response, operation).await
    }
}

/// Decode a non-success response once, here.
fn error_from_status(status: StatusCode, body: &str) -> ClientError {
    if status == StatusCode::UNAUTHORIZED {
        return ClientError::http(status.as_u16(), ErrorPayload::from_message("401, unauthorized"));
    }
    if status == StatusCode::NOT_FOUND && body.trim().is_empty() {
        return ClientError::not_found(format!("{} returned 404", status));
    }
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => ClientError::http(status.as_u16(), payload),
        Err(_) => ClientError::http(
            status.as_u16(),
            ErrorPayload::from_message(format!("Unexpected error ({})", body.trim())),
        ),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> ClientResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::from(e).with_operation(operation))?;
    serde_json::from_str(&body).map_err(|e| {
        ClientError::decode(format!("{} ({})", e, body.trim())).with_operation(operation)
    })
}

/// Empty bodies decode as `None`, mirroring endpoints that answer nothing
/// instead of 404.
async fn read_optional_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> ClientResult<Option<T>> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::from(e).with_operation(operation))?;
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ClientError::decode(format!("{} ({})", e, trimmed)).with_operation(operation))
}

/// Boolean endpoints sometimes answer with an empty body on success.
async fn read_flag(response: Response, operation: &str) -> ClientResult<bool> {
    Ok(read_optional_json::<bool>(response, operation)
        .await?
        .unwrap_or(true))
}

#[async_trait]
impl ProposalToolApi for HttpProposalToolApi {
    async fn polaris_mode(&self) -> ClientResult<PolarisMode> {
        let code: i64 = self.get_json("/polarisMode", "polaris_mode").await?;
        PolarisMode::try_from(code)
            .map_err(|e| ClientError::decode(e).with_operation("polaris_mode"))
    }

    async fn telescope_names(&self) -> ClientResult<Vec<String>> {
        let names: TelescopeNamesResponse = self
            .get_json("/opticalTelescopes/names", "telescope_names")
            .await?;
        Ok(names.into_names())
    }

    async fn telescope_schemas(&self) -> ClientResult<TelescopeCatalog> {
        let body: TelescopeSchemasResponse = self
            .get_json("/opticalTelescopes/telescopes", "telescope_schemas")
            .await?;
        let catalog = catalog_from_wire(body);
        debug!(telescopes = catalog.len(), "decoded telescope schemas");
        Ok(catalog)
    }

    async fn load_configuration(
        &self,
        key: ObservationKey,
    ) -> ClientResult<Option<ObservationConfiguration>> {
        let operation = "load_configuration";
        let body: LoadTelescopeRequest = key.into();
        let request = self
            .request(Method::POST, "/opticalTelescopes/load")
            .json(&body);
        let response = match self.send(request, operation).await {
            Ok(response) => response,
            Err(ClientError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.with_entity("observation", key)),
        };
        let saved: Option<SavedTelescopeChoices> = read_optional_json(response, operation).await?;
        Ok(saved.map(|s| s.into_configuration(key)))
    }

    async fn save_configuration(
        &self,
        configuration: &ObservationConfiguration,
    ) -> ClientResult<bool> {
        let operation = "save_configuration";
        let body = SaveTelescopeRequest::from(configuration);
        let request = self
            .request(Method::PUT, "/opticalTelescopes/save")
            .json(&body);
        let response = self
            .send(request, operation)
            .await
            .map_err(|e| e.with_entity("observation", configuration.key))?;
        read_flag(response, operation).await
    }

    async fn delete_configuration(&self, key: ObservationKey) -> ClientResult<bool> {
        let operation = "delete_configuration";
        let body = ObservationKeyDto::from(key);
        let request = self
            .request(Method::DELETE, "/opticalTelescopes/delete")
            .json(&body);
        let response = self
            .send(request, operation)
            .await
            .map_err(|e| e.with_entity("observation", key))?;
        read_flag(response, operation).await
    }

    async fn observing_time_totals(&self, cycle: CycleId) -> ClientResult<Vec<ModeGradeTotal>> {
        self.get_json(
            &format!("/proposalCycles/{}/observingTimeTotals", cycle),
            "observing_time_totals",
        )
        .await
    }

    async fn allocated_blocks(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
    ) -> ClientResult<Vec<AllocatedBlock>> {
        self.get_json(
            &format!(
                "/proposalCycles/{}/allocatedProposals/{}/allocatedBlocks",
                cycle, allocated_proposal
            ),
            "allocated_blocks",
        )
        .await
    }

    async fn update_resource_amount(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
        block: AllocatedBlockId,
        amount: f64,
    ) -> ClientResult<()> {
        let operation = "update_resource_amount";
        if !amount.is_finite() || amount < 0.0 {
            return Err(ClientError::validation_with_context(
                format!("Resource amount must be a non-negative number, got {}", amount),
                ErrorContext::new(operation).with_entity("allocated_block").with_entity_id(block),
            ));
        }
        let path = format!(
            "/proposalCycles/{}/allocatedProposals/{}/allocatedBlocks/{}/resource",
            cycle, allocated_proposal, block
        );
        let request = self
            .request(Method::PUT, &path)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(amount.to_string());
        self.send(request, operation)
            .await
            .map_err(|e| e.with_entity("allocated_block", block))?;
        Ok(())
    }

    async fn resource_remaining(&self, cycle: CycleId, resource_name: &str) -> ClientResult<f64> {
        let operation = "resource_remaining";
        let cycle = cycle.to_string();
        let url = self
            .segment_url(&[
                "proposalCycles",
                cycle.as_str(),
                "availableResources",
                resource_name,
                "remaining",
            ])
            .map_err(|e| e.with_operation(operation))?;
        let response = self
            .send(self.authorize(self.client.get(url)), operation)
            .await?;
        read_json(response, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_prefix() {
        let api = HttpProposalToolApi::with_base_url("http://localhost:8084/").unwrap();
        assert_eq!(
            api.url("/opticalTelescopes/names"),
            "http://localhost:8084/pst/api/opticalTelescopes/names"
        );
    }

    #[test]
    fn test_segment_url_encodes_reserved_characters() {
        let api = HttpProposalToolApi::with_base_url("http://localhost:8084").unwrap();
        let url = api
            .segment_url(&["proposalCycles", "1", "availableResources", "dome/time?#", "remaining"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8084/pst/api/proposalCycles/1/availableResources/dome%2Ftime%3F%23/remaining"
        );
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            HttpProposalToolApi::with_base_url(""),
            Err(ClientError::Configuration { .. })
        ));
    }

    #[test]
    fn test_error_from_status_non_json_body() {
        let err = error_from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Unexpected error (<html>boom</html>)");
    }

    #[test]
    fn test_error_from_status_unauthorized() {
        let err = error_from_status(StatusCode::UNAUTHORIZED, "{\"message\":\"nope\"}");
        assert_eq!(err.user_message(), "401, unauthorized");
    }
}
