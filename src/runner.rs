use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::mapping::{self, FieldMapping, MappingError};
use crate::normalize::{self, RecommendationResponse};
use crate::render::chart::{ChartBackend, NoChart};
use crate::render::{Outcome, Renderer, Settled, StateKind, SubmitRejected, Surface};
use crate::request::{self, FormSource, FormValues, RequestError};
use crate::transport::{ClientBuildError, HttpOptions, HttpTransport, Transport};

#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: String,
    pub deployment: String,
    pub custom_deployments: Vec<FieldMapping>,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub api_key: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            deployment: mapping::DEFAULT_DEPLOYMENT.to_string(),
            custom_deployments: Vec::new(),
            timeout_seconds: crate::transport::DEFAULT_TIMEOUT_SECONDS,
            proxy: None,
            header: None,
            api_key: None,
        }
    }
}

impl Options {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            base_url: self.base_url.clone(),
            timeout_seconds: self.timeout_seconds,
            proxy: self.proxy.clone(),
            header: self.header.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn resolve_mapping(&self) -> Result<FieldMapping, MappingError> {
        mapping::resolve(&self.deployment, &self.custom_deployments)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Client(#[from] ClientBuildError),

    #[error(transparent)]
    Input(#[from] RequestError),

    #[error(transparent)]
    Busy(#[from] SubmitRejected),
}

#[derive(Clone, Debug)]
pub struct SubmitReport {
    pub state: StateKind,
    pub request: Value,
    pub response: Option<RecommendationResponse>,
    pub failure: Option<String>,
    pub stale: bool,
}

/// One form bound to one backend deployment. `submit` is the submit-handler
/// boundary: transport and response-shape failures end up on the surface
/// as a notice and never come back as `Err`.
pub struct Session<T: Transport, S: Surface, B: ChartBackend = NoChart> {
    transport: T,
    mapping: FieldMapping,
    renderer: Renderer<S, B>,
}

impl<S: Surface> Session<HttpTransport, S, NoChart> {
    pub fn connect(options: &Options, surface: S) -> Result<Self, SessionError> {
        let mapping = options.resolve_mapping()?;
        let transport = HttpTransport::new(&options.http_options())?;
        let renderer = Renderer::new(surface, mapping.display.clone());
        Ok(Session::new(transport, mapping, renderer))
    }
}

impl<S: Surface, B: ChartBackend> Session<HttpTransport, S, B> {
    pub fn connect_with_chart(
        options: &Options,
        surface: S,
        backend: B,
    ) -> Result<Self, SessionError> {
        let mapping = options.resolve_mapping()?;
        let transport = HttpTransport::new(&options.http_options())?;
        let renderer = Renderer::with_chart(surface, mapping.display.clone(), backend);
        Ok(Session::new(transport, mapping, renderer))
    }
}

impl<T: Transport, S: Surface, B: ChartBackend> Session<T, S, B> {
    pub fn new(transport: T, mapping: FieldMapping, renderer: Renderer<S, B>) -> Self {
        Self {
            transport,
            mapping,
            renderer,
        }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn renderer(&self) -> &Renderer<S, B> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<S, B> {
        &mut self.renderer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn reset(&mut self, form: &mut FormValues) {
        form.clear();
        self.renderer.reset();
    }

    async fn fetch(&self, body: &Value) -> Result<RecommendationResponse, String> {
        let raw = self
            .transport
            .post_json(&self.mapping.endpoint, body)
            .await
            .map_err(|e| {
                warn!(error = %e, "recommendation request failed");
                if e.is_unreachable() {
                    format!("Failed to connect to the recommendation server: {e}")
                } else {
                    format!("The recommendation server could not answer: {e}")
                }
            })?;
        normalize::normalize(&raw, &self.mapping.response).map_err(|e| {
            warn!(error = %e, "unexpected response shape");
            format!("The recommendation server sent an unexpected response: {e}")
        })
    }

    pub async fn submit(&mut self, form: &impl FormSource) -> Result<SubmitReport, SessionError> {
        let request = request::build_request(&self.mapping, form)?;
        let body = request.to_json();
        let token = self.renderer.begin_submit()?;
        info!(
            deployment = %self.mapping.name,
            token = token.value(),
            fields = request.len(),
            "submitting"
        );

        let (outcome, response, failure) = match self.fetch(&body).await {
            Ok(resp) => (Outcome::Response(resp.clone()), Some(resp), None),
            Err(message) => (
                Outcome::Failed {
                    message: message.clone(),
                },
                None,
                Some(message),
            ),
        };

        let settled = self.renderer.settle(token, outcome);
        let (state, stale) = match settled {
            Settled::Applied(kind) => (kind, false),
            Settled::Stale => (self.renderer.state().kind(), true),
        };
        info!(state = ?state, "settled");
        Ok(SubmitReport {
            state,
            request: body,
            response,
            failure,
            stale,
        })
    }
}
