use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, Url};
use scout_core::{JobId, SearchQuery};
use scout_logging::{scout_debug, scout_info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::filename::content_disposition_filename;
use crate::sse::SseDecoder;
use crate::{ApiError, Artifact, AuthSession, Credentials, Registration};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Bounds every request except the progress stream.
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("downloads"),
        }
    }
}

/// In-order stream payloads; ends after the first error.
pub type PayloadStream = BoxStream<'static, Result<String, ApiError>>;

#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn submit_job(&self, query: &SearchQuery) -> Result<JobId, ApiError>;

    async fn open_progress_stream(&self, job_id: &JobId) -> Result<PayloadStream, ApiError>;

    async fn download_artifact(&self, job_id: &JobId) -> Result<Artifact, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    termo: &'a str,
    cidade: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(alias = "jobId")]
    job_id: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
    username: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// HTTP client for the scraper server's `/api` routes.
///
/// Once a login or registration succeeds, its bearer token rides along on
/// every later request.
#[derive(Debug)]
pub struct ReqwestJobApi {
    base_url: Url,
    client: reqwest::Client,
    stream_client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl ReqwestJobApi {
    pub fn new(settings: &EngineSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;
        // The stream lives as long as the job, so only connecting is bounded.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            base_url,
            client,
            stream_client,
            token: RwLock::new(None),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<Bytes, ApiError> {
        let payload =
            serde_json::to_vec(body).map_err(|err| ApiError::InvalidBody(err.to_string()))?;
        let response = self
            .authorize(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response.bytes().await.map_err(map_reqwest_error)
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["api", route])?;
        let body = self.post_json(url, body).await?;
        let response: AuthResponse = parse_body(&body)?;
        self.set_token(Some(response.token.clone()));
        scout_info!("Authenticated as {}", response.username);
        Ok(AuthSession {
            token: response.token,
            username: response.username,
        })
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn submit_job(&self, query: &SearchQuery) -> Result<JobId, ApiError> {
        let url = self.endpoint(&["api", "search"])?;
        let body = self
            .post_json(
                url,
                &SubmitRequest {
                    termo: &query.term,
                    cidade: &query.city,
                },
            )
            .await?;
        let response: SubmitResponse = parse_body(&body)?;
        if response.job_id.is_empty() {
            return Err(ApiError::InvalidBody("empty job id".to_string()));
        }
        Ok(JobId::new(response.job_id))
    }

    async fn open_progress_stream(&self, job_id: &JobId) -> Result<PayloadStream, ApiError> {
        let url = self.endpoint(&["api", "progress", job_id.as_str()])?;
        let response = self
            .authorize(self.stream_client.get(url))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        scout_debug!("Progress stream opened for job {}", job_id);

        let chunks = response.bytes_stream().boxed();
        let state = (chunks, SseDecoder::new(), VecDeque::new(), false);
        let payloads = stream::unfold(
            state,
            |(mut chunks, mut decoder, mut pending, mut finished)| async move {
                loop {
                    if let Some(data) = pending.pop_front() {
                        return Some((Ok(data), (chunks, decoder, pending, finished)));
                    }
                    if finished {
                        return None;
                    }
                    match chunks.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                        Some(Err(err)) => {
                            return Some((
                                Err(map_reqwest_error(err)),
                                (chunks, decoder, pending, true),
                            ));
                        }
                        None => finished = true,
                    }
                }
            },
        );
        Ok(payloads.boxed())
    }

    async fn download_artifact(&self, job_id: &JobId) -> Result<Artifact, ApiError> {
        let url = self.endpoint(&["api", "download", job_id.as_str()])?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(Artifact { filename, bytes })
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        self.authenticate(
            "login",
            &LoginRequest {
                email: credentials.email.trim(),
                password: &credentials.password,
            },
        )
        .await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        self.authenticate(
            "register",
            &RegisterRequest {
                name: registration.name.trim(),
                email: registration.email.trim(),
                password: &registration.password,
            },
        )
        .await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .ok()
        .and_then(|body| body.error)
        .filter(|text| !text.trim().is_empty());
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::InvalidBody(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout(err.to_string());
    }
    if err.is_builder() {
        return ApiError::InvalidUrl(err.to_string());
    }
    if err.is_decode() {
        return ApiError::InvalidBody(err.to_string());
    }
    ApiError::Network(err.to_string())
}
