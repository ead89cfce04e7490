// API client module: a small blocking HTTP client for the Strava v3 API.
// Only the three endpoints the uploader needs are covered: creating an
// upload, reading an upload's status and looking up the current athlete.

use reqwest::blocking::{multipart, Client, ClientBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs::File;

/// Message Strava puts in the error body when the token is missing a scope
/// or is invalid.
pub const AUTHORIZATION_ERROR: &str = "Authorization Error";

/// Errors returned by the remote API or while talking to it.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service rejected the credential (bad token or missing scope).
    #[error("Authorization failed: {0}")]
    Authorization(String),
    /// Any other non-success response.
    #[error("Request failed: {status} - {message}")]
    Http { status: StatusCode, message: String },
    /// The request never got a response.
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not the JSON we expected.
    #[error("Failed to parse response json: {0}")]
    Decode(#[from] serde_json::Error),
    /// The token cannot be put in an HTTP header.
    #[error("Access token contains invalid header characters")]
    InvalidToken,
}

impl ApiError {
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }
}

/// One entry of the `errors` array in a Strava fault body.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Fault {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub code: String,
}

/// Error body returned by the API on non-success responses.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<Fault>,
}

/// Build the error for a failed response. A 401, or a body whose message is
/// `Authorization Error`, becomes [`ApiError::Authorization`].
pub fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = match &parsed {
        Some(b) if !b.message.is_empty() => {
            let details: Vec<String> = b
                .errors
                .iter()
                .map(|f| format!("{} {} {}", f.resource, f.field, f.code))
                .collect();
            if details.is_empty() {
                b.message.clone()
            } else {
                format!("{} ({})", b.message, details.join(", "))
            }
        }
        _ => body.trim().to_string(),
    };
    let is_auth = parsed.as_ref().map(|b| b.message.as_str()) == Some(AUTHORIZATION_ERROR);
    if is_auth || status == StatusCode::UNAUTHORIZED {
        ApiError::Authorization(message)
    } else {
        ApiError::Http { status, message }
    }
}

/// Format tag sent as `data_type`. The same string, prefixed with a dot, is
/// the file-name suffix of matching activity files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FileDataType {
    Fit,
    #[value(name = "fit.gz")]
    FitGz,
    #[default]
    Tcx,
    #[value(name = "tcx.gz")]
    TcxGz,
    Gpx,
    #[value(name = "gpx.gz")]
    GpxGz,
}

impl FileDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::FitGz => "fit.gz",
            Self::Tcx => "tcx",
            Self::TcxGz => "tcx.gz",
            Self::Gpx => "gpx",
            Self::GpxGz => "gpx.gz",
        }
    }

    /// File-name suffix including the leading dot, e.g. `.tcx`.
    pub fn extension(self) -> String {
        format!(".{}", self.as_str())
    }
}

/// Parameters of a new upload besides the file content itself.
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub data_type: FileDataType,
    /// Label of the upload on the remote side; the file's base name.
    pub name: &'a str,
    pub private: bool,
}

/// Acknowledgement returned when an upload is accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub id: i64,
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Polled status of an upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadSummary {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub activity_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Processing,
    Ready(i64),
    Failed(String),
}

impl UploadSummary {
    pub fn state(&self) -> UploadState {
        match (&self.error, self.activity_id) {
            (Some(e), _) if !e.is_empty() => UploadState::Failed(e.clone()),
            (_, Some(activity_id)) => UploadState::Ready(activity_id),
            _ => UploadState::Processing,
        }
    }
}

/// The authenticated athlete, as returned by `GET /athlete`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Athlete {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Upload submission and status lookup.
pub trait UploadApi {
    fn create_upload(&self, req: &UploadRequest<'_>, file: File) -> Result<UploadRecord, ApiError>;
    fn get_upload(&self, id: i64) -> Result<UploadSummary, ApiError>;
}

/// Current-account lookup.
pub trait AthleteApi {
    fn current_athlete(&self) -> Result<Athlete, ApiError>;
}

/// Blocking client bound to one access token for its whole lifetime.
#[derive(Clone)]
pub struct StravaClient {
    client: Client,
    base_url: String,
}

impl StravaClient {
    /// Build a client for `base_url` (e.g. `https://www.strava.com/api/v3`)
    /// sending `token` as a bearer credential on every request.
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        Self::from_builder(Client::builder(), base_url, token)
    }

    fn from_builder(builder: ClientBuilder, base_url: &str, token: &str) -> Result<Self, ApiError> {
        let client = builder.default_headers(Self::auth_headers(token)?).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn auth_headers(token: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        let mut val = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn read_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T, ApiError> {
        let status = res.status();
        let txt = res.text()?;
        if !status.is_success() {
            return Err(error_from_response(status, &txt));
        }
        Ok(serde_json::from_str(&txt)?)
    }
}

/// Handle for the `/uploads` endpoints.
#[derive(Clone)]
pub struct UploadsService {
    client: StravaClient,
}

impl UploadsService {
    pub fn new(client: StravaClient) -> Self {
        Self { client }
    }
}

impl UploadApi for UploadsService {
    /// POST the file as multipart/form-data. Returns once the service has
    /// acknowledged receipt, not when processing is done.
    fn create_upload(&self, req: &UploadRequest<'_>, file: File) -> Result<UploadRecord, ApiError> {
        let part = match file.metadata() {
            Ok(meta) => multipart::Part::reader_with_length(file, meta.len()),
            Err(_) => multipart::Part::reader(file),
        };
        let part = part
            .file_name(req.name.to_string())
            .mime_str("application/octet-stream")?;
        let mut form = multipart::Form::new()
            .part("file", part)
            .text("data_type", req.data_type.as_str())
            .text("external_id", req.name.to_string());
        if req.private {
            form = form.text("private", "1");
        }
        let res = self
            .client
            .client
            .post(self.client.url("uploads"))
            .multipart(form)
            .send()?;
        StravaClient::read_json(res)
    }

    fn get_upload(&self, id: i64) -> Result<UploadSummary, ApiError> {
        let res = self
            .client
            .client
            .get(self.client.url(&format!("uploads/{id}")))
            .send()?;
        StravaClient::read_json(res)
    }
}

/// Handle for `/athlete`.
#[derive(Clone)]
pub struct CurrentAthleteService {
    client: StravaClient,
}

impl CurrentAthleteService {
    pub fn new(client: StravaClient) -> Self {
        Self { client }
    }
}

impl AthleteApi for CurrentAthleteService {
    fn current_athlete(&self) -> Result<Athlete, ApiError> {
        let res = self.client.client.get(self.client.url("athlete")).send()?;
        StravaClient::read_json(res)
    }
}
