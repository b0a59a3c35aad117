//! PlantUML server client.
//!
//! Diagram text travels in the URL: raw deflate, then base64 over the
//! PlantUML alphabet (`0-9A-Za-z-_`). Padding is kept.

use base64::Engine;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, general_purpose};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::ToolError;

const PLANTUML_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Checked at compile time.
const PLANTUML_ENGINE: GeneralPurpose = match Alphabet::new(PLANTUML_ALPHABET) {
    Ok(alphabet) => GeneralPurpose::new(&alphabet, general_purpose::PAD),
    Err(_) => panic!("invalid PlantUML alphabet"),
};

/// Timeout for the availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Output formats the server renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// SVG image.
    Svg,
    /// ASCII art.
    Txt,
    /// Preprocessed source. Used to surface syntax errors.
    Preproc,
}

impl ExportFormat {
    /// URL path segment for this format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Txt => "txt",
            Self::Preproc => "preproc",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ToolError;

    /// Parses the formats offered to the agent. `preproc` is internal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "txt" => Ok(Self::Txt),
            other => Err(ToolError::InvalidArguments(format!(
                "unsupported export format '{other}', expected png, svg or txt"
            ))),
        }
    }
}

/// Compress and encode diagram text for a PlantUML URL.
///
/// # Errors
///
/// Returns an error if compression fails.
pub fn encode(text: &str) -> Result<String, ToolError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(PLANTUML_ENGINE.encode(compressed))
}

/// Client for one PlantUML server.
#[derive(Debug, Clone)]
pub struct PlantUmlClient {
    server_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl PlantUmlClient {
    /// Create a client. A trailing `/` on `server_url` is ignored.
    #[must_use]
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            server_url,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    /// URL that renders `text` in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be encoded.
    pub fn url_for(&self, text: &str, format: ExportFormat) -> Result<String, ToolError> {
        Ok(format!("{}/{format}/{}", self.server_url, encode(text)?))
    }

    /// Render `text` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Http`] carrying the response body for a non-200
    /// status, or the transport error if the server could not be reached.
    /// A request that outlives the timeout is [`ToolError::Timeout`].
    pub async fn render(&self, text: &str, format: ExportFormat) -> Result<Vec<u8>, ToolError> {
        let url = self.url_for(text, format)?;
        debug!(format = %format, bytes = text.len(), "Rendering diagram");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if status == reqwest::StatusCode::OK {
            Ok(body.to_vec())
        } else {
            debug!(status = %status, "PlantUML server returned an error");
            Err(ToolError::Http(String::from_utf8_lossy(&body).into_owned()))
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> ToolError {
        if e.is_timeout() {
            let ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ToolError::Timeout(ms)
        } else {
            ToolError::Http(format!("Requests failed with error: {e}"))
        }
    }

    /// Render `text` and decode the body as UTF-8.
    ///
    /// # Errors
    ///
    /// Same as [`PlantUmlClient::render`], plus a failure for non-UTF-8
    /// output (use [`PlantUmlClient::render`] for PNG).
    pub async fn render_text(&self, text: &str, format: ExportFormat) -> Result<String, ToolError> {
        let body = self.render(text, format).await?;
        String::from_utf8(body)
            .map_err(|_| ToolError::ExecutionFailed(format!("{format} output is not valid UTF-8")))
    }

    /// Check if the server answers at its base URL.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/", self.server_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "PlantUML server unreachable");
                false
            },
        }
    }
}
