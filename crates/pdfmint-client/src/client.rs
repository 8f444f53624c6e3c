//! Main client implementation

use std::future::Future;
use std::path::{Path, PathBuf};

use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Response};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{retry, ClientError, Config, Conversion, ConvertOptions, ErrorKind, Result};

/// Pdfmint conversion client
///
/// Holds no mutable state, so one instance can serve concurrent `convert`
/// calls; each call runs its own sequential request/retry loop.
#[derive(Debug)]
pub struct PdfmintClient {
    config: Config,
    http: Client,
}

impl PdfmintClient {
    /// Create a new client with the given configuration.
    ///
    /// Fails without any network I/O when the API key is empty or
    /// whitespace-only.
    pub fn new(config: Config) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::invalid_request(
                "API key must not be empty or whitespace",
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| ClientError::invalid_request("user agent is not a valid header value"))?,
        );
        headers.insert(
            "x-api-key",
            config
                .api_key
                .parse()
                .map_err(|_| ClientError::invalid_request("API key is not a valid header value"))?,
        );

        // The client-level timeout bounds the whole exchange, body reads
        // included; race_deadline only covers up to the response headers.
        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::from_transport(&e))?;

        Ok(Self { config, http })
    }

    /// Create with an API key and default configuration
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(Config::new(api_key))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert the document described by `options` into a PDF.
    ///
    /// Validates the request, then uploads the file and returns the result
    /// in the requested delivery mode, retrying transient failures up to
    /// `max_retries` times with jittered exponential backoff.
    #[instrument(skip(self, options), fields(file = %options.file_path.display()))]
    pub async fn convert(&self, options: ConvertOptions) -> Result<Conversion> {
        self.validate(&options).await?;

        let max_retries = self.config.max_retries;
        let mut last_error: Option<ClientError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                // Jitter is recomputed here on every pass. Cancellation cuts
                // the backoff short instead of sitting out the full delay.
                let delay = retry::backoff_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
                match &options.cancel {
                    Some(token) => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = token.cancelled() => return Err(ClientError::timed_out()),
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
            }

            match self.attempt(&options).await {
                Ok(result) => return Ok(result),
                Err(error) if attempt < max_retries && error.is_retryable() => {
                    warn!(attempt, kind = %error.kind, "attempt failed, retrying: {error}");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ClientError::new(
                ErrorKind::Unknown,
                "conversion failed without a recorded error",
            )
        }))
    }

    /// Pre-flight checks, all before any network I/O.
    async fn validate(&self, options: &ConvertOptions) -> Result<()> {
        if options.file_path.as_os_str().is_empty() {
            return Err(ClientError::invalid_request("file path must not be empty"));
        }

        // Opening the file is the readability check; the handle is dropped
        // immediately and each attempt re-reads from disk.
        let metadata = tokio::fs::metadata(&options.file_path).await.map_err(|e| {
            ClientError::invalid_request(format!(
                "cannot read {}: {e}",
                options.file_path.display()
            ))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::invalid_request(format!(
                "{} is not a regular file",
                options.file_path.display()
            )));
        }
        tokio::fs::File::open(&options.file_path).await.map_err(|e| {
            ClientError::invalid_request(format!(
                "cannot read {}: {e}",
                options.file_path.display()
            ))
        })?;

        if options.stream && options.download_to.is_some() {
            return Err(ClientError::invalid_request(
                "streamed delivery and download_to are mutually exclusive",
            ));
        }

        if let Some(dest) = &options.download_to {
            let parent = match dest.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let parent_meta = tokio::fs::metadata(&parent).await.map_err(|e| {
                ClientError::invalid_request(format!(
                    "destination directory {} is not accessible: {e}",
                    parent.display()
                ))
            })?;
            if !parent_meta.is_dir() {
                return Err(ClientError::invalid_request(format!(
                    "destination parent {} is not a directory",
                    parent.display()
                )));
            }
            if parent_meta.permissions().readonly() {
                return Err(ClientError::invalid_request(format!(
                    "destination directory {} is not writable",
                    parent.display()
                )));
            }
        }

        Ok(())
    }

    /// One upload attempt: build the form, send, branch on delivery mode.
    async fn attempt(&self, options: &ConvertOptions) -> Result<Conversion> {
        let form = self.build_form(options).await?;
        let url = format!("{}/api/pdf/preview", self.config.base_url);

        debug!("POST {url}");
        let send = self.http.post(&url).multipart(form).send();
        let response = self.race_deadline(send, options.cancel.as_ref()).await?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let content_type = header_string(response.headers(), header::CONTENT_TYPE)
            .unwrap_or_else(|| "application/pdf".to_string());
        let request_id = extract_request_id(response.headers());

        if options.stream {
            let stream = response
                .bytes_stream()
                .map_err(|e| ClientError::from_transport(&e))
                .boxed();
            return Ok(Conversion::Streamed {
                stream,
                content_type,
                request_id,
            });
        }

        if let Some(dest) = &options.download_to {
            save_to_disk(response, dest).await?;
            return Ok(Conversion::Downloaded {
                path: dest.clone(),
                content_type,
                request_id,
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(&e))?;
        Ok(Conversion::Buffered {
            data,
            content_type,
            request_id,
        })
    }

    /// Builds the multipart body. The source file is re-read on every
    /// attempt, so a retry resends whatever is on disk at that moment.
    async fn build_form(&self, options: &ConvertOptions) -> Result<Form> {
        let contents = tokio::fs::read(&options.file_path).await.map_err(|e| {
            ClientError::invalid_request(format!(
                "cannot read {}: {e}",
                options.file_path.display()
            ))
        })?;

        let file_name = options
            .file_name
            .clone()
            .or_else(|| {
                options
                    .file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "document".to_string());

        let mime = mime_guess::from_path(&options.file_path).first_or_octet_stream();
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(|e| ClientError::from_transport(&e))?;

        let mut form = Form::new()
            .part("file", part)
            .text("output", options.output.as_str());
        if let Some(password) = &options.password {
            form = form.text("password", password.clone());
        }

        Ok(form)
    }

    /// Races the in-flight request against the configured timeout and the
    /// caller's cancellation token. Whichever fires first wins; the losing
    /// branches are dropped on every exit path, so nothing stays registered.
    async fn race_deadline<F>(
        &self,
        send: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response>
    where
        F: Future<Output = std::result::Result<Response, reqwest::Error>>,
    {
        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = send => result.map_err(|e| ClientError::from_transport(&e)),
            _ = tokio::time::sleep(self.config.timeout) => Err(ClientError::timed_out()),
            _ = cancelled => Err(ClientError::timed_out()),
        }
    }

    /// Turns a non-2xx response into a structured error. The body is parsed
    /// only when the server says it is JSON; anything else is treated as no
    /// structured body.
    async fn response_error(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let request_id = extract_request_id(response.headers());
        let is_json = header_string(response.headers(), header::CONTENT_TYPE)
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        let body = if is_json {
            response.json::<Value>().await.ok()
        } else {
            None
        };
        ClientError::from_response(status, request_id, body)
    }
}

/// Copies the response body to `dest` chunk by chunk, never holding the
/// whole payload in memory.
async fn save_to_disk(response: Response, dest: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        ClientError::new(
            ErrorKind::Unknown,
            format!("cannot create {}: {e}", dest.display()),
        )
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ClientError::from_transport(&e))?;
        file.write_all(&chunk).await.map_err(|e| {
            ClientError::new(
                ErrorKind::Unknown,
                format!("failed writing {}: {e}", dest.display()),
            )
        })?;
    }

    file.flush().await.map_err(|e| {
        ClientError::new(
            ErrorKind::Unknown,
            format!("failed writing {}: {e}", dest.display()),
        )
    })?;

    Ok(())
}

fn header_string(headers: &header::HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// `x-request-id` with `cf-ray` as the fallback header.
fn extract_request_id(headers: &header::HeaderMap) -> Option<String> {
    header_string(headers, "x-request-id").or_else(|| header_string(headers, "cf-ray"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let error = PdfmintClient::with_api_key("").unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_whitespace_api_key_rejected() {
        let error = PdfmintClient::with_api_key("   \t").unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let client = PdfmintClient::with_api_key("k").unwrap();
        let error = client
            .convert(ConvertOptions::new("/no/such/file.docx"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_validate_empty_path() {
        let client = PdfmintClient::with_api_key("k").unwrap();
        let error = client.convert(ConvertOptions::new("")).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
        assert!(error.message.contains("empty"), "got: {}", error.message);
    }

    #[tokio::test]
    async fn test_validate_exclusive_delivery_modes() {
        let source = tempfile::NamedTempFile::new().unwrap();
        let client = PdfmintClient::with_api_key("k").unwrap();
        let options = ConvertOptions::new(source.path())
            .download_to("/tmp/out.pdf")
            .streamed();
        let error = client.convert(options).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
        assert!(
            error.message.contains("mutually exclusive"),
            "got: {}",
            error.message
        );
    }

    #[tokio::test]
    async fn test_validate_missing_destination_directory() {
        let source = tempfile::NamedTempFile::new().unwrap();
        let client = PdfmintClient::with_api_key("k").unwrap();
        let options =
            ConvertOptions::new(source.path()).download_to("/no/such/dir/out.pdf");
        let error = client.convert(options).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_validate_directory_as_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = PdfmintClient::with_api_key("k").unwrap();
        let error = client
            .convert(ConvertOptions::new(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
        assert!(
            error.message.contains("regular file"),
            "got: {}",
            error.message
        );
    }
}
