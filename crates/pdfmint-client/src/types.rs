//! Common types for the client SDK

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::ClientError;

/// Output format accepted by the conversion endpoint.
///
/// Currently the service only produces PDF; the enum keeps the wire field
/// explicit and leaves room for future formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Portable Document Format
    #[default]
    Pdf,
}

impl OutputFormat {
    /// Wire value for the `output` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
        }
    }
}

/// Options for a single conversion call.
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    /// Path of the document to upload
    pub file_path: PathBuf,
    /// Overrides the uploaded filename (defaults to the source file's name)
    pub file_name: Option<String>,
    /// Requested output format
    pub output: OutputFormat,
    /// Password for protected documents, sent only when set
    pub password: Option<String>,
    /// External cancellation signal, merged with the internal timeout
    pub cancel: Option<CancellationToken>,
    /// Write the result directly to this path instead of buffering it
    pub download_to: Option<PathBuf>,
    /// Hand back the response body as a stream instead of buffering it.
    /// Mutually exclusive with `download_to`.
    pub stream: bool,
}

impl ConvertOptions {
    /// Create options for converting the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            ..Default::default()
        }
    }

    /// Override the uploaded filename
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the password for a protected document
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Attach an external cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Deliver the PDF directly to disk at `path`
    pub fn download_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_to = Some(path.into());
        self
    }

    /// Deliver the PDF as a byte stream
    pub fn streamed(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Lazy, single-consumption byte sequence for streamed delivery.
pub type PdfStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Result of a successful conversion, one variant per delivery mode.
pub enum Conversion {
    /// The whole PDF, read into memory
    Buffered {
        /// PDF bytes
        data: Bytes,
        /// Response content type (defaults to `application/pdf`)
        content_type: String,
        /// Correlation id from the server, if sent
        request_id: Option<String>,
    },
    /// The PDF was written to disk without buffering
    Downloaded {
        /// Where the PDF was written
        path: PathBuf,
        /// Response content type
        content_type: String,
        /// Correlation id from the server, if sent
        request_id: Option<String>,
    },
    /// A live byte stream; the caller owns its consumption
    Streamed {
        /// The response body stream
        stream: PdfStream,
        /// Response content type
        content_type: String,
        /// Correlation id from the server, if sent
        request_id: Option<String>,
    },
}

impl Conversion {
    /// Content type reported by the server
    pub fn content_type(&self) -> &str {
        match self {
            Self::Buffered { content_type, .. }
            | Self::Downloaded { content_type, .. }
            | Self::Streamed { content_type, .. } => content_type,
        }
    }

    /// Correlation id reported by the server, if any
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Buffered { request_id, .. }
            | Self::Downloaded { request_id, .. }
            | Self::Streamed { request_id, .. } => request_id.as_deref(),
        }
    }

    /// The destination path, for disk delivery
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Downloaded { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered {
                data,
                content_type,
                request_id,
            } => f
                .debug_struct("Buffered")
                .field("len", &data.len())
                .field("content_type", content_type)
                .field("request_id", request_id)
                .finish(),
            Self::Downloaded {
                path,
                content_type,
                request_id,
            } => f
                .debug_struct("Downloaded")
                .field("path", path)
                .field("content_type", content_type)
                .field("request_id", request_id)
                .finish(),
            Self::Streamed {
                content_type,
                request_id,
                ..
            } => f
                .debug_struct("Streamed")
                .field("content_type", content_type)
                .field("request_id", request_id)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ConvertOptions::new("report.docx")
            .with_file_name("renamed.docx")
            .with_password("hunter2")
            .download_to("/tmp/out.pdf");

        assert_eq!(options.file_path, PathBuf::from("report.docx"));
        assert_eq!(options.file_name.as_deref(), Some("renamed.docx"));
        assert_eq!(options.password.as_deref(), Some("hunter2"));
        assert_eq!(options.download_to, Some(PathBuf::from("/tmp/out.pdf")));
        assert!(!options.stream);
        assert_eq!(options.output.as_str(), "pdf");
    }

    #[test]
    fn test_accessors_across_variants() {
        let buffered = Conversion::Buffered {
            data: Bytes::from_static(b"%PDF-1.4"),
            content_type: "application/pdf".to_string(),
            request_id: Some("rid_1".to_string()),
        };
        assert_eq!(buffered.content_type(), "application/pdf");
        assert_eq!(buffered.request_id(), Some("rid_1"));
        assert!(buffered.path().is_none());

        let downloaded = Conversion::Downloaded {
            path: PathBuf::from("/tmp/out.pdf"),
            content_type: "application/pdf".to_string(),
            request_id: None,
        };
        assert_eq!(downloaded.path(), Some(Path::new("/tmp/out.pdf")));
        assert!(downloaded.request_id().is_none());
    }
}
