//! # Pdfmint Client SDK
//!
//! A thin client for the Pdfmint document-to-PDF conversion API: upload an
//! office document, get the resulting PDF back.
//!
//! ## Features
//!
//! - **Three delivery modes**: in-memory buffer, streamed bytes, or written
//!   straight to disk
//! - **Structured errors**: every failure carries a closed error kind, the
//!   HTTP status, and the server's request id for support
//! - **Bounded retries**: transient failures (timeouts, network errors,
//!   408/429/5xx) retry with jittered exponential backoff
//! - **Cooperative cancellation**: an external [`CancellationToken`] is
//!   merged with the request timeout
//!
//! ## Example
//!
//! ```rust,ignore
//! use pdfmint_client::{Config, ConvertOptions, Conversion, PdfmintClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pdfmint_client::ClientError> {
//!     let client = PdfmintClient::new(Config::new("your-api-key"))?;
//!
//!     // Buffer the PDF in memory
//!     let result = client.convert(ConvertOptions::new("report.docx")).await?;
//!     if let Conversion::Buffered { data, .. } = result {
//!         println!("got {} PDF bytes", data.len());
//!     }
//!
//!     // Or write it straight to disk
//!     client
//!         .convert(ConvertOptions::new("report.docx").download_to("report.pdf"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod client;
mod config;
mod error;
mod retry;
mod types;

pub use client::PdfmintClient;
pub use config::{Config, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use error::{ClientError, ErrorKind, Result};
pub use types::{Conversion, ConvertOptions, OutputFormat, PdfStream};

// Re-exported so callers don't need a direct tokio-util dependency to cancel.
pub use tokio_util::sync::CancellationToken;
