//! # jobtrail-mail
//!
//! Mail payload handling for the jobtrail application tracker.
//!
//! This crate provides:
//! - **Payload model**: the part tree a mailbox provider delivers for one
//!   message, with lenient base64url body decoding
//! - **Normalization**: multipart and HTML bodies reduced to clean plain
//!   text suitable for classification and storage
//! - **Provider capability**: the interface a mailbox backend implements
//!   to hand candidate messages to the ingestion pipeline
//!
//! ## Quick Start
//!
//! ```
//! use jobtrail_mail::{MessagePart, normalize_part};
//!
//! let payload = MessagePart::text_plain("Thanks for applying! We received your application.");
//! let text = normalize_part(&payload);
//! assert!(text.starts_with("Thanks for applying!"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod html;
mod normalize;
mod payload;
mod provider;

pub use error::{Error, Result};
pub use html::html_to_text;
pub use normalize::{normalize_message, normalize_part};
pub use payload::MessagePart;
pub use provider::{AccessToken, MailAccount, MailProvider, Provider, RawMessage};
