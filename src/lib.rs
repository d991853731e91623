//! Postie is an email client speaking SMTP directly over a socket.
//!
//! It drives its own protocol dialog (greeting, optional `STARTTLS`, optional
//! `AUTH LOGIN`, envelope exchange and the `DATA` phase) and renders MIME
//! message bodies itself: plain text, `multipart/alternative` for HTML and
//! `multipart/mixed` for file attachments.
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use postie::{Security, Session};
//!
//! let mut session = Session::new();
//! session
//!     .set_connection("smtp.example.com", 587, Security::Tls, true, "user", "secret")
//!     .from(("noreply@example.com", "Example"))
//!     .to("alice@example.org")
//!     .cc([("bob@example.org", "Bob"), ("carol@example.org", "Carol")])
//!     .bcc("audit@example.com")
//!     .subject("Quarterly report")
//!     .text_body("Please find the report attached.")
//!     .attach("/tmp/report.pdf");
//!
//! if !session.send() {
//!     eprintln!("message was not accepted");
//! }
//! ```
//!
//! Protocol failures never panic or raise: [`Session::send`] reports them as
//! `false`. Use [`Session::try_send`] to learn which checkpoint failed, or
//! enable [`Session::debug`] to get the full request/response transcript.
//!
//! ## Named profiles
//!
//! Connection settings can be kept in a [`Config`] and selected by name,
//! either directly with [`Session::use_profile`] or through a [`Mailer`],
//! which creates one session per message.

#![doc(html_root_url = "https://docs.rs/crate/postie/0.1.0")]
#![forbid(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    missing_debug_implementations,
    missing_docs
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod address;
pub mod config;
pub mod mailer;
pub mod message;
mod rustls_crypto;
pub mod smtp;

pub use crate::{
    address::{Address, Addresses},
    config::{Config, ConnectionProfile, Security},
    mailer::{Content, Mailer},
    message::{Envelope, Message},
    smtp::{
        error::{Checkpoint, Error},
        response::Response,
        Session,
    },
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
