//! Direct Sonos speaker control over UPnP
//!
//! This crate provides the type-safe control surface used when tags drive
//! speakers without an HTTP gateway in between. It uses the private
//! `soap-client` crate for the SOAP transport.
//!
//! ```rust,no_run
//! use sonos_api::SonosClient;
//! use sonos_api::operations::av_transport::{PlayOperation, PlayRequest};
//!
//! let client = SonosClient::new();
//! client.execute::<PlayOperation>(
//!     "192.168.1.100",
//!     &PlayRequest { instance_id: 0, speed: "1".to_string() },
//! )?;
//! # Ok::<(), sonos_api::ApiError>(())
//! ```
//!
//! Besides the operations themselves the crate knows how to read favourites
//! ([`didl`]), how to turn music-service references into transport URIs
//! ([`share_link`]) and how to read a speaker's device description
//! ([`device`]).

pub mod client;
pub mod device;
pub mod didl;
pub mod error;
pub mod operation;
pub mod operations;
pub mod service;
pub mod share_link;

pub use client::SonosClient;
pub use error::{ApiError, Result};
pub use operation::SonosOperation;
pub use service::{Service, ServiceInfo};
pub use soap_client::DEFAULT_PORT;
