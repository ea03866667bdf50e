//! Client SDK for the offers microservice.
//!
//! Access tokens are refreshed single-flight from a long-lived refresh token, requests are
//! retried transparently, and offer lookups sit behind a TTL-bounded cache. Async and
//! blocking facades share one implementation.
//!
//! The crate is organized leaves first:
//!
//! - [`auth`] owns the refresh→access token lifecycle ([`auth::TokenManager`]).
//! - [`cache`] memoizes offer lookups for a bounded time ([`cache::OffersCache`]).
//! - [`pipeline`] attaches credentials to outbound calls and recovers from expired tokens and
//!   transient failures.
//! - [`client`] exposes [`OffersClient`]; [`blocking`] wraps it for synchronous callers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
#[cfg(feature = "blocking")] pub mod blocking;
pub mod cache;
pub mod client;
pub mod error;
pub mod ext;
pub mod http;
pub mod model;
pub mod obs;
pub mod pipeline;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;
	pub use uuid::Uuid;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "blocking")] pub use blocking::BlockingOffersClient;
#[cfg(all(feature = "blocking", feature = "reqwest"))]
pub use blocking::ReqwestBlockingOffersClient;
pub use client::{ClientBuilder, OffersClient};
#[cfg(feature = "reqwest")] pub use client::ReqwestOffersClient;
pub use error::{Error, Result};
pub use model::{Offer, Product};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
pub use uuid;
#[cfg(test)] use {color_eyre as _, httpmock as _};
