//! Shared library for the map-picker location webhook.
//!
//! Turns location events from the Salebot map-picker webapp into a
//! normalized, validated address record: [`normalize`](mod@normalize) → [`resolver`] →
//! [`format`](mod@format), wired together by [`pipeline::LocationPipeline`].

pub mod config;
pub mod error;
pub mod format;
pub mod geocoder;
pub mod http;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod profile_store;
pub mod resolver;
pub mod response;
pub mod secrets;

pub use config::Config;
pub use error::{Error, Result};
pub use format::Locale;
pub use geocoder::{ReverseGeocoder, YandexGeocoder};
pub use models::{
    Accuracy, Action, FailureKind, InboundRequest, LocationInput, LocationSource,
    ResolutionFailure, ResolvedLocation, ResponseEnvelope,
};
pub use normalize::{normalize, parse_request, FieldAliases};
pub use pipeline::LocationPipeline;
pub use profile_store::{ProfileStore, SalebotProfileStore};
pub use resolver::resolve;
pub use response::{render, ResponseLayout};
pub use secrets::{get_api_credentials, get_secret, ApiCredentials, CredentialsCache};
