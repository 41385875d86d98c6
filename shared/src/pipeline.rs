//! Location resolution pipeline: normalize, resolve, format, render.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::format::{format, Locale};
use crate::geocoder::ReverseGeocoder;
use crate::models::{LocationInput, ResolutionFailure, ResponseEnvelope};
use crate::normalize::{parse_request, request_action, FieldAliases};
use crate::profile_store::ProfileStore;
use crate::resolver::resolve;
use crate::response::{render, ResponseLayout};

/// One configured pipeline, shared across invocations.
pub struct LocationPipeline<G, P> {
    geocoder: G,
    profile_store: Option<P>,
    aliases: FieldAliases,
    layout: Option<ResponseLayout>,
    locale: Locale,
}

impl<G, P> LocationPipeline<G, P>
where
    G: ReverseGeocoder,
    P: ProfileStore,
{
    pub fn new(geocoder: G, profile_store: Option<P>) -> Self {
        Self {
            geocoder,
            profile_store,
            aliases: FieldAliases::default(),
            layout: None,
            locale: Locale::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: FieldAliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Force a layout instead of deriving it from the request action.
    pub fn with_layout(mut self, layout: Option<ResponseLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Run one payload through the pipeline and render the response.
    pub async fn process(&self, raw: &Value) -> Value {
        let request = parse_request(raw, &self.aliases);
        let layout = self
            .layout
            .unwrap_or_else(|| ResponseLayout::for_action(request.action));

        let resolution = resolve(
            &request.input,
            &self.geocoder,
            request.geocoder_api_key.as_deref(),
        )
        .await;

        let mut envelope = format(&resolution, self.locale);
        envelope.user_id = request.input.user_id.clone();
        envelope.timestamp = request.input.timestamp.clone();

        match &resolution {
            Ok(location) => info!(
                action = ?request.action,
                source = ?location.source,
                user_id = ?request.input.user_id,
                "Location resolved"
            ),
            Err(failure) => warn!(
                action = ?request.action,
                kind = ?failure.kind,
                user_id = ?request.input.user_id,
                "Location not resolved: {}",
                failure.detail
            ),
        }

        if envelope.success {
            self.save_to_profile(&request.input, &envelope).await;
        }

        render(&envelope, layout)
    }

    /// Write the resolved variables to the profile store.
    ///
    /// Skipped without a user id or a configured store; failures are only
    /// logged and never change the response.
    async fn save_to_profile(&self, input: &LocationInput, envelope: &ResponseEnvelope) {
        let (Some(store), Some(user_id)) = (&self.profile_store, input.user_id.as_deref()) else {
            return;
        };
        if envelope.payload.is_none() {
            return;
        }
        if let Err(e) = store.save_variables(user_id, &envelope.variables).await {
            warn!(user_id, "Failed to save location to profile: {}", e);
        }
    }

    /// Envelope for a request that failed outside the normal flow.
    pub fn internal_failure(&self, raw: &Value, detail: impl Into<String>) -> Value {
        let layout = self
            .layout
            .unwrap_or_else(|| ResponseLayout::for_action(request_action(raw, &self.aliases)));
        let envelope = format(&Err(ResolutionFailure::internal(detail)), self.locale);
        render(&envelope, layout)
    }
}

impl<G, P> LocationPipeline<G, P>
where
    G: ReverseGeocoder + 'static,
    P: ProfileStore + 'static,
{
    /// Like [`process`](Self::process), but a panic anywhere in the run
    /// still produces an internal-error response.
    pub async fn handle(self: Arc<Self>, raw: Value) -> Value {
        let pipeline = Arc::clone(&self);
        let payload = raw.clone();
        match tokio::spawn(async move { pipeline.process(&payload).await }).await {
            Ok(response) => response,
            Err(e) => {
                error!("Location pipeline aborted: {}", e);
                self.internal_failure(&raw, e.to_string())
            }
        }
    }
}
