//! Location Webhook Lambda - Resolves map-picker selections for Salebot.
//!
//! Accepts the webapp event directly or through an API Gateway proxy
//! integration, and always answers with a success/failure envelope.

use std::sync::Arc;
use std::time::Duration;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::http::{unwrap_event, wrap_response};
use shared::{get_api_credentials, Config, LocationPipeline, SalebotProfileStore, YandexGeocoder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Pipeline = LocationPipeline<YandexGeocoder, SalebotProfileStore>;

/// Application state
struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let mut config = Config::from_env()?;

        if let Some(secret_arn) = config.credentials_secret_arn.clone() {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
            get_api_credentials(&secrets_client, &secret_arn)
                .await?
                .apply_to(&mut config);
        }

        if config.yandex_api_key.is_none() {
            warn!("YANDEX_API_KEY not set; geocoding needs a key in the request");
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let geocoder = YandexGeocoder::from_config(http_client.clone(), &config);
        let profile_store = SalebotProfileStore::from_config(http_client, &config);
        if profile_store.is_none() {
            info!("SALEBOT_API_KEY not set; profile write-through disabled");
        }

        let pipeline = LocationPipeline::new(geocoder, profile_store)
            .with_layout(config.response_layout)
            .with_locale(config.locale);

        Ok(Self {
            pipeline: Arc::new(pipeline),
        })
    }
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let inbound = unwrap_event(payload);

    info!(
        request_id = %context.request_id,
        proxied = inbound.proxied,
        "Processing map-picker event"
    );

    let response = Arc::clone(&state.pipeline).handle(inbound.payload).await;
    Ok(wrap_response(response, inbound.proxied))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    lambda_runtime::run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
