// Cross-origin policy from [cors]

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// `"*"` allows every origin without credentials. An explicit list may allow
/// credentials; methods and headers are then mirrored from the preflight.
pub fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    if config.is_wildcard() {
        anyhow::ensure!(
            !config.allow_credentials,
            "credentialed requests cannot be allowed for every origin"
        );
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    let layer = CorsLayer::new().allow_origin(AllowOrigin::list(origins));
    if config.allow_credentials {
        Ok(layer
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()))
    } else {
        Ok(layer.allow_methods(Any).allow_headers(Any))
    }
}
