use http::Method;
use http::header::HeaderName;
use murmur_config::{AllowList, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    layer = match &config.origins {
        AllowList::Any => layer.allow_origin(AllowOrigin::any()),
        AllowList::Only(origins) => {
            let origins: Vec<_> = origins.iter().filter_map(|o| parse_or_warn("origin", o)).collect();
            layer.allow_origin(origins)
        }
    };

    layer = match &config.methods {
        AllowList::Any => layer.allow_methods(AllowMethods::any()),
        AllowList::Only(methods) => {
            let methods: Vec<Method> = methods.iter().filter_map(|m| parse_or_warn("method", m)).collect();
            layer.allow_methods(methods)
        }
    };

    layer = match &config.headers {
        AllowList::Any => layer.allow_headers(AllowHeaders::any()),
        AllowList::Only(headers) => {
            let headers: Vec<HeaderName> = headers.iter().filter_map(|h| parse_or_warn("header", h)).collect();
            layer.allow_headers(headers)
        }
    };

    if let Some(duration) = config.max_age() {
        layer = layer.max_age(duration);
    }

    layer
}

fn parse_or_warn<T: std::str::FromStr>(what: &'static str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        tracing::warn!(kind = what, value, "ignoring invalid CORS entry");
    }
    parsed
}
