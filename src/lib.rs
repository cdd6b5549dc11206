mod auth;
mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod service;
mod store;
mod upstream;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::oauth::{ProcessedCodes, SessionEstablisher};
use crate::store::stage_sessions;
use crate::upstream::{ApiClient, SharedApi};
use crate::upstream::identity::IdentityProvider;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG overrides the configured level, e.g.
    //   RUST_LOG=workplanner::service=debug
    //   RUST_LOG=info,workplanner::upstream=trace
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A subscriber may already be installed when several instances are built in one process.
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn ensure_rocket_secret_key() {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    // Session cookies are private; outside debug they must survive restarts.
    if profile != "debug" && std::env::var("ROCKET_SECRET_KEY").is_err() {
        panic!(
            "ROCKET_SECRET_KEY is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept", middleware::REQUEST_ID_HEADER]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn collect_base_paths(api_config: &config::ApiConfig) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    let mut push_unique = |path: String| {
        if !normalized.contains(&path) {
            normalized.push(path);
        }
    };

    push_unique(normalize_base_path(&api_config.base_path));

    for extra in &api_config.additional_base_paths {
        push_unique(normalize_base_path(extra));
    }

    normalized
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

fn collect_route_specs() -> Vec<RouteSpec> {
    let (session_routes, session_openapi) = app_routes::session::routes();
    let (project_routes, project_openapi) = app_routes::project::routes();
    let (task_routes, task_openapi) = app_routes::task::routes();
    let (statistics_routes, statistics_openapi) = app_routes::statistics::routes();
    let (health_routes, health_openapi) = app_routes::health::routes();

    vec![
        RouteSpec {
            path: "/session",
            routes: session_routes,
            openapi: session_openapi,
        },
        RouteSpec {
            path: "/projects",
            routes: project_routes,
            openapi: project_openapi,
        },
        RouteSpec {
            path: "/tasks",
            routes: task_routes,
            openapi: task_openapi,
        },
        RouteSpec {
            path: "/statistics",
            routes: statistics_routes,
            openapi: statistics_openapi,
        },
        RouteSpec {
            path: "/health",
            routes: health_routes,
            openapi: health_openapi,
        },
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs();

    if enable_swagger {
        let mut openapi_list = Vec::new();
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
            openapi_list.push((spec.path, spec.openapi));
        }

        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(docs_path, make_swagger_ui(&get_swagger_config(&openapi_url)));
    } else {
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
        }
    }

    rocket
}

/// Builds the upstream client and the sign-in machinery. `identity` replaces the upstream
/// identity endpoints when set.
/// Stand-ins for the upstream API. `None` means the live client.
#[derive(Default)]
struct UpstreamOverrides {
    identity: Option<Arc<dyn IdentityProvider>>,
    api: Option<SharedApi>,
}

fn stage_upstream(config: Config, overrides: UpstreamOverrides) -> AdHoc {
    AdHoc::try_on_ignite("Upstream API", move |rocket| async move {
        let client = match ApiClient::new(&config.upstream) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to build upstream client: {}", e);
                return Err(rocket);
            }
        };

        let processed = Arc::new(ProcessedCodes::new(
            config.session.processed_code_ttl,
            config.session.cleanup_interval_seconds,
        ));
        processed.clone().spawn_cleanup_task();

        tracing::info!(base_url = %client.base_url(), "Upstream API client initialized");
        let identity = overrides.identity.unwrap_or_else(|| Arc::new(client.clone()));
        let api: SharedApi = overrides.api.unwrap_or_else(|| Arc::new(client));

        Ok(rocket.manage(api).manage(SessionEstablisher::new(identity, processed)))
    })
}

fn assemble(config: Config, overrides: UpstreamOverrides) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_rocket_secret_key();

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");

    let base_paths = collect_base_paths(&config.api);

    let figment = rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", config.server.address.clone()));

    let mut rocket = rocket::custom(figment)
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_sessions(config.session.clone()))
        .attach(stage_upstream(config.clone(), overrides))
        .mount("/", app_routes::auth::routes())
        .mount("/", app_routes::dashboard::routes());

    let enable_swagger = config.api.enable_swagger;
    for base_path in &base_paths {
        rocket = mount_api_routes(rocket, base_path, enable_swagger);
    }

    rocket
        .register(
            "/",
            catchers![
                app_routes::error::bad_request,
                app_routes::error::unauthorized,
                app_routes::error::not_found,
                app_routes::error::conflict,
                app_routes::error::unprocessable_entity,
                app_routes::error::bad_gateway
            ],
        )
        .manage(config)
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    assemble(config, UpstreamOverrides::default())
}

#[cfg(test)]
pub(crate) fn build_rocket_with_identity(config: Config, identity: Arc<dyn IdentityProvider>) -> Rocket<Build> {
    assemble(
        config,
        UpstreamOverrides {
            identity: Some(identity),
            api: None,
        },
    )
}

#[cfg(test)]
pub(crate) fn build_rocket_with_upstream(config: Config, identity: Arc<dyn IdentityProvider>, api: SharedApi) -> Rocket<Build> {
    assemble(
        config,
        UpstreamOverrides {
            identity: Some(identity),
            api: Some(api),
        },
    )
}
