//! The application collaborator
//!
//! Commands never talk to a concrete web framework. They see the host
//! application through the [`Application`] trait: a request-context scope,
//! a route table, a configuration lookup and a serve entry point.

use crate::error::{Result, ScriptError};
use axum::{
    Router,
    routing::{MethodFilter, MethodRouter, on},
};
use serde::{Deserialize, Serialize};
use std::{
    cell::Cell,
    collections::{BTreeMap, HashSet},
};
use tokio::{net::TcpListener, runtime};
use tracing::{debug, info, instrument, warn};

/// One entry of the application's route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// URL pattern, e.g. `/users/<id>`
    pub rule: String,
    /// Name of the endpoint handling the pattern
    pub endpoint: String,
    /// HTTP methods accepted by the route
    pub methods: Vec<String>,
}

impl Route {
    /// Create a route accepting `GET`
    pub fn new(rule: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            endpoint: endpoint.into(),
            methods: vec!["GET".to_string()],
        }
    }

    /// Replace the accepted methods
    #[must_use]
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }
}

/// Application-level configuration visible to commands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Overrides the server command's debugger setting when present
    pub debug: Option<bool>,
    /// Free-form settings
    pub values: BTreeMap<String, String>,
}

impl AppConfig {
    /// Look up a free-form setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Everything the serve entry point needs to start a development server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub use_debugger: bool,
    pub use_reloader: bool,
    pub threaded: bool,
    pub processes: u32,
    pub passthrough_errors: bool,
    /// Server options forwarded verbatim
    pub extra: BTreeMap<String, String>,
}

/// The host application commands operate on
pub trait Application {
    /// Human-readable application name
    fn name(&self) -> &str;

    /// Push a request context binding this application as current
    fn enter_request_context(&self) -> Result<()>;

    /// Pop the request context pushed by [`Application::enter_request_context`]
    fn exit_request_context(&self);

    /// The full route table
    fn routes(&self) -> Vec<Route>;

    /// Application configuration
    fn config(&self) -> &AppConfig;

    /// Start serving; blocks until the server stops
    fn serve(&self, options: &ServeOptions) -> Result<()>;
}

/// Scoped request context.
///
/// Entering happens in [`RequestContext::enter`]; leaving happens when the
/// guard is dropped, on every exit path of the enclosing scope.
pub struct RequestContext<'a> {
    app: &'a dyn Application,
}

impl<'a> RequestContext<'a> {
    /// Enter a request context bound to `app`
    pub fn enter(app: &'a dyn Application) -> Result<Self> {
        app.enter_request_context()?;
        debug!("Entered request context for {}", app.name());
        Ok(Self { app })
    }
}

impl Drop for RequestContext<'_> {
    fn drop(&mut self) {
        self.app.exit_request_context();
        debug!("Left request context for {}", self.app.name());
    }
}

/// In-memory application with a fixed route table. Its development server
/// answers every routed request with the endpoint name.
#[derive(Debug, Default)]
pub struct StaticApp {
    name: String,
    routes: Vec<Route>,
    config: AppConfig,
    context_depth: Cell<usize>,
}

impl StaticApp {
    /// Create an application without routes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Small application used by the `manage` binary
    pub fn demo() -> Self {
        Self::new("demo")
            .with_route(Route::new("/", "index"))
            .with_route(Route::new("/health", "health"))
            .with_route(Route::new("/users", "users.list").with_methods(["GET", "POST"]))
            .with_route(Route::new("/users/<id>", "users.detail"))
    }

    /// Register a route
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of request contexts currently entered
    pub fn context_depth(&self) -> usize {
        self.context_depth.get()
    }
}

impl Application for StaticApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn enter_request_context(&self) -> Result<()> {
        self.context_depth.set(self.context_depth.get() + 1);
        Ok(())
    }

    fn exit_request_context(&self) {
        self.context_depth
            .set(self.context_depth.get().saturating_sub(1));
    }

    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }

    #[instrument(skip(self, options), fields(app = %self.name))]
    fn serve(&self, options: &ServeOptions) -> Result<()> {
        let router = self.router()?;

        if options.processes > 1 {
            warn!(
                "Multi-process serving is not supported, ignoring processes={}",
                options.processes
            );
        }
        if options.use_reloader {
            debug!("Reloader requested; this server does not watch files");
        }
        if options.passthrough_errors {
            debug!("Handler errors are answered by the router, nothing to pass through");
        }
        if !options.extra.is_empty() {
            debug!("Extra server options: {:?}", options.extra);
        }

        let mut builder = if options.threaded {
            runtime::Builder::new_multi_thread()
        } else {
            runtime::Builder::new_current_thread()
        };
        let runtime = builder
            .enable_all()
            .build()
            .map_err(|e| server_error("cannot start the server runtime", e))?;

        let address = format!("{}:{}", options.host, options.port);
        runtime.block_on(async {
            let listener = TcpListener::bind(&address)
                .await
                .map_err(|e| server_error(format!("cannot listen on {address}"), e))?;

            info!(
                "Serving {} on http://{} (debug={}, threaded={})",
                self.name, address, options.debug, options.threaded
            );

            axum::serve(listener, router)
                .await
                .map_err(|e| server_error("server stopped", e))
        })
    }
}

fn server_error(message: impl Into<String>, e: std::io::Error) -> ScriptError {
    ScriptError::Application {
        message: message.into(),
        source: Some(Box::new(e)),
    }
}

impl StaticApp {
    /// Router answering each registered rule with its endpoint name
    pub fn router(&self) -> Result<Router> {
        let mut paths: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut seen = HashSet::new();

        for route in &self.routes {
            let path = router_path(&route.rule)?;
            for method in &route.methods {
                let filter = method_filter(method)?;
                if !seen.insert((path.clone(), method.to_ascii_uppercase())) {
                    warn!("{} {} is already routed, keeping the first", method, route.rule);
                    continue;
                }

                let body = format!("{}\n", route.endpoint);
                let handler = move || {
                    let body = body.clone();
                    async move { body }
                };
                let methods = match paths.remove(&path) {
                    Some(methods) => methods.on(filter, handler),
                    None => on(filter, handler),
                };
                paths.insert(path.clone(), methods);
            }
        }

        Ok(paths
            .into_iter()
            .fold(Router::new(), |router, (path, methods)| router.route(&path, methods)))
    }
}

/// Translate `<name>` / `<converter:name>` placeholders into router captures
fn router_path(rule: &str) -> Result<String> {
    if !rule.starts_with('/') {
        return Err(ScriptError::application(format!(
            "route `{rule}` must start with `/`"
        )));
    }

    let segments = rule
        .split('/')
        .map(|segment| match segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Some(variable) => {
                let name = variable.rsplit(':').next().unwrap_or(variable);
                Ok(format!("{{{name}}}"))
            }
            None if segment.starts_with([':', '*', '{']) => Err(ScriptError::application(
                format!("route `{rule}` has an unsupported segment `{segment}`"),
            )),
            None => Ok(segment.to_string()),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(segments.join("/"))
}

fn method_filter(method: &str) -> Result<MethodFilter> {
    let filter = match method.to_ascii_uppercase().as_str() {
        "GET" => MethodFilter::GET,
        "HEAD" => MethodFilter::HEAD,
        "POST" => MethodFilter::POST,
        "PUT" => MethodFilter::PUT,
        "PATCH" => MethodFilter::PATCH,
        "DELETE" => MethodFilter::DELETE,
        "OPTIONS" => MethodFilter::OPTIONS,
        "TRACE" => MethodFilter::TRACE,
        other => {
            return Err(ScriptError::application(format!(
                "unsupported HTTP method `{other}`"
            )));
        }
    };
    Ok(filter)
}
