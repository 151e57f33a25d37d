//! The hosting HTTP server: a thin hyper adapter which turns raw HTTP requests into the narrow
//! [WebRequest](crate::request::WebRequest)/[WebResponse](crate::request::WebResponse)
//! abstraction and hands them to the [Dispatcher](crate::dispatcher::Dispatcher). Concurrency,
//! connection handling and raw parsing all live here, outside the dispatch core.

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::request::{ParameterMap, WebRequest, WebResponse};
use hyper::header::CONTENT_TYPE;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use std::convert::Infallible;
use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

/// Errors related to bootstrapping and running the hosting server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Error parsing listen address: {0}")]
    ListenAddressParse(#[from] AddrParseError),
    #[error("Error binding server: {0}")]
    Bind(#[source] hyper::Error),
    #[error("Server error: {0}")]
    Serve(#[source] hyper::Error),
}

/// An inbound HTTP request adapted to the dispatcher's request abstraction.
pub struct HttpRequest {
    path: String,
    context_path: String,
    parameters: ParameterMap,
}

impl HttpRequest {
    pub fn new<P, C>(path: P, context_path: C, parameters: ParameterMap) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            path: path.into(),
            context_path: context_path.into(),
            parameters,
        }
    }

    /// Adapts a raw hyper request: the URI path, plus parameters decoded from the query string
    /// and, for urlencoded POST bodies, from the body as well.
    pub async fn from_hyper(request: Request<Body>, context_path: &str) -> Self {
        let path = request.uri().path().to_string();

        let mut parameters = ParameterMap::default();
        if let Some(query) = request.uri().query() {
            append_urlencoded(&mut parameters, query);
        }

        let is_form_body = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if is_form_body {
            match hyper::body::to_bytes(request.into_body()).await {
                Ok(bytes) => append_urlencoded(&mut parameters, &String::from_utf8_lossy(&bytes)),
                // dispatch proceeds with the query parameters alone
                Err(error) => warn!("Cannot read urlencoded request body for {path}: {error}"),
            }
        }

        Self::new(path, context_path, parameters)
    }
}

impl WebRequest for HttpRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn context_path(&self) -> &str {
        &self.context_path
    }

    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }
}

fn append_urlencoded(parameters: &mut ParameterMap, raw: &str) {
    for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        parameters
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }
}

/// A response sink accumulating body text, written out once the dispatch returns.
#[derive(Default)]
pub struct BufferedResponse {
    body: Mutex<String>,
}

impl BufferedResponse {
    pub fn into_body(self) -> String {
        self.body
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WebResponse for BufferedResponse {
    fn write(&self, text: &str) {
        let mut body = match self.body.lock() {
            Ok(body) => body,
            Err(poisoned) => poisoned.into_inner(),
        };
        body.push_str(text);
    }
}

/// Serves requests until the process ends.
pub async fn serve(dispatcher: Arc<Dispatcher>, config: &ServerConfig) -> Result<(), ServerError> {
    serve_with_shutdown(dispatcher, config, std::future::pending()).await
}

/// Serves requests until the shutdown future resolves. The dispatcher runs one blocking task per
/// request; per-request state is owned by that task and never shared.
pub async fn serve_with_shutdown(
    dispatcher: Arc<Dispatcher>,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ServerError> {
    let address: SocketAddr = config.listen_address.parse()?;
    let context_path = config.context_path.clone();

    let make_service = make_service_fn(move |_| {
        let dispatcher = dispatcher.clone();
        let context_path = context_path.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request| {
                handle(dispatcher.clone(), context_path.clone(), request)
            }))
        }
    });

    let server = Server::try_bind(&address)
        .map_err(ServerError::Bind)?
        .serve(make_service);

    info!("Listening on {address}");

    server
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

async fn handle(
    dispatcher: Arc<Dispatcher>,
    context_path: String,
    request: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let request = HttpRequest::from_hyper(request, &context_path).await;

    let body = tokio::task::spawn_blocking(move || {
        let response = BufferedResponse::default();
        dispatcher.dispatch(&request, &response);
        response.into_body()
    })
    .await
    .unwrap_or_else(|error| format!("500 Exception {error}"));

    Ok(Response::new(Body::from(body)))
}
