//! The narrow request/response abstraction the dispatcher consumes. The actual HTTP transport -
//! accepting connections, parsing raw requests, writing responses - is supplied by a hosting
//! server (see [server](crate::server)) and only surfaces here.

use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;

/// Multi-valued request parameter map, as decoded from the query string and an urlencoded body.
pub type ParameterMap = FxHashMap<String, Vec<String>>;

/// An inbound request, as seen by the dispatcher.
#[cfg_attr(test, automock)]
pub trait WebRequest: Send + Sync {
    /// Raw request path, before normalization.
    fn path(&self) -> &str;

    /// Context prefix under which the application is hosted; stripped during path normalization.
    fn context_path(&self) -> &str;

    /// The full multi-valued request parameter map.
    fn parameters(&self) -> &ParameterMap;
}

/// The outbound response sink. Writing takes `&self` so the live response can be handed to an
/// action as a carrier argument while the dispatcher keeps its own reference.
#[cfg_attr(test, automock)]
pub trait WebResponse: Send + Sync {
    /// Appends text to the response body.
    fn write(&self, text: &str);
}
