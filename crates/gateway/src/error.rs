/// Errors raised by the gateway lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// `start` was called while the server is already running.
    #[error("gateway already started")]
    AlreadyStarted,

    /// Binding the configured host and port failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
