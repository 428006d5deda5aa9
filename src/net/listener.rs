//! TCP listener setup.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum TransportError {
    /// The configured address does not parse.
    InvalidAddress(String, std::net::AddrParseError),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidAddress(addr, e) => {
                write!(f, "Invalid bind address {:?}: {}", addr, e)
            }
            TransportError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::InvalidAddress(_, e) => Some(e),
            TransportError::Bind(_, e) => Some(e),
        }
    }
}

/// Bind the configured address, returning the listener and its actual address.
pub async fn bind(config: &ListenerConfig) -> Result<(TcpListener, SocketAddr), TransportError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|e| TransportError::InvalidAddress(config.bind_address.clone(), e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::Bind(addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| TransportError::Bind(addr, e))?;

    tracing::info!(
        address = %local_addr,
        max_concurrent_requests = config.max_concurrent_requests,
        "Listener bound"
    );

    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bind_address: &str) -> ListenerConfig {
        ListenerConfig {
            bind_address: bind_address.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let (listener, local_addr) = bind(&config("127.0.0.1:0")).await.unwrap();
        assert_ne!(local_addr.port(), 0);
        assert_eq!(listener.local_addr().unwrap(), local_addr);
    }

    #[tokio::test]
    async fn rejects_unparseable_address() {
        let err = bind(&config("localhost:http")).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(..)));
    }

    #[tokio::test]
    async fn reports_address_in_use() {
        let (_first, taken) = bind(&config("127.0.0.1:0")).await.unwrap();
        let taken = taken.to_string();
        let err = bind(&config(&taken)).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind(..)));
    }
}
