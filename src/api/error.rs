use thiserror::Error;

/// Largest response body kept on an [`GatewayError::Api`]
pub const ERROR_BODY_LIMIT: usize = 8 * 1024;

/// Coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource does not exist; callers treat it as an empty result
    NotFound,
    /// Worth retrying: rate limits, server errors, dropped connections
    Transient,
    /// Retrying will not help
    Permanent,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("ingresso api error: {status} {status_text}: {body}")]
    Api {
        status: u16,
        status_text: String,
        endpoint: String,
        body: String,
    },

    #[error("request to {endpoint} failed: {message}")]
    Network {
        endpoint: String,
        message: String,
        timeout: bool,
    },

    #[error("decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotFound(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn api(status: u16, status_text: impl Into<String>, endpoint: impl Into<String>, body: &[u8]) -> Self {
        let limit = body.len().min(ERROR_BODY_LIMIT);
        GatewayError::Api {
            status,
            status_text: status_text.into(),
            endpoint: endpoint.into(),
            body: String::from_utf8_lossy(&body[..limit]).trim().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Api { status, .. } => match *status {
                404 => ErrorKind::NotFound,
                429 | 500..=599 => ErrorKind::Transient,
                _ => ErrorKind::Permanent,
            },
            GatewayError::Network { .. } => ErrorKind::Transient,
            GatewayError::Decode { .. } | GatewayError::Invalid(_) => ErrorKind::Permanent,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_status() {
        assert_eq!(GatewayError::api(404, "Not Found", "/x", b"").kind(), ErrorKind::NotFound);
        assert_eq!(GatewayError::api(429, "Too Many Requests", "/x", b"").kind(), ErrorKind::Transient);
        assert_eq!(GatewayError::api(503, "Service Unavailable", "/x", b"").kind(), ErrorKind::Transient);
        assert_eq!(GatewayError::api(400, "Bad Request", "/x", b"").kind(), ErrorKind::Permanent);
        assert_eq!(GatewayError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_body_snippet_is_capped_and_trimmed() {
        let body = vec![b'a'; ERROR_BODY_LIMIT + 100];
        match GatewayError::api(500, "Internal Server Error", "/x", &body) {
            GatewayError::Api { body, .. } => assert_eq!(body.len(), ERROR_BODY_LIMIT),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = GatewayError::api(400, "Bad Request", "/x", b"  bad input \n");
        assert_eq!(err.to_string(), "ingresso api error: 400 Bad Request: bad input");
    }
}
