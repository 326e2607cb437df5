use std::error::Error;
use std::io;

use super::{ClassificationResult, FailureKind};

pub const NO_CONNECTION: &str = "No internet connection";

// Resolver messages as surfaced by hyper / getaddrinfo across platforms
const UNRESOLVED_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
];

/// Maps a failure that produced no response into `NoConnection` or `NetworkError`.
pub fn classify_transport_error(err: &(dyn Error + 'static)) -> ClassificationResult {
    if is_unreachable(err) {
        return ClassificationResult::failure(FailureKind::NoConnection, NO_CONNECTION);
    }

    ClassificationResult::failure(FailureKind::NetworkError, format!("Error: {}", describe(err)))
}

fn causes<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn is_unreachable(err: &(dyn Error + 'static)) -> bool {
    causes(err).any(|cause| {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable
            ) {
                return true;
            }
        }

        let msg = cause.to_string().to_lowercase();
        UNRESOLVED_MARKERS.iter().any(|marker| msg.contains(marker))
    })
}

/// "outer: inner: root", skipping causes already spelled out by their parent.
fn describe(err: &(dyn Error + 'static)) -> String {
    let mut out = String::new();
    for cause in causes(err) {
        let msg = cause.to_string();
        if out.contains(&msg) {
            continue;
        }
        if !out.is_empty() {
            out.push_str(": ");
        }
        out.push_str(&msg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped {
        msg: &'static str,
        source: io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.msg)
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_dns_failure_is_no_connection() {
        let err = Wrapped {
            msg: "error trying to connect",
            source: io::Error::new(
                io::ErrorKind::Other,
                "dns error: failed to lookup address information: Name or service not known",
            ),
        };
        assert_eq!(
            classify_transport_error(&err),
            ClassificationResult::failure(FailureKind::NoConnection, NO_CONNECTION)
        );
    }

    #[test]
    fn test_host_unreachable_is_no_connection() {
        let err = io::Error::new(io::ErrorKind::HostUnreachable, "no route to host");
        assert_eq!(
            classify_transport_error(&err),
            ClassificationResult::failure(FailureKind::NoConnection, NO_CONNECTION)
        );
    }

    #[derive(Debug)]
    struct Outer(Wrapped);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_walks_whole_cause_chain() {
        let err = Outer(Wrapped {
            msg: "error trying to connect",
            source: io::Error::new(io::ErrorKind::NetworkUnreachable, "network is unreachable"),
        });
        assert_eq!(causes(&err).count(), 3);
        assert_eq!(
            classify_transport_error(&err),
            ClassificationResult::failure(FailureKind::NoConnection, NO_CONNECTION)
        );
    }

    #[test]
    fn test_other_failures_carry_cause() {
        let err = Wrapped {
            msg: "error sending request",
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        };
        assert_eq!(
            classify_transport_error(&err),
            ClassificationResult::failure(
                FailureKind::NetworkError,
                "Error: error sending request: connection refused"
            )
        );
    }
}
