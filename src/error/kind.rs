//! Failure classification used by retry filtering.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Closed set of failure kinds an operation error can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Assertion,
    InvalidValue,
    Connection,
    Io,
    Timeout,
    Panic,
    Configuration,
    Other,
}

/// Maps an error value onto a [`FailureKind`].
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for std::io::Error {
    fn failure_kind(&self) -> FailureKind {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrNotAvailable
            | ErrorKind::BrokenPipe => FailureKind::Connection,
            ErrorKind::TimedOut => FailureKind::Timeout,
            ErrorKind::InvalidInput | ErrorKind::InvalidData => FailureKind::InvalidValue,
            _ => FailureKind::Io,
        }
    }
}

impl<C: Classify + ?Sized> Classify for Box<C> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_round_trips_through_strings() {
        assert_eq!(FailureKind::InvalidValue.to_string(), "invalid_value");
        assert_eq!(
            "connection".parse::<FailureKind>().unwrap(),
            FailureKind::Connection
        );
        assert!("bogus".parse::<FailureKind>().is_err());
    }

    #[test]
    fn io_errors_are_classified_by_kind() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let other = std::io::Error::new(std::io::ErrorKind::Other, "disk");

        assert_eq!(refused.failure_kind(), FailureKind::Connection);
        assert_eq!(timed_out.failure_kind(), FailureKind::Timeout);
        assert_eq!(other.failure_kind(), FailureKind::Io);
    }
}
