/*!

Error conversions.

Backend failures are reported in the `keyring_core` error vocabulary,
so callers see the same kinds of failure they would see from any other
keyring store. Malformed helper input has its own, much smaller, error
type: it is never fatal, so it never needs to travel as a store error.

*/

use std::fmt;
use std::io;

use keyring_core::Error;

/// Map an underlying Secret Service error to a platform-independent error.
///
/// Locked or inaccessible collections are storage-access problems;
/// everything else is a platform failure.
pub(crate) fn decode_error(err: dbus_secret_service::Error) -> Error {
    match err {
        dbus_secret_service::Error::Locked => no_access(err),
        dbus_secret_service::Error::NoResult => no_access(err),
        dbus_secret_service::Error::Prompt => no_access(err),
        _ => platform_failure(err),
    }
}

pub(crate) fn platform_failure(err: dbus_secret_service::Error) -> Error {
    Error::PlatformFailure(wrap(err))
}

pub(crate) fn no_access(err: dbus_secret_service::Error) -> Error {
    Error::NoStorageAccess(wrap(err))
}

fn wrap(err: dbus_secret_service::Error) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(err)
}

/// A failure while reading a credential description.
#[derive(Debug)]
pub enum ProtocolError {
    /// A non-blank line without a `=` separator.
    InvalidLine(String),
    /// The input could not be read (or was not UTF-8).
    Io(io::Error),
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        ProtocolError::Io(e)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidLine(line) => write!(f, "invalid credential line: {line}"),
            ProtocolError::Io(e) => write!(f, "failed to read credential: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::InvalidLine(_) => None,
            ProtocolError::Io(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_is_no_access() {
        match decode_error(dbus_secret_service::Error::Locked) {
            Error::NoStorageAccess(_) => (),
            other => panic!("Locked decoded as {other:?}"),
        }
    }

    #[test]
    fn test_invalid_line_names_the_line() {
        let err = ProtocolError::InvalidLine("garbageline".to_string());
        assert_eq!(err.to_string(), "invalid credential line: garbageline");
    }
}
