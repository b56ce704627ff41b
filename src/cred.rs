/*!

The credential record.

A [Credential] holds the five fields of the git credential protocol
that this helper understands. Every field is optional and independently
replaceable; replacing a field drops the old value first, and the
password is kept as raw bytes in a [Zeroizing] buffer, so that a
replaced or released password does not linger in memory and passwords
that aren't UTF-8 survive unchanged.

The `protocol`/`host`/`path` triple is the lookup key. When a
credential is used as a search pattern, an unset field does not
constrain the search: see [Query].

*/

use zeroize::Zeroizing;

#[derive(Default)]
pub struct Credential {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub username: Option<String>,
    pub password: Option<Zeroizing<Vec<u8>>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Credential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_password(&mut self, password: &[u8]) {
        // dropping the old buffer zeroes it
        self.password = None;
        self.password = Some(Zeroizing::new(password.to_vec()));
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.password.as_deref().map(Vec::as_slice)
    }

    /// Release every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The object identifier under which the backend files this credential.
    ///
    /// This is `host/path` when a path is present, and nothing otherwise.
    pub fn object(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        Some(format!("{}/{}", self.host.as_deref().unwrap_or_default(), path))
    }

    /// Whether there is something to look up: a protocol plus a host or path.
    pub fn has_lookup_key(&self) -> bool {
        self.protocol.is_some() && (self.host.is_some() || self.path.is_some())
    }

    /// Build the search pattern (or storage key) for this credential.
    ///
    /// The object identifier is computed here, so the returned query owns it.
    pub fn query(&self) -> Query<'_> {
        Query {
            protocol: self.protocol.as_deref(),
            host: self.host.as_deref(),
            object: self.object(),
            username: self.username.as_deref(),
        }
    }
}

/// A pattern over stored credentials.
///
/// Unset fields match anything, so an empty query matches every entry
/// in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub protocol: Option<&'a str>,
    pub host: Option<&'a str>,
    pub object: Option<String>,
    pub username: Option<&'a str>,
}

impl Query<'_> {
    pub fn is_empty(&self) -> bool {
        self.protocol.is_none()
            && self.host.is_none()
            && self.object.is_none()
            && self.username.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_needs_path() {
        let mut cred = Credential::new();
        cred.host = Some("example.com".to_string());
        assert_eq!(cred.object(), None);
        cred.path = Some("repo.git".to_string());
        assert_eq!(cred.object().as_deref(), Some("example.com/repo.git"));
    }

    #[test]
    fn test_path_without_host() {
        let mut cred = Credential::new();
        cred.protocol = Some("file".to_string());
        cred.path = Some("srv/repo.git".to_string());
        assert!(cred.has_lookup_key());
        assert_eq!(cred.object().as_deref(), Some("/srv/repo.git"));
    }

    #[test]
    fn test_query_patterns() {
        let mut cred = Credential::new();
        assert!(cred.query().is_empty());
        cred.protocol = Some("https".to_string());
        let query = cred.query();
        assert!(!query.is_empty());
        assert_eq!(query.protocol, Some("https"));
        assert_eq!(query.object, None);
        cred.protocol = None;
        cred.username = Some("bob".to_string());
        assert!(!cred.query().is_empty());
    }

    #[test]
    fn test_password_replace_and_clear() {
        let mut cred = Credential::new();
        cred.set_password(b"first");
        cred.set_password(b"second");
        assert_eq!(cred.password(), Some(&b"second"[..]));
        assert!(!format!("{cred:?}").contains("second"));
        cred.username = Some("alice".to_string());
        cred.clear();
        assert!(cred.username.is_none());
        assert!(cred.password().is_none());
    }
}
