/*!

The Secret Service backend.

Credentials are stored as network passwords, using the same schema and
attribute names that GNOME Keyring's network-password API uses:

- `xdg:schema` is always `org.gnome.keyring.NetworkPassword`
- `protocol` holds the credential protocol
- `server` holds the host
- `object` holds `host/path` (only when the credential has a path)
- `user` holds the username

A search only uses the attributes the query has, so e.g. a query
without a username finds entries for every user on that host.

*/

use std::collections::HashMap;

use dbus_secret_service::Path;
use keyring_core::Result;
use log::debug;

use crate::backend::{Backend, Lookup, Match, first_match};
use crate::cred::Query;
use crate::service::Service;

pub const SCHEMA: &str = "org.gnome.keyring.NetworkPassword";

/// The collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "default";

pub struct Store {
    service: Service,
    collection: String,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Connect to the Secret Service.
    ///
    /// New items are created in the collection labeled `collection`
    /// (created on first use); `default` means the default collection.
    /// Lookups always search every collection.
    pub fn new(collection: &str) -> Result<Self> {
        Ok(Self {
            service: Service::new()?,
            collection: collection.to_string(),
        })
    }

    fn read_match(&self, path: Path<'static>) -> Result<Match<Path<'static>>> {
        let mut attributes = self.service.get_attributes(&path)?;
        Ok(Match {
            username: attributes.remove("user"),
            password: self.service.get_secret(&path)?,
            handle: path,
        })
    }
}

/// The item attributes corresponding to a query.
pub fn attributes<'a>(query: &'a Query<'a>) -> HashMap<&'a str, &'a str> {
    let mut attributes = HashMap::from([("xdg:schema", SCHEMA)]);
    let fields = [
        ("protocol", query.protocol),
        ("server", query.host),
        ("object", query.object.as_deref()),
        ("user", query.username),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            attributes.insert(key, value);
        }
    }
    attributes
}

/// The label shown for an item in Secret Service UIs.
pub fn label(query: &Query<'_>) -> String {
    let mut label = format!(
        "git: {}://{}@{}",
        query.protocol.unwrap_or_default(),
        query.username.unwrap_or_default(),
        query.host.unwrap_or_default(),
    );
    if let Some(object) = query.object.as_deref() {
        // the object already starts with the host
        let path = object.split_once('/').map(|(_, p)| p).unwrap_or(object);
        label.push('/');
        label.push_str(path);
    }
    label
}

impl Backend for Store {
    type Handle = Path<'static>;

    fn find(&self, query: &Query<'_>) -> Result<Lookup<Self::Handle>> {
        let Some(paths) = self.service.find_matching_items(&attributes(query))? else {
            return Ok(Lookup::Cancelled);
        };
        debug!("search found {} item(s)", paths.len());
        first_match(paths, |path| self.read_match(path))
    }

    fn upsert(&self, query: &Query<'_>, password: &[u8]) -> Result<()> {
        debug!("storing item in collection {}", self.collection);
        self.service.create_item(
            &self.collection,
            &label(query),
            attributes(query),
            password,
        )
    }

    fn delete(&self, handle: &Self::Handle) -> Result<()> {
        debug!("deleting item {handle:?}");
        self.service.delete(handle)
    }
}
