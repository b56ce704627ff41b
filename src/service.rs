/*!

Shared secret-service access.

This module provides mutex-protected access to the Secret Service
connection that a [Store](crate::Store) uses for all its requests.

*/

#[cfg(not(any(feature = "crypto-rust", feature = "crypto-openssl")))]
compile_error!("You must enable one of the features crypto-rust or crypto-openssl");

use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{decode_error, platform_failure};
use dbus_secret_service::{EncryptionType, Item, Path, SecretService};
use keyring_core::{Error, Result};
use zeroize::Zeroizing;

pub(crate) struct Service {
    ss: Mutex<SecretService>,
}

impl Service {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            ss: Mutex::new(SecretService::connect(EncryptionType::Dh).map_err(platform_failure)?),
        })
    }

    /// Find the items (across all collections) that carry all the given attributes.
    ///
    /// Locked items are unlocked so their secrets can be read; they are
    /// listed after the items that were already unlocked. If the user
    /// dismisses the unlock prompt, only the already-unlocked items are
    /// returned, and `None` if there were none.
    pub(crate) fn find_matching_items(
        &self,
        attributes: &HashMap<&str, &str>,
    ) -> Result<Option<Vec<Path<'static>>>> {
        let ss = self
            .ss
            .lock()
            .expect("Mutex failure in credential helper: please report a bug");
        let search = ss.search_items(attributes.clone()).map_err(decode_error)?;
        let unlock = if search.locked.is_empty() {
            Ok(())
        } else {
            let item_refs: Vec<&Item> = search.locked.iter().collect();
            ss.unlock_all(item_refs.as_slice()).map(|_| ())
        };
        let unlocked: Vec<Path<'static>> = search.unlocked.iter().map(|i| i.path.clone()).collect();
        let locked: Vec<Path<'static>> = search.locked.iter().map(|i| i.path.clone()).collect();
        combine_search(unlocked, locked, unlock)
    }

    /// Create an item in the named collection, replacing any item with identical attributes.
    pub(crate) fn create_item(
        &self,
        collection: &str,
        label: &str,
        attributes: HashMap<&str, &str>,
        secret: &[u8],
    ) -> Result<()> {
        let ss = self
            .ss
            .lock()
            .expect("Mutex failure in credential helper: please report a bug");
        let collection = match util::get_collection(&ss, collection) {
            Ok(c) => c,
            Err(Error::NoEntry) => util::create_collection(&ss, collection)?,
            Err(e) => return Err(e),
        };
        collection
            .create_item(
                label,
                attributes,
                secret,
                true, // replace
                "text/plain",
            )
            .map_err(platform_failure)?;
        Ok(())
    }

    /// Given an existing item's path, retrieve its secret.
    pub(crate) fn get_secret(&self, path: &Path<'static>) -> Result<Zeroizing<Vec<u8>>> {
        let ss = self
            .ss
            .lock()
            .expect("Mutex failure in credential helper: please report a bug");
        let item = Item::new(&ss, path.clone());
        let secret = item.get_secret().map_err(decode_error)?;
        Ok(Zeroizing::new(secret))
    }

    /// Given an existing item's path, retrieve its attributes.
    pub(crate) fn get_attributes(&self, path: &Path<'static>) -> Result<HashMap<String, String>> {
        let ss = self
            .ss
            .lock()
            .expect("Mutex failure in credential helper: please report a bug");
        let item = Item::new(&ss, path.clone());
        let attributes = item.get_attributes().map_err(decode_error)?;
        Ok(attributes)
    }

    // Given an existing item's path, delete it.
    pub(crate) fn delete(&self, path: &Path<'static>) -> Result<()> {
        let ss = self
            .ss
            .lock()
            .expect("Mutex failure in credential helper: please report a bug");
        let item = Item::new(&ss, path.clone());
        item.delete().map_err(decode_error)
    }
}

/// Merge the two halves of a search once unlocking the locked half has been tried.
///
/// A dismissed prompt only loses the locked items.
fn combine_search<P>(
    unlocked: Vec<P>,
    locked: Vec<P>,
    unlock: std::result::Result<(), dbus_secret_service::Error>,
) -> Result<Option<Vec<P>>> {
    match unlock {
        Ok(()) => Ok(Some(unlocked.into_iter().chain(locked).collect())),
        Err(dbus_secret_service::Error::Prompt) if unlocked.is_empty() => Ok(None),
        Err(dbus_secret_service::Error::Prompt) => Ok(Some(unlocked)),
        Err(e) => Err(decode_error(e)),
    }
}

/// Secret Service utilities: this module is private because these can't
/// be called except from the methods of the Service struct which has
/// made the service connection available.
mod util {
    use super::{Error, Result, decode_error};

    use dbus_secret_service::{Collection, SecretService};

    /// Find the secret service collection whose label is the given name.
    ///
    /// The name `default` is treated specially and is interpreted as naming
    /// the default collection regardless of its label (which might be different).
    pub(crate) fn get_collection<'a>(ss: &'a SecretService, name: &str) -> Result<Collection<'a>> {
        let collection = if name.eq("default") {
            ss.get_default_collection().map_err(decode_error)?
        } else {
            let all = ss.get_all_collections().map_err(decode_error)?;
            let found = all
                .into_iter()
                .find(|c| c.get_label().map(|l| l.eq(name)).unwrap_or(false));
            found.ok_or(Error::NoEntry)?
        };
        if collection.is_locked().map_err(decode_error)? {
            collection.unlock().map_err(decode_error)?;
        }
        Ok(collection)
    }

    /// Create a secret service collection labeled with the given name.
    pub(crate) fn create_collection<'a>(
        ss: &'a SecretService,
        name: &str,
    ) -> Result<Collection<'a>> {
        let collection = if name.to_ascii_lowercase().eq("default") {
            ss.get_default_collection().map_err(decode_error)?
        } else {
            ss.create_collection(name, "").map_err(decode_error)?
        };
        Ok(collection)
    }
}
