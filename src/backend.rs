/*!

The interface this helper needs from a secret store.

A backend answers three requests: find the entries matching a
[Query], create or replace the entry for a fully specified query, and
delete one previously found entry. Lookups distinguish "nothing
matched" and "the user cancelled" from real failures; both are normal
outcomes. Any `Err` a backend returns is treated as fatal by the
operations.

Operations only ever act on the first match, so a backend may stop
reading after it: see [first_match].

*/

use keyring_core::Result;
use zeroize::Zeroizing;

use crate::cred::Query;

/// One stored entry that satisfied a query.
pub struct Match<H> {
    pub username: Option<String>,
    pub password: Zeroizing<Vec<u8>>,
    /// Backend-specific reference used to delete this entry.
    pub handle: H,
}

impl<H: std::fmt::Debug> std::fmt::Debug for Match<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("username", &self.username)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// The result of a lookup.
#[derive(Debug)]
pub enum Lookup<H> {
    /// Matches in the backend's own order; operations act on the first.
    Found(Vec<Match<H>>),
    NoMatch,
    /// The user (or the environment) declined to unlock the store.
    Cancelled,
}

impl<H> Lookup<H> {
    /// The first match, if there is one.
    ///
    /// An empty `Found` list is the same as no match.
    pub fn into_first(self) -> Option<Match<H>> {
        match self {
            Lookup::Found(matches) => matches.into_iter().next(),
            Lookup::NoMatch | Lookup::Cancelled => None,
        }
    }
}

/// Build a lookup from the handles a search returned, in order.
///
/// Only the first handle is read, so an unreadable entry further down
/// the list can't fail a lookup whose answer doesn't depend on it.
pub fn first_match<H>(
    handles: Vec<H>,
    read: impl FnOnce(H) -> Result<Match<H>>,
) -> Result<Lookup<H>> {
    match handles.into_iter().next() {
        Some(first) => Ok(Lookup::Found(vec![read(first)?])),
        None => Ok(Lookup::NoMatch),
    }
}

pub trait Backend {
    type Handle;

    /// Find stored entries matching `query`.
    fn find(&self, query: &Query<'_>) -> Result<Lookup<Self::Handle>>;

    /// Create the entry for `query`, replacing any entry already stored under it.
    fn upsert(&self, query: &Query<'_>, password: &[u8]) -> Result<()>;

    /// Delete an entry returned by [Backend::find].
    fn delete(&self, handle: &Self::Handle) -> Result<()>;
}

impl<T: Backend + ?Sized> Backend for &T {
    type Handle = T::Handle;

    fn find(&self, query: &Query<'_>) -> Result<Lookup<Self::Handle>> {
        (**self).find(query)
    }

    fn upsert(&self, query: &Query<'_>, password: &[u8]) -> Result<()> {
        (**self).upsert(query, password)
    }

    fn delete(&self, handle: &Self::Handle) -> Result<()> {
        (**self).delete(handle)
    }
}
