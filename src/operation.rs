/*!

Helper operations and their dispatch.

Each operation checks that the credential it was given makes sense
for it before touching the backend. A credential that doesn't is not
an error: the operation simply does nothing, since callers may ask
with incomplete descriptions. Backend failures, on the other hand, are
always returned to the caller, and [dispatch] writes no output once
one has occurred.

Only a lookup that found something has anything to tell the caller, so
[dispatch] writes the credential back only when the operation reports
[Outcome::Filled].

*/

use std::io::{BufRead, Write};

use keyring_core::{Error, Result};
use log::{debug, warn};

use crate::backend::{Backend, Lookup};
use crate::cred::Credential;
use crate::protocol::{read_credential, write_credential};

/// What an operation did to the credential it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fields were filled in from the backend.
    Filled,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Retrieve,
    Store,
    Erase,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Retrieve, Operation::Store, Operation::Erase];

    /// Look up an operation by its protocol name.
    ///
    /// Names this helper doesn't know return `None`; callers treat them
    /// as a successful no-op so that new operations don't break old helpers.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Retrieve => "get",
            Operation::Store => "store",
            Operation::Erase => "erase",
        }
    }

    /// Whether this operation has enough to work with.
    pub fn applies_to(&self, cred: &Credential) -> bool {
        match self {
            Operation::Retrieve => cred.has_lookup_key(),
            Operation::Store => {
                cred.has_lookup_key() && cred.username.is_some() && cred.password.is_some()
            }
            // An empty pattern would match every stored entry.
            Operation::Erase => {
                cred.protocol.is_some()
                    || cred.host.is_some()
                    || cred.path.is_some()
                    || cred.username.is_some()
            }
        }
    }

    pub fn run(&self, cred: &mut Credential, backend: &impl Backend) -> Result<Outcome> {
        match self {
            Operation::Retrieve => retrieve(cred, backend),
            Operation::Store => store(cred, backend),
            Operation::Erase => erase(cred, backend),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fill in the password (and, if unset, the username) from the first match.
pub fn retrieve(cred: &mut Credential, backend: &impl Backend) -> Result<Outcome> {
    if !Operation::Retrieve.applies_to(cred) {
        return Ok(Outcome::Unchanged);
    }
    let lookup = backend.find(&cred.query())?;
    log_lookup(&lookup);
    let Some(found) = lookup.into_first() else {
        return Ok(Outcome::Unchanged);
    };
    cred.password = Some(found.password);
    if cred.username.is_none() {
        cred.username = found.username;
    }
    Ok(Outcome::Filled)
}

/// Save the credential, replacing whatever was stored under the same key.
pub fn store(cred: &mut Credential, backend: &impl Backend) -> Result<Outcome> {
    if !Operation::Store.applies_to(cred) {
        return Ok(Outcome::Unchanged);
    }
    let Some(password) = cred.password() else {
        return Ok(Outcome::Unchanged);
    };
    backend.upsert(&cred.query(), password)?;
    Ok(Outcome::Unchanged)
}

/// Delete the first stored entry matching the credential.
pub fn erase(cred: &mut Credential, backend: &impl Backend) -> Result<Outcome> {
    if !Operation::Erase.applies_to(cred) {
        return Ok(Outcome::Unchanged);
    }
    let lookup = backend.find(&cred.query())?;
    log_lookup(&lookup);
    if let Some(found) = lookup.into_first() {
        backend.delete(&found.handle)?;
    }
    Ok(Outcome::Unchanged)
}

fn log_lookup<H>(lookup: &Lookup<H>) {
    match lookup {
        Lookup::Found(matches) => debug!("lookup found {} match(es)", matches.len()),
        Lookup::NoMatch => debug!("lookup found no match"),
        Lookup::Cancelled => debug!("lookup was cancelled"),
    }
}

/// Run one helper invocation: read, operate, write.
///
/// The backend is only opened when the operation applies to the
/// credential that was read. If opening it, or the operation itself,
/// fails, the error is returned and nothing is written to `output`.
/// Otherwise the credential is written only if it was filled in.
pub fn dispatch<B, F>(
    op: Operation,
    input: &mut impl BufRead,
    output: &mut impl Write,
    open_backend: F,
) -> Result<()>
where
    B: Backend,
    F: FnOnce() -> Result<B>,
{
    let mut cred = Credential::new();
    if let Err(err) = read_credential(input, &mut cred) {
        warn!("{err}");
    }
    debug!("running {op} on {cred:?}");
    let outcome = if op.applies_to(&cred) {
        let backend = open_backend()?;
        op.run(&mut cred, &backend)?
    } else {
        debug!("nothing to {op}");
        Outcome::Unchanged
    };
    if outcome == Outcome::Filled {
        write_credential(output, &cred).map_err(|e| Error::PlatformFailure(Box::new(e)))?;
    }
    cred.clear();
    Ok(())
}
