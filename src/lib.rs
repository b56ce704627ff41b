/*!

# git credential helper for the Secret Service

This crate implements a
[git credential helper](https://git-scm.com/docs/gitcredentials)
that keeps credentials in the freedesktop Secret Service, accessed via the
[dbus-secret-service crate](https://crates.io/crates/dbus-secret-service).

## Protocol

The helper is run with a single operation name, `get`, `store` or `erase`,
and reads a credential description from standard input:

```text
protocol=https
host=example.com
username=alice

```

Each line is `key=value`; the description ends at a blank line or at
end of input. Unknown keys are ignored. Output is only produced by a
`get` that found a stored credential, and consists of the `username`
and `password` lines only.

Any other operation name is accepted and ignored, so that newer versions
of git can add operations without breaking this helper.

## Operations

- `get` needs a protocol and a host or path. The first stored match
  provides the password, and the username if none was given.
- `store` needs protocol, host or path, username and password, and
  replaces any credential already stored under the same key.
- `erase` needs at least one of protocol, host, path or username, and
  deletes the first stored match. An empty description erases nothing.

A description that doesn't meet these requirements is not an error: the
operation quietly does nothing. Neither is an empty search result, nor a
dismissed unlock prompt. Failures to talk to the Secret Service are
always errors, and nothing is written to standard output after one.

## Ambiguity

When several stored items match a `get` or `erase`, the helper acts on
the first one in the order the Secret Service returned them (items that
were already unlocked come before items that had to be unlocked). Other
matches are left alone.

## Attributes

Items use the GNOME Keyring network-password schema, so credentials
stored by older GNOME Keyring based helpers are found as well. See the
[store] module for the attribute layout.

 */

pub mod backend;
pub mod cred;
pub mod errors;
pub mod operation;
pub mod protocol;
mod service;
pub mod store;
pub use operation::{Operation, dispatch};
pub use store::Store;
