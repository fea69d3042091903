/*!
# privswitch

A one-way switch of a root process to an unprivileged user and group.

## Overview

Servers often need to start as root (to bind a low port, open a log file...)
and then continue as a configured user. This crate performs that transition
exactly once, early in startup, and reports the outcome:

- The target user and group can be given by name or by numeric id
- When no group is given, the primary group of the named user is used
- The real, effective and saved ids are all changed, so the switch can't be undone
- The supplementary group list is reduced to the target group
- The group is always changed before the user, while the process is still root

If no identity is requested, or neither the real nor the effective uid is root, nothing
happens and the switch is reported as skipped. Every other outcome is either a
full switch or an error the caller must treat as fatal.

## Basic Example

```no_run
use privswitch::{IdentityRequest, Switcher, SystemIdentity};

fn main() {
    let request = IdentityRequest::default().user("nobody");
    Switcher::new(SystemIdentity)
        .switch(Some(&request))
        .into_result()
        .unwrap_or_else(|e| panic!("Failed to switch identity: {}", e));

    // Continue running as `nobody`...
}
```

## Configuration values

Hosts with a dynamically-typed configuration layer can pass the value as is:

```no_run
use privswitch::ConfigValue;
use std::collections::BTreeMap;

fn main() {
    let mut table = BTreeMap::new();
    table.insert("uid".to_string(), ConfigValue::String("www-data".to_string()));
    table.insert("gid".to_string(), ConfigValue::Integer(33));

    let outcome = privswitch::switch(&ConfigValue::Table(table));
    if outcome.is_fatal() {
        std::process::exit(1);
    }
}
```

## Safety Considerations

Credentials are process-wide. The switch must happen before any other thread
is spawned: a thread running between the group and the user change would see
the new group with the old user.

Exactly one log record is emitted per switch, through the `log` facade.
*/

pub use self::errors::*;
pub use self::identity::*;
pub use self::request::*;
pub use self::switcher::*;

mod errors;
mod identity;
mod request;
mod switcher;

/// Reexported dependencies for use in consuming crates.
///
/// - `libc`: Low-level bindings to the C standard library
/// - `log`: The logging facade outcomes are reported through
/// - `nix`: Rust friendly bindings to *nix APIs, for the `Uid`/`Gid` types
pub mod reexports {
    pub use {libc, log, nix};
}
