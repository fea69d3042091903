#![allow(dead_code)]

use privswitch::reexports::nix::errno::Errno;
use privswitch::reexports::nix::unistd::{Gid, Uid};
use privswitch::{PasswdEntry, ProcessIdentity};
use std::cell::Cell;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Call {
    SetGroups(u32),
    SetResgid(u32),
    SetResuid(u32),
}

/// An in-memory process whose credentials start as root
#[derive(Debug)]
pub struct FakeIdentity {
    pub uid: u32,
    pub euid: u32,
    pub gid: u32,
    pub privilege_checks: Cell<u32>,
    pub users: Vec<(&'static str, u32, u32)>,
    pub groups: Vec<(&'static str, u32)>,
    pub calls: Vec<Call>,
    pub fail_groups: Option<Errno>,
    pub fail_resgid: Option<Errno>,
    pub fail_resuid: Option<Errno>,
    pub fail_lookups: Option<Errno>,
}

impl FakeIdentity {
    pub fn root() -> Self {
        FakeIdentity {
            uid: 0,
            euid: 0,
            gid: 0,
            privilege_checks: Cell::new(0),
            users: vec![("alice", 1000, 1000), ("www-data", 33, 33)],
            groups: vec![("staff", 50), ("www-data", 33)],
            calls: Vec::new(),
            fail_groups: None,
            fail_resgid: None,
            fail_resuid: None,
            fail_lookups: None,
        }
    }

    pub fn unprivileged() -> Self {
        FakeIdentity {
            uid: 1000,
            euid: 1000,
            gid: 1000,
            ..FakeIdentity::root()
        }
    }

    /// A setuid-root binary run by an ordinary user
    pub fn setuid_root() -> Self {
        FakeIdentity {
            uid: 1000,
            gid: 1000,
            ..FakeIdentity::root()
        }
    }
}

impl ProcessIdentity for FakeIdentity {
    fn is_privileged(&self) -> bool {
        self.privilege_checks.set(self.privilege_checks.get() + 1);
        self.uid == 0 || self.euid == 0
    }

    fn group_by_name(&self, name: &str) -> Result<Option<Gid>, Errno> {
        if let Some(e) = self.fail_lookups {
            return Err(e);
        }
        Ok(self
            .groups
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, gid)| Gid::from_raw(gid)))
    }

    fn user_by_name(&self, name: &str) -> Result<Option<PasswdEntry>, Errno> {
        if let Some(e) = self.fail_lookups {
            return Err(e);
        }
        Ok(self
            .users
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|&(_, uid, gid)| PasswdEntry {
                uid: Uid::from_raw(uid),
                gid: Gid::from_raw(gid),
            }))
    }

    fn set_supplementary_groups(&mut self, groups: &[Gid]) -> Result<(), Errno> {
        self.calls.push(Call::SetGroups(groups[0].as_raw()));
        if let Some(e) = self.fail_groups {
            return Err(e);
        }
        if self.euid != 0 {
            return Err(Errno::EPERM);
        }
        Ok(())
    }

    fn set_resgid(&mut self, gid: Gid) -> Result<(), Errno> {
        self.calls.push(Call::SetResgid(gid.as_raw()));
        if let Some(e) = self.fail_resgid {
            return Err(e);
        }
        if self.euid != 0 {
            return Err(Errno::EPERM);
        }
        self.gid = gid.as_raw();
        Ok(())
    }

    fn set_resuid(&mut self, uid: Uid) -> Result<(), Errno> {
        self.calls.push(Call::SetResuid(uid.as_raw()));
        if let Some(e) = self.fail_resuid {
            return Err(e);
        }
        if self.euid != 0 {
            return Err(Errno::EPERM);
        }
        self.uid = uid.as_raw();
        self.euid = uid.as_raw();
        Ok(())
    }
}
