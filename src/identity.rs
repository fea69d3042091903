use nix::unistd::{self, Gid, Group, Uid, User};

/// The fields of a passwd entry needed to switch to that user
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PasswdEntry {
    pub uid: Uid,
    pub gid: Gid,
}

/// Credentials of the running process, and the user/group databases used to
/// resolve names.
///
/// Lookups return `Ok(None)` when the entry doesn't exist and `Err` when the
/// database couldn't be read. Each `set_*` call must change all of its slots
/// or none of them.
pub trait ProcessIdentity {
    /// Whether the process is running as the superuser, by its real or effective uid
    fn is_privileged(&self) -> bool;

    fn group_by_name(&self, name: &str) -> nix::Result<Option<Gid>>;

    fn user_by_name(&self, name: &str) -> nix::Result<Option<PasswdEntry>>;

    /// Replace the supplementary group list
    fn set_supplementary_groups(&mut self, groups: &[Gid]) -> nix::Result<()>;

    /// Set the real, effective and saved group ids
    fn set_resgid(&mut self, gid: Gid) -> nix::Result<()>;

    /// Set the real, effective and saved user ids
    fn set_resuid(&mut self, uid: Uid) -> nix::Result<()>;
}

/// The credentials of the current process, as seen by the operating system
#[derive(Default, Copy, Clone, Debug)]
pub struct SystemIdentity;

impl ProcessIdentity for SystemIdentity {
    fn is_privileged(&self) -> bool {
        unistd::getuid().is_root() || unistd::geteuid().is_root()
    }

    fn group_by_name(&self, name: &str) -> nix::Result<Option<Gid>> {
        Ok(Group::from_name(name)?.map(|group| group.gid))
    }

    fn user_by_name(&self, name: &str) -> nix::Result<Option<PasswdEntry>> {
        Ok(User::from_name(name)?.map(|user| PasswdEntry {
            uid: user.uid,
            gid: user.gid,
        }))
    }

    fn set_supplementary_groups(&mut self, groups: &[Gid]) -> nix::Result<()> {
        unistd::setgroups(groups)
    }

    fn set_resgid(&mut self, gid: Gid) -> nix::Result<()> {
        unistd::setresgid(gid, gid, gid)
    }

    fn set_resuid(&mut self, uid: Uid) -> nix::Result<()> {
        unistd::setresuid(uid, uid, uid)
    }
}
