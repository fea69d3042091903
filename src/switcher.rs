use crate::errors::*;
use crate::identity::*;
use crate::request::*;
use nix::unistd::{Gid, Uid};
use std::fmt;

/// Why a switch was deliberately not attempted
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No identity was declared
    NotRequested,
    /// Neither the real nor the effective uid is root, so there is nothing to give up
    NotPrivileged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotRequested => f.write_str("not electing to switch userid"),
            SkipReason::NotPrivileged => f.write_str("not running as root, can't switch userid"),
        }
    }
}

/// A fully resolved target identity
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub uid: Uid,
    pub gid: Gid,
    /// `false` when `gid` was taken from the user's passwd entry
    pub gid_explicitly_set: bool,
}

/// Severity of the log record reporting an outcome
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A deliberate no-op or a successful switch
    Notice,
    /// Any failure
    Error,
}

impl Severity {
    /// `log` has no notice level; it is reported as `Info`.
    pub fn log_level(self) -> log::Level {
        match self {
            Severity::Notice => log::Level::Info,
            Severity::Error => log::Level::Error,
        }
    }
}

/// Result of a switch attempt
#[derive(Debug)]
pub enum SwitchOutcome {
    /// Nothing was changed, on purpose
    Skipped(SkipReason),
    /// The group and the user were both committed
    Succeeded(ResolvedIdentity),
    /// The first failure; later stages never ran
    Failed(SwitchError),
}

impl SwitchOutcome {
    /// `Error` for failures, `Notice` otherwise
    pub fn severity(&self) -> Severity {
        match self {
            SwitchOutcome::Failed(_) => Severity::Error,
            _ => Severity::Notice,
        }
    }

    /// Whether the host must abort its startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, SwitchOutcome::Failed(_))
    }

    /// `Ok(Some(_))` after a switch, `Ok(None)` when it was skipped
    pub fn into_result(self) -> Result<Option<ResolvedIdentity>, SwitchError> {
        match self {
            SwitchOutcome::Skipped(_) => Ok(None),
            SwitchOutcome::Succeeded(resolved) => Ok(Some(resolved)),
            SwitchOutcome::Failed(e) => Err(e),
        }
    }

    /// Emit the single log record describing this outcome
    pub fn report(&self) {
        log::log!(target: "privswitch", self.severity().log_level(), "{}", self);
    }
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchOutcome::Skipped(reason) => reason.fmt(f),
            SwitchOutcome::Succeeded(resolved) => write!(
                f,
                "successfully switched userid to uid={} gid={}",
                resolved.uid, resolved.gid
            ),
            SwitchOutcome::Failed(e) => e.fmt(f),
        }
    }
}

/// Switches a root process to a configured user and group, once.
///
/// # Example
/// ```no_run
/// use privswitch::{IdentityRequest, Switcher, SystemIdentity};
///
/// let request = IdentityRequest::default().user("nobody");
/// let outcome = Switcher::new(SystemIdentity).switch(Some(&request));
/// if outcome.is_fatal() {
///     std::process::exit(1);
/// }
/// ```
#[derive(Debug)]
pub struct Switcher<I: ProcessIdentity> {
    identity: I,
}

impl<I: ProcessIdentity> Switcher<I> {
    /// Create a switcher operating on `identity`
    pub fn new(identity: I) -> Self {
        Switcher { identity }
    }

    /// The process identity handle
    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Give back the process identity handle
    pub fn into_identity(self) -> I {
        self.identity
    }

    /// Switch to the requested identity and log the outcome
    pub fn switch(&mut self, request: Option<&IdentityRequest>) -> SwitchOutcome {
        let outcome = self.run(request);
        outcome.report();
        outcome
    }

    /// Same as `switch()`, reading the request from a configuration value
    pub fn switch_value(&mut self, value: &ConfigValue) -> SwitchOutcome {
        let outcome = self.run_value(value);
        outcome.report();
        outcome
    }

    fn run_value(&mut self, value: &ConfigValue) -> SwitchOutcome {
        if let ConfigValue::Nil = value {
            return SwitchOutcome::Skipped(SkipReason::NotRequested);
        }
        if !self.identity.is_privileged() {
            return SwitchOutcome::Skipped(SkipReason::NotPrivileged);
        }
        match IdentityRequest::from_value(value) {
            Ok(Some(request)) => self.run_privileged(&request),
            Ok(None) => SwitchOutcome::Skipped(SkipReason::NotRequested),
            Err(e) => SwitchOutcome::Failed(e),
        }
    }

    fn run(&mut self, request: Option<&IdentityRequest>) -> SwitchOutcome {
        let request = match request {
            None => return SwitchOutcome::Skipped(SkipReason::NotRequested),
            Some(request) => request,
        };
        if !self.identity.is_privileged() {
            return SwitchOutcome::Skipped(SkipReason::NotPrivileged);
        }
        self.run_privileged(request)
    }

    fn run_privileged(&mut self, request: &IdentityRequest) -> SwitchOutcome {
        let resolved = match self.resolve(request) {
            Ok(resolved) => resolved,
            Err(e) => return SwitchOutcome::Failed(e),
        };
        match self.apply(&resolved, request.keep_supplementary) {
            Ok(()) => SwitchOutcome::Succeeded(resolved),
            Err(e) => SwitchOutcome::Failed(e),
        }
    }

    /// Resolve names to ids without changing anything
    pub fn resolve(&self, request: &IdentityRequest) -> Result<ResolvedIdentity, SwitchError> {
        request.validate()?;
        let gid = match request.gid {
            IdSpec::Absent => None,
            IdSpec::Numeric(id) => Some(Gid::from_raw(id as libc::gid_t)),
            IdSpec::Named(ref name) => match self.identity.group_by_name(name) {
                Ok(Some(gid)) => Some(gid),
                Ok(None) => {
                    return Err(SwitchError::detail(
                        ErrorKind::GroupLookupFailed,
                        "getgrnam()",
                        format!("no such group: {}", name),
                    ))
                }
                Err(e) => return Err(SwitchError::sys(ErrorKind::GroupLookupFailed, "getgrnam()", e)),
            },
        };
        let (uid, primary_gid) = match request.uid {
            IdSpec::Absent => {
                return Err(SwitchError::from((
                    ErrorKind::MissingUser,
                    "uid",
                    "missing uid",
                )))
            }
            IdSpec::Numeric(id) => (Uid::from_raw(id as libc::uid_t), None),
            IdSpec::Named(ref name) => match self.identity.user_by_name(name) {
                Ok(Some(pwent)) => (pwent.uid, Some(pwent.gid)),
                Ok(None) => {
                    return Err(SwitchError::detail(
                        ErrorKind::UserLookupFailed,
                        "getpwnam()",
                        format!("no such user: {}", name),
                    ))
                }
                Err(e) => return Err(SwitchError::sys(ErrorKind::UserLookupFailed, "getpwnam()", e)),
            },
        };
        let gid_explicitly_set = gid.is_some();
        let gid = match (gid, primary_gid) {
            (Some(gid), _) | (None, Some(gid)) => gid,
            (None, None) => return Err(IdentityRequest::numeric_uid_without_gid()),
        };
        Ok(ResolvedIdentity {
            uid,
            gid,
            gid_explicitly_set,
        })
    }

    /// Group first, while still root: once the uid is dropped the group can't be changed.
    /// Supplementary groups go before the gid, or root's groups survive the switch.
    fn apply(&mut self, resolved: &ResolvedIdentity, keep_supplementary: bool) -> Result<(), SwitchError> {
        if !keep_supplementary {
            self.identity
                .set_supplementary_groups(&[resolved.gid])
                .map_err(|e| SwitchError::sys(ErrorKind::GroupApplyFailed, "setgroups()", e))?;
        }
        self.identity
            .set_resgid(resolved.gid)
            .map_err(|e| SwitchError::sys(ErrorKind::GroupApplyFailed, "setresgid()", e))?;
        self.identity
            .set_resuid(resolved.uid)
            .map_err(|e| SwitchError::sys(ErrorKind::UserApplyFailed, "setresuid()", e))
    }
}

/// Switch the current process to the identity described by `value`
pub fn switch(value: &ConfigValue) -> SwitchOutcome {
    Switcher::new(SystemIdentity).switch_value(value)
}
