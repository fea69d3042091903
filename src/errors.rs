use std::error::Error;
use std::fmt;

/// Types of errors that can occur while switching identity
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request is not a mapping of optional `gid`/`uid` fields, or holds an unusable id
    BadRequestShape,
    /// The group name could not be found in the group database
    GroupLookupFailed,
    /// The user name could not be found in the passwd database
    UserLookupFailed,
    /// A group was requested without a user to pair it with
    MissingUser,
    /// `setresgid()` (or the supplementary group reset) failed
    GroupApplyFailed,
    /// `setresuid()` failed
    UserApplyFailed,
}

impl ErrorKind {
    /// Stage of the switch this kind of error is raised from
    pub fn stage(self) -> &'static str {
        match self {
            ErrorKind::BadRequestShape => "request",
            ErrorKind::GroupLookupFailed => "resolve-group",
            ErrorKind::UserLookupFailed | ErrorKind::MissingUser => "resolve-user",
            ErrorKind::GroupApplyFailed => "apply-group",
            ErrorKind::UserApplyFailed => "apply-user",
        }
    }
}

#[derive(Debug)]
enum ErrorRepr {
    /// Error returned by the operating system
    FromNix(nix::Error),
    /// Error with a static description
    WithDescription(&'static str),
    /// Error mentioning a value taken from the request
    WithDetail(String),
}

/// Error type for identity switch operations
#[derive(Debug)]
pub struct SwitchError {
    kind: ErrorKind,
    operation: &'static str,
    repr: ErrorRepr,
}

impl SwitchError {
    pub(crate) fn sys(kind: ErrorKind, operation: &'static str, e: nix::Error) -> SwitchError {
        SwitchError {
            kind,
            operation,
            repr: ErrorRepr::FromNix(e),
        }
    }

    pub(crate) fn detail(kind: ErrorKind, operation: &'static str, detail: String) -> SwitchError {
        SwitchError {
            kind,
            operation,
            repr: ErrorRepr::WithDetail(detail),
        }
    }

    /// What went wrong
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Name of the failing operation, e.g. `getgrnam()` or `setresuid()`
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Shorthand for `self.kind().stage()`
    pub fn stage(&self) -> &'static str {
        self.kind.stage()
    }

    /// OS error code, when the failure came from the system
    pub fn errno(&self) -> Option<nix::Error> {
        match self.repr {
            ErrorRepr::FromNix(e) => Some(e),
            _ => None,
        }
    }
}

impl Error for SwitchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.repr {
            ErrorRepr::FromNix(ref e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::FromNix(ref e) => write!(f, "{}: {}", self.operation, e.desc()),
            ErrorRepr::WithDescription(description) => {
                write!(f, "{}: {}", self.operation, description)
            }
            ErrorRepr::WithDetail(ref detail) => write!(f, "{}: {}", self.operation, detail),
        }
    }
}

impl From<(ErrorKind, &'static str, &'static str)> for SwitchError {
    fn from((kind, operation, description): (ErrorKind, &'static str, &'static str)) -> SwitchError {
        SwitchError {
            kind,
            operation,
            repr: ErrorRepr::WithDescription(description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn display_carries_operation_and_cause() {
        let e = SwitchError::sys(ErrorKind::UserApplyFailed, "setresuid()", Errno::EPERM);
        assert_eq!(e.to_string(), "setresuid(): Operation not permitted");
        assert_eq!(e.stage(), "apply-user");
        assert_eq!(e.errno(), Some(Errno::EPERM));
        assert!(e.source().is_some());

        let e = SwitchError::from((ErrorKind::MissingUser, "uid", "missing uid"));
        assert_eq!(e.to_string(), "uid: missing uid");
        assert_eq!(e.stage(), "resolve-user");
        assert!(e.errno().is_none());
        assert!(e.source().is_none());
    }

    #[test]
    fn every_kind_maps_to_a_stage() {
        assert_eq!(ErrorKind::BadRequestShape.stage(), "request");
        assert_eq!(ErrorKind::GroupLookupFailed.stage(), "resolve-group");
        assert_eq!(ErrorKind::UserLookupFailed.stage(), "resolve-user");
        assert_eq!(ErrorKind::GroupApplyFailed.stage(), "apply-group");
    }
}
