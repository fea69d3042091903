use crate::errors::*;
use std::collections::BTreeMap;

/// Largest id accepted in a request. `(uid_t)-1` is excluded since
/// `setresuid()`/`setresgid()` read it as "leave this slot unchanged".
pub const MAX_ID: i64 = (libc::uid_t::MAX - 1) as i64;

/// One side (user or group) of an identity request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdSpec {
    /// Not given
    Absent,
    /// A numeric uid or gid, range-checked before use
    Numeric(i64),
    /// A user or group name, looked up in the system databases
    Named(String),
}

impl Default for IdSpec {
    fn default() -> Self {
        IdSpec::Absent
    }
}

impl IdSpec {
    /// Read an id from configuration text: decimal digits are a numeric id,
    /// anything else is a name. Digit strings too large for an `i64` saturate,
    /// so they are still rejected as out of range.
    pub fn parse<T: AsRef<str>>(s: T) -> Self {
        let s = s.as_ref();
        if !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit()) {
            return IdSpec::Numeric(s.parse::<i64>().unwrap_or(i64::MAX));
        }
        IdSpec::Named(s.to_owned())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, IdSpec::Absent)
    }

    fn validate(&self, field: &'static str) -> Result<(), SwitchError> {
        match self {
            IdSpec::Absent => Ok(()),
            IdSpec::Numeric(id) if *id < 0 || *id > MAX_ID => Err(SwitchError::detail(
                ErrorKind::BadRequestShape,
                field,
                format!("id {} out of range", id),
            )),
            IdSpec::Numeric(_) => Ok(()),
            IdSpec::Named(name) if name.is_empty() => {
                Err(SwitchError::from((ErrorKind::BadRequestShape, field, "empty name")))
            }
            IdSpec::Named(name) if name.contains('\0') => Err(SwitchError::from((
                ErrorKind::BadRequestShape,
                field,
                "name contains a NUL byte",
            ))),
            IdSpec::Named(_) => Ok(()),
        }
    }
}

impl From<u32> for IdSpec {
    fn from(id: u32) -> Self {
        IdSpec::Numeric(i64::from(id))
    }
}

impl From<i64> for IdSpec {
    fn from(id: i64) -> Self {
        IdSpec::Numeric(id)
    }
}

impl From<&str> for IdSpec {
    fn from(name: &str) -> Self {
        IdSpec::Named(name.to_owned())
    }
}

impl From<String> for IdSpec {
    fn from(name: String) -> Self {
        IdSpec::Named(name)
    }
}

impl<T: Into<IdSpec>> From<Option<T>> for IdSpec {
    fn from(v: Option<T>) -> Self {
        v.map_or(IdSpec::Absent, Into::into)
    }
}

/// A dynamically-typed configuration value, as handed over by the host's
/// configuration layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// No value
    Nil,
    Boolean(bool),
    Integer(i64),
    /// Accepted as an id only when it has no fractional part
    Float(f64),
    String(String),
    /// A mapping from keys to values
    Table(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Nil => "nil",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Integer(_) | ConfigValue::Float(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::Table(_) => "table",
        }
    }
}

/// The user and group a process asks to become
///
/// # Example
/// ```
/// use privswitch::IdentityRequest;
///
/// let request = IdentityRequest::default().user("nobody").group(65534u32);
/// assert!(!request.gid.is_absent());
/// ```
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct IdentityRequest {
    pub gid: IdSpec,
    pub uid: IdSpec,
    /// Leave the supplementary group list untouched
    pub keep_supplementary: bool,
}

impl IdentityRequest {
    /// Set the user to switch to, by name or numeric id
    pub fn user<T: Into<IdSpec>>(mut self, user: T) -> Self {
        self.uid = user.into();
        self
    }

    /// Set the group to switch to, if different from the primary group of the user
    pub fn group<T: Into<IdSpec>>(mut self, group: T) -> Self {
        self.gid = group.into();
        self
    }

    /// Don't replace the supplementary group list with the target group.
    /// The process then keeps every supplementary group it started with,
    /// including root's.
    pub fn keep_supplementary_groups(mut self) -> Self {
        self.keep_supplementary = true;
        self
    }

    /// Build a request from a configuration value shaped as
    /// `{ gid = number|string, uid = number|string }`. `Nil` means no
    /// identity was declared. Keys other than `gid` and `uid` are ignored.
    pub fn from_value(value: &ConfigValue) -> Result<Option<Self>, SwitchError> {
        let table = match value {
            ConfigValue::Nil => return Ok(None),
            ConfigValue::Table(table) => table,
            other => {
                return Err(SwitchError::detail(
                    ErrorKind::BadRequestShape,
                    "request",
                    format!("expected a table, got {}", other.type_name()),
                ))
            }
        };
        let request = IdentityRequest {
            gid: field(table, "gid")?,
            uid: field(table, "uid")?,
            keep_supplementary: false,
        };
        Ok(Some(request))
    }

    /// Check that both fields hold usable ids or names
    pub fn validate(&self) -> Result<(), SwitchError> {
        self.gid.validate("gid")?;
        self.uid.validate("uid")?;
        match (&self.gid, &self.uid) {
            (IdSpec::Absent, IdSpec::Numeric(_)) => Err(Self::numeric_uid_without_gid()),
            _ => Ok(()),
        }
    }

    /// A numeric uid has no passwd entry to take a primary group from
    pub(crate) fn numeric_uid_without_gid() -> SwitchError {
        SwitchError::from((
            ErrorKind::BadRequestShape,
            "gid",
            "a numeric uid needs an explicit gid",
        ))
    }
}

fn field(table: &BTreeMap<String, ConfigValue>, name: &'static str) -> Result<IdSpec, SwitchError> {
    let spec = match table.get(name) {
        None | Some(ConfigValue::Nil) => IdSpec::Absent,
        Some(ConfigValue::Integer(id)) => IdSpec::Numeric(*id),
        Some(ConfigValue::Float(id)) if id.fract() == 0.0 => IdSpec::Numeric(*id as i64),
        Some(ConfigValue::String(s)) => IdSpec::Named(s.clone()),
        Some(other) => {
            return Err(SwitchError::detail(
                ErrorKind::BadRequestShape,
                name,
                format!("{} wrong type ({})", name, other.type_name()),
            ))
        }
    };
    spec.validate(name)?;
    Ok(spec)
}
