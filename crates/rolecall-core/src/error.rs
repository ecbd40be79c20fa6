#[derive(Debug)]
pub enum RoleError {
    /// The platform refused the action for lack of permission.
    PermissionDenied,
    /// A named role, channel, member, or binding does not exist.
    NotFound(String),
    /// A binding with this role name is already recorded.
    AlreadyBound(String),
    /// The binding table is empty, nothing to publish.
    EmptyBindingSet,
    /// Writing the state file failed; the operation must not report success.
    Persistence(std::io::Error),
    Serde(serde_json::Error),
    /// Any other platform-side failure, carried as a message.
    Platform(String),
}

impl std::fmt::Display for RoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::AlreadyBound(name) => write!(f, "a role named '{name}' is already bound"),
            Self::EmptyBindingSet => write!(f, "no role bindings to publish"),
            Self::Persistence(e) => write!(f, "state persistence failed: {e}"),
            Self::Serde(e) => write!(f, "state serialization failed: {e}"),
            Self::Platform(msg) => write!(f, "platform error: {msg}"),
        }
    }
}

impl std::error::Error for RoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            Self::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RoleError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e)
    }
}

impl From<serde_json::Error> for RoleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e)
    }
}
