use crate::feedback::tools::error::RemoteError;

/// Outcome of a remote operation.
///
/// `Empty` means the service answered without a payload. It is not an
/// error, and callers must handle it separately from `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult<T> {
    Success(T),
    Empty,
    Error(RemoteError),
}

impl<T> RemoteResult<T> {
    /// True for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResult::Success(_))
    }

    /// True when the service answered without a payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, RemoteResult::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RemoteResult::Error(_))
    }

    /// Transforms a successful value. `Empty` and `Error` pass through.
    pub fn map<U, F>(self, f: F) -> RemoteResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            RemoteResult::Success(value) => RemoteResult::Success(f(value)),
            RemoteResult::Empty => RemoteResult::Empty,
            RemoteResult::Error(error) => RemoteResult::Error(error),
        }
    }

    /// Chains a step that can itself come back empty or fail.
    pub fn and_then<U, F>(self, f: F) -> RemoteResult<U>
    where
        F: FnOnce(T) -> RemoteResult<U>,
    {
        match self {
            RemoteResult::Success(value) => f(value),
            RemoteResult::Empty => RemoteResult::Empty,
            RemoteResult::Error(error) => RemoteResult::Error(error),
        }
    }

    /// Replaces `Empty` with a successful fallback value.
    pub fn or_empty(self, fallback: T) -> RemoteResult<T> {
        match self {
            RemoteResult::Empty => RemoteResult::Success(fallback),
            other => other,
        }
    }

    /// The successful value, discarding the difference between `Empty` and
    /// `Error`.
    pub fn success(self) -> Option<T> {
        match self {
            RemoteResult::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Converts into a standard result, keeping `Empty` as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, RemoteError> {
        match self {
            RemoteResult::Success(value) => Ok(Some(value)),
            RemoteResult::Empty => Ok(None),
            RemoteResult::Error(error) => Err(error),
        }
    }
}

impl<T> From<RemoteError> for RemoteResult<T> {
    fn from(error: RemoteError) -> Self {
        RemoteResult::Error(error)
    }
}
