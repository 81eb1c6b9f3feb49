use crate::binding::ValueShape;
use crate::device::DeviceFamily;

/// Binding configuration is missing or cannot drive the dispatcher.
///
/// Fatal to activation: the dispatcher stays inert until a valid set is supplied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no binding set supplied")]
    MissingBindingSet,
    #[error("action map `{0}` not found in binding set")]
    MissingActionMap(String),
    #[error("required action `{action}` missing from map `{map}`")]
    MissingAction { map: String, action: String },
    #[error("action `{action}` declared as {declared}, expected {expected}")]
    ShapeMismatch {
        action: String,
        declared: ValueShape,
        expected: ValueShape,
    },
    #[error("action `{action}`: {reason}")]
    MalformedSource { action: String, reason: String },
    #[error("action `{0}` declared more than once")]
    DuplicateAction(String),
    #[error("invalid source path `{path}`: {reason}")]
    InvalidSourcePath { path: String, reason: String },
}

/// Subscribe or read against an action name nothing declares.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{0}`")]
pub struct UnknownActionError(pub String);

/// Failure to turn one raw reading into an action value.
///
/// Only ever logged; the affected action is skipped for the rest of the poll.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("{family} control `{control}` reported a {got} value, action expects {expected}")]
    ValueKind {
        family: DeviceFamily,
        control: String,
        got: &'static str,
        expected: ValueShape,
    },
    #[error("axis component requested from non-vector control `{0}`")]
    ComponentOfNonVector(String),
    #[error("non-finite value from control `{0}`")]
    NonFinite(String),
}

/// Errors reading a binding set from disk or text.
#[derive(Debug, thiserror::Error)]
pub enum BindingLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
