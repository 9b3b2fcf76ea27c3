//! Domain errors
//!
//! Every expected failure of the dice/group operations is a variant of
//! [`DiceError`]. The command and HTTP boundaries match on it to render a
//! reply; `kind()` and `args()` give an external localizer a stable message
//! key plus the ordered interpolation arguments.

use thiserror::Error;

/// Result alias for domain operations
pub type DiceResult<T> = Result<T, DiceError>;

/// Errors raised by the parser and the dice/group services
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Dice name \"{name}\" is invalid. {tip}")]
    DiceNameInvalid { name: String, tip: String },

    #[error("Group name \"{name}\" is invalid. {tip}")]
    GroupNameInvalid { name: String, tip: String },

    #[error("Roll times \"{0}\" is invalid. It must be a positive integer.")]
    RollTimesInvalid(i64),

    #[error("Dice with ID {0} not found.")]
    DiceIdNotFound(i64),

    #[error("Dice with name \"{0}\" not found.")]
    DiceNameNotFound(String),

    #[error("Group with ID {0} not found.")]
    GroupIdNotFound(i64),

    #[error("Group with name \"{0}\" not found.")]
    GroupNameNotFound(String),

    #[error("Multiple dices found with name \"{0}\". Cannot identify a single dice.")]
    DiceNameNotUnique(String),

    #[error("Multiple groups found with name \"{0}\". Cannot identify a single group.")]
    GroupNameNotUnique(String),

    #[error("Dice with name \"{0}\" already exists.")]
    DiceNameExists(String),

    #[error("Group with name \"{0}\" already exists.")]
    GroupNameExists(String),

    #[error("User with ID {0} has already initialized a group.")]
    GroupAlreadyInitialized(i64),

    #[error("User with ID {0} has not initialized a group.")]
    GroupUninitialized(i64),

    #[error("Dice face \"{0}\" is invalid.")]
    FaceInvalid(String),

    #[error("Face property {0} is missing in the dice face data.")]
    FaceMissingError(String),

    #[error("JSON parsing failed for data: \"{0}\". Please check if your JSON data format is correct.")]
    JsonParseError(String),

    #[error("JSONPath \"{0}\" parsing failed. Please check if your JSONPath expression is correct.")]
    JsonPathError(String),

    #[error("Failed to fetch faces from \"{url}\": {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Failed to clone dice group \"{0}\".")]
    GroupCloneFailed(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl DiceError {
    /// Stable message key, e.g. `error.dice-name-not-found`
    pub fn kind(&self) -> &'static str {
        match self {
            DiceError::DiceNameInvalid { .. } => "error.dice-name-invalid",
            DiceError::GroupNameInvalid { .. } => "error.group-name-invalid",
            DiceError::RollTimesInvalid(_) => "error.roll-times-invalid",
            DiceError::DiceIdNotFound(_) => "error.dice-id-not-found",
            DiceError::DiceNameNotFound(_) => "error.dice-name-not-found",
            DiceError::GroupIdNotFound(_) => "error.group-id-not-found",
            DiceError::GroupNameNotFound(_) => "error.group-name-not-found",
            DiceError::DiceNameNotUnique(_) => "error.dice-name-not-unique",
            DiceError::GroupNameNotUnique(_) => "error.group-name-not-unique",
            DiceError::DiceNameExists(_) => "error.dice-name-exists",
            DiceError::GroupNameExists(_) => "error.group-name-exists",
            DiceError::GroupAlreadyInitialized(_) => "error.group-already-initialized",
            DiceError::GroupUninitialized(_) => "error.group-uninitialized",
            DiceError::FaceInvalid(_) => "error.face-invalid",
            DiceError::FaceMissingError(_) => "error.face-missing-error",
            DiceError::JsonParseError(_) => "error.json-parse-error",
            DiceError::JsonPathError(_) => "error.json-path-error",
            DiceError::FetchFailed { .. } => "error.fetch-failed",
            DiceError::GroupCloneFailed(_) => "error.group-clone-failed",
            DiceError::Storage(_) => "error.storage",
        }
    }

    /// Ordered arguments for message interpolation
    pub fn args(&self) -> Vec<String> {
        match self {
            DiceError::DiceNameInvalid { name, tip } | DiceError::GroupNameInvalid { name, tip } => {
                vec![name.clone(), tip.clone()]
            }
            DiceError::RollTimesInvalid(n)
            | DiceError::DiceIdNotFound(n)
            | DiceError::GroupIdNotFound(n)
            | DiceError::GroupAlreadyInitialized(n)
            | DiceError::GroupUninitialized(n) => vec![n.to_string()],
            DiceError::DiceNameNotFound(s)
            | DiceError::GroupNameNotFound(s)
            | DiceError::DiceNameNotUnique(s)
            | DiceError::GroupNameNotUnique(s)
            | DiceError::DiceNameExists(s)
            | DiceError::GroupNameExists(s)
            | DiceError::FaceInvalid(s)
            | DiceError::FaceMissingError(s)
            | DiceError::JsonParseError(s)
            | DiceError::JsonPathError(s)
            | DiceError::GroupCloneFailed(s) => vec![s.clone()],
            DiceError::FetchFailed { url, reason } => vec![url.clone(), reason.clone()],
            DiceError::Storage(_) => Vec::new(),
        }
    }

    /// True for expected, user-caused conditions; false for storage failures
    pub fn is_user_error(&self) -> bool {
        !matches!(self, DiceError::Storage(_))
    }
}
