//! Error types for the Stratus provisioning system.
//!
//! This module provides the error hierarchy for all operations in the
//! provisioning lifecycle: selector parsing, plan loading, provisioning,
//! teardown, and the cloud provider calls underneath them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Stratus provisioning system.
#[derive(Debug, Error)]
pub enum StratusError {
    /// Selector grammar and validation errors.
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    /// Launch plan loading and validation errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Provisioning sequence errors.
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// Cloud provider call errors.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Selector grammar and validation errors.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// A criterion is missing its `keyword:value` separator.
    #[error("Malformed selector criterion: '{criterion}' (expected keyword:value)")]
    MalformedCriterion {
        /// The offending criterion fragment.
        criterion: String,
    },

    /// A tag criterion contains more than one `=`.
    #[error("Malformed tag criterion: '{criterion}' (expected tag:Key or tag:Key=Value)")]
    MalformedTagCriterion {
        /// The offending criterion fragment.
        criterion: String,
    },

    /// A selector key is not recognized for the resource kind.
    #[error("Unsupported selector key '{key}' for {kind}")]
    UnsupportedKey {
        /// The unrecognized key.
        key: String,
        /// The resource kind whose schema rejected the key.
        kind: String,
    },

    /// A numeric range criterion could not be parsed.
    #[error("Invalid range '{value}': {message}")]
    InvalidRange {
        /// The offending range expression.
        value: String,
        /// Description of the parse failure.
        message: String,
    },

    /// A byte-size quantity could not be parsed.
    #[error("Invalid byte size: '{value}'")]
    InvalidByteSize {
        /// The offending quantity string.
        value: String,
    },

    /// An image id value is neither an `ami-` id nor a known alias.
    #[error("Unknown image alias '{alias}' (known aliases: al2023, al2023-minimal, al2)")]
    UnknownImageAlias {
        /// The unrecognized alias.
        alias: String,
    },

    /// A call site required at least one concrete criterion.
    #[error("At least one criterion is required for {kind} selectors")]
    CriteriaRequired {
        /// The resource kind that mandates criteria.
        kind: String,
    },
}

/// Launch plan loading and validation errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file was not found.
    #[error("Plan file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The plan document could not be parsed.
    #[error("Failed to parse plan: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The capacity type is not a recognized spelling.
    #[error("Invalid capacity type: '{value}' (expected spot, on-demand, or capacity-block)")]
    InvalidCapacityType {
        /// The unrecognized capacity type string.
        value: String,
    },

    /// Plan validation failed.
    #[error("Plan validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Provisioning sequence errors.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Subnet and security-group selectors must be supplied together or
    /// not at all.
    #[error("Incomplete network selection: {message}")]
    IncompleteNetworkSelection {
        /// Which half of the pair is missing.
        message: String,
    },

    /// Exactly one resource was expected.
    #[error("Ambiguous resolution for {kind}: expected exactly one, found {found}")]
    ResolutionAmbiguous {
        /// The resource kind being resolved.
        kind: String,
        /// How many resources actually matched.
        found: usize,
    },

    /// A required resolution matched nothing.
    #[error("No {kind} matched the supplied selectors")]
    EmptyResolution {
        /// The resource kind that resolved to nothing.
        kind: String,
    },
}

/// Cloud provider call errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The resource already exists. Recognized as the idempotent-create
    /// class; only launch-template creation downgrades it to success.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// The resource kind.
        kind: String,
        /// The conflicting resource name.
        name: String,
    },

    /// A cloud API call failed.
    #[error("{operation} failed: {message}")]
    Api {
        /// The provider operation that failed.
        operation: String,
        /// Error message from the provider.
        message: String,
    },

    /// A provider response was missing a field the caller requires.
    #[error("{operation} returned no {field}")]
    MissingField {
        /// The provider operation that responded.
        operation: String,
        /// The absent field.
        field: String,
    },

    /// A convergence wait exceeded its bound.
    #[error("Timed out waiting for {kind} {id} to reach '{target}' after {waited_secs}s")]
    ConvergenceTimeout {
        /// The resource kind being waited on.
        kind: String,
        /// ID of the resource.
        id: String,
        /// Target state that was not reached.
        target: String,
        /// Seconds waited before giving up.
        waited_secs: u64,
    },
}

/// Result type alias for Stratus operations.
pub type Result<T> = std::result::Result<T, StratusError>;

impl StratusError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is the recognized "already exists"
    /// idempotent-create class.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::AlreadyExists { .. }))
    }
}

impl SelectorError {
    /// Creates an unsupported-key error for a resource kind.
    #[must_use]
    pub fn unsupported_key(key: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedKey {
            key: key.into(),
            kind: kind.into(),
        }
    }

    /// Creates an invalid-range error.
    #[must_use]
    pub fn invalid_range(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRange {
            value: value.into(),
            message: message.into(),
        }
    }
}

impl PlanError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ProviderError {
    /// Creates an API call error.
    #[must_use]
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-field error.
    #[must_use]
    pub fn missing_field(operation: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            operation: operation.into(),
            field: field.into(),
        }
    }
}
