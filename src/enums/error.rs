//! # Error Module - Custom *jagged* Error Type
//!
//! Defines the unified error type for the crate, and the structured error
//! returned by the kernel functions.
//!
//! ## Features
//! - Covers out-of-bounds access, missing fields, structural invariant
//!   violations, wrong slice kinds and unsupported combinations.
//! - Kernel failures keep their position (`id`) and the attempted value
//!   (`attempt`) and are tagged with the node that called the kernel.
//! - Implements `Display` for readable output and `Error` for integration
//!   with standard Rust error handling.

use std::error::Error;
use std::fmt;

/// Broad error classes, mirroring the `IndexError`/`ValueError`/`TypeError`/
/// `NotImplementedError` split users of NumPy-style APIs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Index,
    Value,
    Type,
    NotImplemented,
}

/// Failure reported by a kernel function.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelError {
    /// Kernel name, e.g. `listarray_getitem_next_at`.
    pub kernel: &'static str,
    pub message: String,
    /// Loop position at which the kernel failed, if meaningful.
    pub id: Option<i64>,
    /// Value the kernel attempted to use, if meaningful.
    pub attempt: Option<i64>,
    pub category: ErrorCategory,
}

impl KernelError {
    /// Out-of-range failure.
    pub fn index(kernel: &'static str, message: impl Into<String>, id: i64, attempt: i64) -> Self {
        KernelError {
            kernel,
            message: message.into(),
            id: Some(id),
            attempt: Some(attempt),
            category: ErrorCategory::Index,
        }
    }

    /// Structural failure at position `id`.
    pub fn value(kernel: &'static str, message: impl Into<String>, id: Option<i64>) -> Self {
        KernelError {
            kernel,
            message: message.into(),
            id,
            attempt: None,
            category: ErrorCategory::Value,
        }
    }

    /// Attaches the calling node.
    pub fn in_node(self, classname: impl Into<String>) -> JaggedError {
        JaggedError::Kernel {
            classname: classname.into(),
            error: self,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.attempt, self.id) {
            (Some(attempt), _) => write!(f, "attempting to get {}, {}", attempt, self.message)?,
            (None, Some(id)) => write!(f, "at i={}: {}", id, self.message)?,
            (None, None) => write!(f, "{}", self.message)?,
        }
        write!(f, " (in kernel {})", self.kernel)
    }
}

/// Catch all error type for `jagged`
#[derive(Debug, Clone, PartialEq)]
pub enum JaggedError {
    IndexError {
        classname: String,
        message: String,
    },
    FieldNotFound {
        key: String,
        classname: String,
    },
    ValueError {
        classname: String,
        message: String,
    },
    TypeError {
        message: String,
    },
    NotImplemented {
        message: String,
    },
    Kernel {
        classname: String,
        error: KernelError,
    },
}

impl JaggedError {
    pub fn index(classname: impl Into<String>, message: impl Into<String>) -> Self {
        JaggedError::IndexError {
            classname: classname.into(),
            message: message.into(),
        }
    }

    pub fn value(classname: impl Into<String>, message: impl Into<String>) -> Self {
        JaggedError::ValueError {
            classname: classname.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JaggedError::TypeError {
            message: message.into(),
        }
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        JaggedError::NotImplemented {
            message: message.into(),
        }
    }

    pub fn field_not_found(key: impl Into<String>, classname: impl Into<String>) -> Self {
        JaggedError::FieldNotFound {
            key: key.into(),
            classname: classname.into(),
        }
    }

    /// The error class.
    pub fn category(&self) -> ErrorCategory {
        match self {
            JaggedError::IndexError { .. } | JaggedError::FieldNotFound { .. } => {
                ErrorCategory::Index
            }
            JaggedError::ValueError { .. } => ErrorCategory::Value,
            JaggedError::TypeError { .. } => ErrorCategory::Type,
            JaggedError::NotImplemented { .. } => ErrorCategory::NotImplemented,
            JaggedError::Kernel { error, .. } => error.category,
        }
    }

    #[inline]
    pub fn is_index_error(&self) -> bool {
        self.category() == ErrorCategory::Index
    }
}

impl fmt::Display for JaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JaggedError::IndexError { classname, message } => {
                if classname.is_empty() {
                    write!(f, "Index error: {}", message)
                } else {
                    write!(f, "Index error in {}: {}", classname, message)
                }
            }
            JaggedError::FieldNotFound { key, classname } => {
                write!(f, "Index error in {}: key \"{}\" does not exist (not in record)", classname, key)
            }
            JaggedError::ValueError { classname, message } => {
                if classname.is_empty() {
                    write!(f, "Value error: {}", message)
                } else {
                    write!(f, "Value error in {}: {}", classname, message)
                }
            }
            JaggedError::TypeError { message } => write!(f, "Type error: {}", message),
            JaggedError::NotImplemented { message } => write!(f, "Not implemented: {}", message),
            JaggedError::Kernel { classname, error } => write!(f, "in {}, {}", classname, error),
        }
    }
}

impl Error for JaggedError {}

/// Attaches node context to kernel results.
pub(crate) trait KernelContext<T> {
    fn ctx(self, classname: &str) -> Result<T, JaggedError>;
}

impl<T> KernelContext<T> for Result<T, KernelError> {
    #[inline]
    fn ctx(self, classname: &str) -> Result<T, JaggedError> {
        self.map_err(|e| e.in_node(classname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_error_display_carries_context() {
        let err = KernelError::index("listarray_getitem_next_at", "index out of range", 2, 5)
            .in_node("ListArray64");
        let msg = err.to_string();
        assert!(msg.starts_with("in ListArray64, attempting to get 5, index out of range"));
        assert!(msg.contains("listarray_getitem_next_at"));
        assert_eq!(err.category(), ErrorCategory::Index);
    }

    #[test]
    fn test_categories() {
        assert_eq!(JaggedError::field_not_found("x", "RecordArray").category(), ErrorCategory::Index);
        assert_eq!(JaggedError::value("", "bad").category(), ErrorCategory::Value);
        assert_eq!(JaggedError::type_error("bad").category(), ErrorCategory::Type);
        assert_eq!(
            JaggedError::not_implemented("bad").category(),
            ErrorCategory::NotImplemented
        );
        let k = KernelError::value("k", "stops[i] < starts[i]", Some(1)).in_node("ListArray32");
        assert_eq!(k.category(), ErrorCategory::Value);
        assert_eq!(k.to_string(), "in ListArray32, at i=1: stops[i] < starts[i] (in kernel k)");
    }
}
