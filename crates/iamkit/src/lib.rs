//! # iamkit
//!
//! Least-privilege IAM policy synthesis.
//!
//! This crate provides functionality for:
//! - Mapping capability requests to permission statements
//! - Building validated, immutable statements
//! - Rendering identity policies and trust policies as IAM JSON
//!
//! ## Example
//!
//! ```
//! use iamkit::{Capability, PolicyDocument, Scope, synthesize};
//!
//! let scope = Scope::new("ap-northeast-1", "123456789012");
//! let statements = synthesize(&[Capability::EcrRead, Capability::LogsWrite], &scope)
//!     .expect("valid scope");
//!
//! let document = PolicyDocument::new(statements);
//! println!("{}", document.to_json_pretty().unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod document;
pub mod error;
pub mod statement;

pub use capability::{Capability, Scope, synthesize, synthesize_named};
pub use document::{POLICY_VERSION, PolicyDocument, Principal, TrustPolicy};
pub use error::{Error, Result};
pub use statement::{Condition, Effect, PermissionStatement, StatementBuilder};
