//! Core error handling shared by the library and the binary.
//!
//! - [`WidgetbarError`] collects the failures the application reports.
//! - [`ErrorContext`] pairs an error with details and a suggestion and
//!   prints them with terminal colors.
//! - [`user_friendly_error`] turns any [`anyhow::Error`] into an
//!   [`ErrorContext`] by walking its chain.
//! - [`source_pointer`] renders a snippet of template text with a caret
//!   under a byte offset.

pub mod error;
pub mod error_formatting;

pub use error::{ErrorContext, WidgetbarError};
pub use error_formatting::{create_error_context, source_pointer, user_friendly_error};
