//! Daily submission schema
//!
//! This module defines the loosely-typed input accepted from callers and the
//! validation that turns it into `DailyMetrics`. Nothing downstream of this
//! module sees an unvalidated value.

mod adapter;
mod submission;

pub use adapter::*;
pub use submission::*;
