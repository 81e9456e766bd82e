//! Internal domain modules for the Note Book core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod color;
pub mod context;
pub mod convert;
pub mod error;
pub mod fill;
pub mod hierarchy;
pub mod index;
pub mod note;
pub mod picture;
pub mod settings;
pub mod spellcheck;
pub mod store;
