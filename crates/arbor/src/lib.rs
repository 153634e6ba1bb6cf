//! Umbrella crate that re-exports the `arbor-*` building blocks.
//!
//! A [`bt::Tree`] is authored once and shared; every [`bt::Runner`] lays out its own
//! [`core::RuntimeBuffer`] and keeps all per-instance state there.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use arbor_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use arbor_tools as tools;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use arbor_bt as bt;

#[cfg(feature = "blend")]
#[cfg_attr(docsrs, doc(cfg(feature = "blend")))]
pub use arbor_blend as blend;
