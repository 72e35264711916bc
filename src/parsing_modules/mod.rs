//! Structured-data path: product state embedded in the page source.
//!
//! Storefronts built on a JS framework inline the data their components are
//! hydrated from. Reading it directly is more reliable than the rendered
//! markup, which drops fields and changes with every redesign.
//!
//! - [`embedded_data`]: locate and decode the embedded product objects
//! - [`normalize`]: map each object onto a [`crate::models::ProductRecord`]

pub mod embedded_data;
pub mod normalize;
