//! HTTP front-end

pub mod api;
