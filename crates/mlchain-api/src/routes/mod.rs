//! # Route Modules
//!
//! | Prefix | Module | Acting identity |
//! |--------|--------|-----------------|
//! | `/api/users/*` | [`users`] | registrar admin (register), token admin (authorize) |
//! | `/api/tokens*` | [`tokens`] | token admin |
//! | `/api/models` | [`models`] | model-reader admin |

pub mod models;
pub mod tokens;
pub mod users;
