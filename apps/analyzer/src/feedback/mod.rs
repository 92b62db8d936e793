// User feedback: per-session cooldown gate, validation, origin lookup and
// append-only storage (Google Sheets or Postgres).

pub mod gate;
pub mod handlers;
pub mod models;
pub mod origin;
pub mod sheets;
pub mod sink;
pub mod store;
pub mod validation;
