//! Pipeline stages for rendering one item.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the transport can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ params ──▶ server ──▶ request ──▶ transport ──▶ normalize ──▶ encode
//! (JSON)   (validate)  (base URL)  (POST)      (HTTP)        (bytes+MIME)  (base64)
//! ```
//!
//! 1. [`input`]     — parse item documents into positional items
//! 2. [`params`]    — validate raw parameters; first stage that can fail
//! 3. [`server`]    — public root or a custom root without trailing slash
//! 4. [`request`]   — `POST {base}/{type}/{format}` with the source as body
//! 5. [`transport`] — the only stage with network I/O; never retries
//! 6. [`normalize`] — canonical bytes from whatever the transport returned
//! 7. [`encode`]    — base64 attachment for storage
//!
//! [`item`] strings the stages together for one item.

pub mod encode;
pub mod input;
pub mod item;
pub mod normalize;
pub mod params;
pub mod request;
pub mod server;
pub mod transport;
