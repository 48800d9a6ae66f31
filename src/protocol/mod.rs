// (c) 2026 fxp authors

//! 📖 The fxp wire protocol
//!
//! ## Overview
//!
//! One TCP connection carries exactly one operation. The party that opens the connection is the
//! **Initiator** (the client); the party that accepts it is the **Responder** (the server).
//!
//! Every structured message is a JSON document in a length-prefixed frame (see [`common`]).
//! Messages are either *requests*, which carry a `type` field, or *responses*, which carry a
//! `status_code` field (see [`message`]).
//!
//! | Field | Used by | Meaning |
//! | --- | --- | --- |
//! | `type` | requests | `put`, `get` or `list` |
//! | `filename` | put, get | name of the subject file |
//! | `content_length` | put | exact size of the subject file |
//! | `status_code` | responses | `"000"` (ALLOW) or `"100"` (DENY) |
//! | `message` | responses | human-readable commentary |
//! | `files` | listing response | directory entries |
//!
//! ### PUT (upload)
//!
//! ```text
//! Initiator                               Responder
//!   {type:put, filename, content_length} →
//!                                         ← ALLOW "File upload approved"   (or DENY, end)
//!   ALLOW "File approval acknowledged…"  →
//!   <content_length raw bytes>           →
//!                                         ← ALLOW "File transfer complete"
//! ```
//!
//! ### GET (download)
//!
//! The Responder describes the file it is about to push by reusing the `put` shape.
//!
//! ```text
//! Initiator                               Responder
//!   {type:get, filename}                 →
//!                                         ← {type:put, filename, content_length}   (or DENY, end)
//!   ALLOW "File info received…"          →
//!                                         ← ALLOW "File approval acknowledged…"
//!                                         ← <content_length raw bytes>
//!   ALLOW "File transfer complete"       →
//! ```
//!
//! ### LIST
//!
//! ```text
//! Initiator                               Responder
//!   {type:list}                          →
//!                                         ← {status_code:"000", message:"File listing", files:[…]}
//! ```
//!
//! ## Failure handling
//!
//! There are no retries. A DENY at any step ends the operation; its message is shown to the user
//! verbatim. A connection that closes before all payload bytes have arrived leaves no partial
//! file behind.

pub mod common;
pub mod message;

pub use message::{Allow, Deny, GetRequest, Message, PutRequest, RawMessage, StatusCode};
