//! Types exchanged with the ASR and feedback collaborators.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so hosts can
//! forward them over whatever transport they use.

pub mod events;
