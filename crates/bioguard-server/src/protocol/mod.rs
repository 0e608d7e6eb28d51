//! Wire protocol: framing, request/response records, body parsers, the
//! routing table, and the controllers.
//!
//! The protocol stack is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        FASTA body parsers                │  application/fasta dialects
//! ├─────────────────────────────────────────┤
//! │        Router + controllers              │  METHOD:action dispatch
//! ├─────────────────────────────────────────┤
//! │        Framing                           │  u16 BE length + UTF-8
//! ├─────────────────────────────────────────┤
//! │        TLS over TCP                      │  transport module
//! └─────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod framing;
pub mod message;
pub mod parse;
pub mod router;

pub use controller::{DiagnoseController, DiseaseRegisterController, PatientRegisterController};
pub use framing::{FrameCodec, FramingError, MAX_FRAME_SIZE};
pub use message::{Request, Response};
pub use parse::{ParserRegistry, FASTA_CONTENT_TYPE};
pub use router::{MessageHandler, Router};
