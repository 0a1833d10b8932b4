//! Sample I/O
//!
//! The engine consumes already-decoded float PCM. Decoding files and opening
//! capture devices belong to the host (see the demos for a Symphonia decoder).

pub mod ring_buffer;
pub mod sample_buffer;
