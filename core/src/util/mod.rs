mod text;

pub use text::{tail_bytes, tail_chars};
