//! Self-describing n-dimensional array values and the length-prefixed wire
//! protocol that carries them over a TCP stream.
//!
//! Every message on the wire is either a [`TypedArray`] (rank, shape, dtype
//! descriptor, raw payload) or the rank-zero sentinel that tells the peer no
//! further arrays will follow in this direction.

mod array;
mod codec;
mod dtype;
mod error;
mod session;

pub use array::{ArrayMessage, TypedArray};
pub use codec::{read_message, write_message};
pub use dtype::{ByteOrder, Dtype, DtypeKind};
pub use error::WireError;
pub use session::{ArrayReceiver, ArraySender, ArraySession};
