mod activation;
mod control;
mod error;
mod format;
mod interop;
mod interpreter;
mod invokable;
mod lookup;
mod node;
pub mod number;
mod object;
mod primitives;
mod value;
mod vm;

pub use activation::*;
pub use error::*;
pub use format::{NumberFormat, display_value};
pub use interop::Interop;
pub use interpreter::*;
pub use invokable::*;
pub use lookup::*;
pub use node::*;
pub use object::*;
pub use primitives::{PrimitiveContext, PrimitiveMessage};
pub use value::*;
pub use vm::*;
