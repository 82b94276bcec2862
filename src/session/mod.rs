mod patch;
mod value;


pub use patch::*;
pub use value::*;
