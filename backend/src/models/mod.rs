pub mod batch;
pub mod courier;
pub mod macros;
pub mod order;
pub mod time;
pub mod weight;

pub use batch::*;
pub use courier::*;
pub use order::*;
pub use time::*;
pub use weight::*;
