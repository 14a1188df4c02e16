mod paginate;
pub use paginate::*;

mod send_msg;
pub use send_msg::*;
