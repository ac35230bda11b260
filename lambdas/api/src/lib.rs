pub mod demo_data;
pub mod handlers;
pub mod router;
pub mod util;
