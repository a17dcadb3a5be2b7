pub mod macros;
pub mod menu_client;
pub mod order_client;
pub mod profile_client;

pub use menu_client::*;
pub use order_client::*;
pub use profile_client::*;
