pub mod menu;
pub mod order;
pub mod profile;

pub use menu::*;
pub use order::*;
pub use profile::*;
