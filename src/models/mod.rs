pub mod cart;
pub mod product;
pub mod settings;

pub use cart::*;
pub use product::*;
pub use settings::*;
