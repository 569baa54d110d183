pub mod claim;
pub mod client;
pub mod consent;
pub mod error;
pub mod scope;
pub mod token;

pub use claim::*;
pub use client::*;
pub use consent::*;
pub use error::*;
pub use scope::*;
pub use token::*;
