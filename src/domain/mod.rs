pub mod models;
pub mod errors;
pub mod validation;
pub mod clock;
pub mod export;

pub use models::*;
pub use errors::*;
pub use validation::*;
pub use clock::*;
pub use export::*;
