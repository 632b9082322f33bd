// HTTP routes
pub mod extract;
pub mod form;
pub mod health;
pub mod settings;
pub mod workspace;

pub use extract::*;
pub use health::*;
pub use settings::*;
pub use workspace::*;
