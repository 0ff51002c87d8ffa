pub mod user;
pub mod team;
pub mod project;
pub mod settings;

pub use user::*;
pub use team::*;
pub use project::*;
pub use settings::*;
