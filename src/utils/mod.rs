pub mod logging;
pub mod password;
pub mod validation;
