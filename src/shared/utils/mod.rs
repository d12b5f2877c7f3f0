pub mod hash;
pub mod logger;
pub mod validator;
