pub mod members;
pub mod pkce;
pub mod tokens;
