pub mod errors;
pub mod db;
pub mod user;
pub mod region;
pub mod direction;
pub mod user_region;
pub mod user_direction;
pub mod verification_token;
