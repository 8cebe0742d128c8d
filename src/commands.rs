pub mod db;
pub mod migrate;
pub mod publish;
pub mod serve;
pub mod user;
pub mod version;
