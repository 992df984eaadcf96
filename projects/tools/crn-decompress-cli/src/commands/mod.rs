pub mod info;
pub mod unpack;
pub mod validate;
