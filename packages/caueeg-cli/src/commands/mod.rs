pub mod convert;
pub mod info;
pub mod participants;
pub mod validate;
