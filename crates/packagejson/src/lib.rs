mod packagejson;

pub use packagejson::*;
