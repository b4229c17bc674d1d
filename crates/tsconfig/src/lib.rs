mod error;
mod tsconfig_json;

pub use error::OpenTsConfigError;
pub use tsconfig_json::{CompilerOptions, TsConfigJson};
