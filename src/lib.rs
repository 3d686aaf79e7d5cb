mod attribute_value;
mod condition;
mod engine;
mod error;
mod eval;
mod extractor;
mod fallback;
mod flag;
mod hash;
mod key;
mod matcher;
mod maybe_async;
mod prerequisites;
mod sdk_keys;
mod store;
mod test_common;
mod treatments;
mod util;

pub use attribute_value::*;
pub use condition::*;
pub use engine::*;
pub use error::*;
pub use eval::*;
pub use extractor::*;
pub use fallback::*;
pub use flag::*;
pub use hash::*;
pub use key::*;
pub use matcher::*;
pub use maybe_async::*;
pub use prerequisites::*;
pub use sdk_keys::*;
pub use store::*;
pub use treatments::*;
