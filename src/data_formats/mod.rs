mod query;
mod request;
mod response;

pub use query::*;
pub use request::*;
pub use response::*;
