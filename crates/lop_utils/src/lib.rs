pub mod ecmascript;
pub mod indexmap;
pub mod locate;
pub mod rstr;
