pub mod sinc;
pub mod utils;
