mod compress;

pub use compress::*;
