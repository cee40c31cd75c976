pub mod annotation;
pub mod config;
pub mod error;
pub mod io;
pub mod navigation;
pub mod plot;
pub mod session;
pub mod signal;
pub mod value;
pub mod window;

pub use annotation::*;
pub use config::*;
pub use error::*;
pub use session::*;
pub use signal::*;
pub use window::*;
