//! 도메인 모델.

pub mod bar;
pub mod instrument;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::*;
pub use instrument::*;
pub use position::*;
pub use signal::*;
pub use trade::*;
