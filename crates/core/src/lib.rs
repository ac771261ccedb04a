pub mod bundle;
pub mod fundamentals;
pub mod models;
pub mod series;
pub mod traits;

pub use bundle::*;
pub use fundamentals::*;
pub use models::*;
pub use series::*;
pub use traits::*;
