// HTTP routes
pub mod accounts;
pub mod health;
pub mod jobs;
pub mod probes;
pub mod schedule;
pub mod templates;

pub use accounts::*;
pub use health::*;
pub use jobs::*;
pub use probes::*;
pub use schedule::*;
pub use templates::*;
