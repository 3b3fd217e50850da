pub mod admin_user;
pub mod category;
pub mod event;
pub mod representative;
pub mod signup;

pub use admin_user::AdminUser;
pub use category::{CreateCategory, EventCategory};
pub use event::{CreateEvent, Event, EventStatus};
pub use representative::{CreateRepresentative, Representative};
pub use signup::{CreateSignup, Signup};
