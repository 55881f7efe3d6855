pub mod booking;
pub mod category;
pub mod recommendation;
pub mod registration;
pub mod service;
pub mod user;

pub use booking::{Booking, BookingPatch, BookingStatus, NewBooking};
pub use category::Category;
pub use recommendation::Recommendation;
pub use registration::{NewRegistration, Registration};
pub use service::{ProviderProfile, Service, ServiceSummary, Testimonial};
pub use user::{Account, Role};
