//! Data models for AgriRent

pub mod cart;
pub mod listing;
pub mod location;
pub mod order;
pub mod pincode;
pub mod settings;
pub mod user;

// Re-export commonly used types
pub use cart::{Cart, CartClassification, CartLineItem, PincodeGroup};
pub use listing::{Listing, ListingStatus, RentalMode};
pub use location::Locality;
pub use order::{Order, OrderStatus, PaymentMethod, PaymentStatus};
pub use pincode::Pincode;
pub use settings::PlatformSettings;
pub use user::{Role, User, UserClaims, Viewer};
