//! JSON shapes exchanged with the backend.
//!
//! The backend speaks camelCase JSON. Fields the pages do not use are left
//! out; unknown fields are ignored.

mod cart;
mod change_request;
mod order;
mod payment;
mod product;
mod settings;
mod user;

pub use cart::{Cart, CartItem, Customization, NewCartItem};
pub use change_request::{ChangeRequestResolution, NewChangeRequest, OrderChangeRequest};
pub use order::{NewOrder, NewOrderItem, Order, OrderCustomer, OrderItem, ShippingAddress};
pub use payment::{NewPaymentIntent, Payment, PaymentIntent};
pub use product::{Product, ProductInput};
pub use settings::Settings;
pub use user::{Credentials, NewUser, PasswordChange, ProfileUpdate, Upload, User};
