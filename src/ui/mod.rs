//! Screen controllers, navigation and text rendering.

pub mod details;
pub mod home;
pub mod navigation;
pub mod render;
pub mod scope;

pub use details::{DetailsController, DetailsState};
pub use home::{HomeController, HomeNetworkState, HomeOfflineState};
pub use navigation::{Navigator, Route};
