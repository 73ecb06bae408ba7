mod controller;
mod service;

pub use controller::ActivityController;
pub use service::ActivityService;
