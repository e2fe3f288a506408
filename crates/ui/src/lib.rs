pub mod app;
pub mod context;
pub mod routes;
pub mod vm;
pub mod views;

pub use app::{App, AppEvent, ReviewReady};
pub use context::{AppContext, build_app_context};
pub use routes::{Effect, NavEvent, RouteError, RouterState, Transition, View, transition};
pub use views::{ViewError, ViewState};
