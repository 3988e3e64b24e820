pub mod registry;
pub mod run;
pub mod session;
pub mod state;
pub mod ws;

pub use registry::SessionRegistry;
pub use run::{build_router, run_server};
pub use session::SessionHandle;
pub use state::AppState;
