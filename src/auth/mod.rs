mod middleware;
mod session;
mod token;

pub use middleware::{AuthError, RequireAdmin, RequireSession, extract_bearer_token};
pub use session::{SessionContext, authenticate, login, logout};
pub use token::{TokenGenerator, generate_password, parse_token};
