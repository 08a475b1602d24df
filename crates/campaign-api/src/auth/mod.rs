pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtManager, TokenSubject};
pub use middleware::AuthUser;
pub use password::PasswordService;
