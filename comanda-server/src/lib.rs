//! comanda: restaurant order-management backend
//!
//! ```text
//! comanda-server/src/
//! ├── core/      # config, state, startup, background tasks
//! ├── api/       # HTTP routes and handlers, kitchen WebSocket
//! ├── auth/      # PIN hashing, JWT, rate limiting, middleware
//! ├── orders/    # order service, money arithmetic, per-order locks
//! ├── message/   # kitchen broadcast hub
//! ├── audit/     # asynchronous audit trail
//! ├── db/        # SQLite pool, migrations, repositories
//! ├── services/  # HTTP app assembly, backups
//! └── utils/     # logging, validation, dates, CSV
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod message;
pub mod orders;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerError, ServerState};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};
