pub mod repositories;

mod database;
mod repository_base;
mod result_ext;
mod transaction;

pub use database::Database;
pub use repository_base::SqliteRepositoryBase;
pub use result_ext::{map_sqlx_error, ResultExt};
pub use transaction::{SqliteCheckinTransaction, SqliteUnitOfWork};
