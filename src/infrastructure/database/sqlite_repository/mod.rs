use super::ConnectionPool;
use crate::shared::error::AppError;

mod comments;
mod mapper;
mod posts;
mod queries;

pub struct SqliteRepository {
    pool: ConnectionPool,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), AppError> {
        self.pool.migrate().await?;
        Ok(())
    }
}
