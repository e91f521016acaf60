//! Per-case cleanup by table truncation.
//!
//! After each case the tables the suite touched are truncated directly in the
//! store, bypassing REST, in an order where dependents go before the entities
//! they reference.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{ContractError, ContractResult};

/// A table holding one kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTable {
    AreaDevice,
    Area,
    HPacketField,
    HPacket,
    HDevice,
    HProject,
    HUser,
}

impl EntityTable {
    /// Tables touched by the HProject cases, dependents first.
    pub const HPROJECT_SUITE: [EntityTable; 6] = [
        EntityTable::AreaDevice,
        EntityTable::Area,
        EntityTable::HPacketField,
        EntityTable::HPacket,
        EntityTable::HDevice,
        EntityTable::HProject,
    ];

    /// Returns the SQL table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityTable::AreaDevice => "area_device",
            EntityTable::Area => "area",
            EntityTable::HPacketField => "hpacketfield",
            EntityTable::HPacket => "hpacket",
            EntityTable::HDevice => "hdevice",
            EntityTable::HProject => "hproject",
            EntityTable::HUser => "huser",
        }
    }
}

impl fmt::Display for EntityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Removes every row of a table.
#[async_trait]
pub trait TableTruncator: Send + Sync {
    /// Truncates one table.
    async fn truncate(&self, table: EntityTable) -> ContractResult<()>;
}

/// Truncates a fixed list of tables in order.
#[derive(Clone)]
pub struct Cleanup {
    truncator: Arc<dyn TableTruncator>,
    tables: Vec<EntityTable>,
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl Cleanup {
    /// Creates a cleanup over the given tables, truncated in the given order.
    pub fn new(truncator: Arc<dyn TableTruncator>, tables: impl Into<Vec<EntityTable>>) -> Self {
        Self {
            truncator,
            tables: tables.into(),
        }
    }

    /// Creates the cleanup used by the HProject cases.
    pub fn for_hproject_suite(truncator: Arc<dyn TableTruncator>) -> Self {
        Self::new(truncator, EntityTable::HPROJECT_SUITE)
    }

    /// Returns the tables in truncation order.
    pub fn tables(&self) -> &[EntityTable] {
        &self.tables
    }

    /// Truncates every table.
    ///
    /// All tables are attempted even after a failure; the first failure is
    /// returned.
    pub async fn run(&self) -> ContractResult<()> {
        let mut first_error = None;
        for table in &self.tables {
            debug!(%table, "Truncating table");
            if let Err(e) = self.truncator.truncate(*table).await {
                warn!(%table, error = %e, "Truncation failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Truncator used when the store cannot be reached directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTruncator;

#[async_trait]
impl TableTruncator for NoopTruncator {
    async fn truncate(&self, table: EntityTable) -> ContractResult<()> {
        warn!(%table, "No direct store access, table left as is");
        Ok(())
    }
}

/// Truncates tables of an in-process [`hyperiot_stub::MemoryStore`].
#[cfg(feature = "stub")]
#[derive(Debug, Clone)]
pub struct StubTruncator(pub Arc<hyperiot_stub::MemoryStore>);

#[cfg(feature = "stub")]
#[async_trait]
impl TableTruncator for StubTruncator {
    async fn truncate(&self, table: EntityTable) -> ContractResult<()> {
        self.0
            .truncate_by_name(table.table_name())
            .map_err(|e| ContractError::Cleanup {
                table: table.to_string(),
                message: e.to_string(),
            })
    }
}

/// Truncates tables of the platform's PostgreSQL store.
#[cfg(feature = "postgres")]
#[derive(Clone)]
pub struct PostgresTruncator {
    pool: deadpool_postgres::Pool,
}

#[cfg(feature = "postgres")]
impl PostgresTruncator {
    /// Creates a pool for the given connection string.
    pub fn connect(url: &str) -> ContractResult<Self> {
        use deadpool_postgres::{Config, Runtime};
        use tokio_postgres::NoTls;

        let mut cfg = Config::new();
        cfg.url = Some(url.to_string());

        let pool = cfg
            .builder(NoTls)
            .map_err(|e| ContractError::Cleanup {
                table: "*".to_string(),
                message: format!("Failed to create pool builder: {}", e),
            })?
            .max_size(2)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| ContractError::Cleanup {
                table: "*".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl TableTruncator for PostgresTruncator {
    async fn truncate(&self, table: EntityTable) -> ContractResult<()> {
        let client = self.pool.get().await.map_err(|e| ContractError::Cleanup {
            table: table.to_string(),
            message: e.to_string(),
        })?;

        // table names come from a closed enum
        client
            .batch_execute(&format!("TRUNCATE {} CASCADE", table.table_name()))
            .await
            .map_err(|e| ContractError::Cleanup {
                table: table.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTruncator {
        seen: Mutex<Vec<EntityTable>>,
        fail_on: Option<EntityTable>,
    }

    #[async_trait]
    impl TableTruncator for RecordingTruncator {
        async fn truncate(&self, table: EntityTable) -> ContractResult<()> {
            self.seen.lock().push(table);
            if self.fail_on == Some(table) {
                return Err(ContractError::Cleanup {
                    table: table.to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_dependents_first() {
        let truncator = Arc::new(RecordingTruncator::default());
        Cleanup::for_hproject_suite(truncator.clone())
            .run()
            .await
            .unwrap();
        let seen = truncator.seen.lock().clone();
        assert_eq!(seen.first(), Some(&EntityTable::AreaDevice));
        assert_eq!(seen.last(), Some(&EntityTable::HProject));
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_tables() {
        let truncator = Arc::new(RecordingTruncator {
            fail_on: Some(EntityTable::HPacket),
            ..Default::default()
        });
        let err = Cleanup::for_hproject_suite(truncator.clone())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Cleanup { ref table, .. } if table == "hpacket"));
        assert_eq!(truncator.seen.lock().len(), 6);
    }

    #[tokio::test]
    async fn test_noop_succeeds() {
        let cleanup = Cleanup::new(Arc::new(NoopTruncator), vec![EntityTable::HUser]);
        assert!(cleanup.run().await.is_ok());
        assert_eq!(cleanup.tables(), &[EntityTable::HUser]);
    }

    #[cfg(feature = "stub")]
    #[tokio::test]
    async fn test_stub_truncator_keeps_admin() {
        use hyperiot_stub::StoreTable;
        use hyperiot_stub::store::ProjectRecord;

        let store = Arc::new(hyperiot_stub::MemoryStore::default());
        store
            .write()
            .insert_project(ProjectRecord {
                name: "p".into(),
                owner_id: store.admin_id(),
                ..Default::default()
            })
            .unwrap();

        Cleanup::for_hproject_suite(Arc::new(StubTruncator(Arc::clone(&store))))
            .run()
            .await
            .unwrap();

        assert_eq!(store.count(StoreTable::HProject), 0);
        assert_eq!(store.count(StoreTable::HUser), 1);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(EntityTable::AreaDevice.to_string(), "area_device");
        assert_eq!(EntityTable::HPacketField.table_name(), "hpacketfield");
    }
}
