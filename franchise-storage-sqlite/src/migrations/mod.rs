use async_trait::async_trait;
use chrono::Utc;
use franchise_migration::{
    Migration, MigrationError, MigrationManager, MigrationRecord, check_versions, pending_versions,
};
use sqlx::{Database, Sqlite, SqlitePool};

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Every schema migration for the SQLite backend, in version order.
pub fn all() -> Vec<Box<dyn Migration<Sqlite>>> {
    vec![
        Box::new(CreateInvitationCodesTable),
        Box::new(CreateBranchesTable),
        Box::new(CreateUsersTable),
        Box::new(CreateAuditLogsTable),
        Box::new(CreateProductsTable),
        Box::new(CreateInventoryTable),
        Box::new(CreateSalesTable),
        Box::new(CreateIndexes),
    ]
}

#[async_trait]
impl MigrationManager<Sqlite> for SqliteMigrationManager {
    async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
                self.get_migration_table_name()
            )
            .as_str(),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn up(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        check_versions(migrations)?;

        let applied = self.get_applied_migrations().await?;
        let pending = pending_versions(migrations, &applied);
        if pending.is_empty() {
            tracing::debug!("Schema is up to date");
            return Ok(());
        }

        for version in pending {
            let Some(migration) = migrations.iter().find(|m| m.version() == version) else {
                continue;
            };

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            migration
                .up(&mut *tx as &mut <Sqlite as Database>::Connection)
                .await?;

            sqlx::query(
                format!(
                    "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
                    self.get_migration_table_name()
                )
                .as_str(),
            )
            .bind(migration.version())
            .bind(migration.name())
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    async fn down(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        let mut ordered: Vec<&Box<dyn Migration<Sqlite>>> = migrations.iter().collect();
        ordered.sort_by_key(|m| std::cmp::Reverse(m.version()));

        for migration in ordered {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Rolling back migration"
            );

            migration
                .down(&mut *tx as &mut <Sqlite as Database>::Connection)
                .await?;

            sqlx::query(
                format!(
                    "DELETE FROM {} WHERE version = ?",
                    self.get_migration_table_name()
                )
                .as_str(),
            )
            .bind(migration.version())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(
            format!(
                "SELECT version, name, applied_at FROM {} ORDER BY version",
                self.get_migration_table_name()
            )
            .as_str(),
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let result: bool = sqlx::query_scalar(
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
                self.get_migration_table_name()
            )
            .as_str(),
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }
}

pub struct CreateInvitationCodesTable;

#[async_trait]
impl Migration<Sqlite> for CreateInvitationCodesTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateInvitationCodesTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS invitation_codes (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                description TEXT,
                max_uses INTEGER,
                current_uses INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                expires_at INTEGER,
                role TEXT NOT NULL DEFAULT 'franchise_owner',
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
                CHECK (current_uses >= 0),
                CHECK (max_uses IS NULL OR current_uses <= max_uses)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS invitation_codes")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateBranchesTable;

#[async_trait]
impl Migration<Sqlite> for CreateBranchesTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateBranchesTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS branches (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT NOT NULL,
                franchisee_name TEXT NOT NULL,
                contact_number TEXT,
                email TEXT,
                status TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'inactive', 'pending')),
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS branches")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateUsersTable;

#[async_trait]
impl Migration<Sqlite> for CreateUsersTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateUsersTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'franchise_owner',
                branch_id TEXT REFERENCES branches(id) ON DELETE SET NULL,
                invitation_code_id TEXT REFERENCES invitation_codes(id),
                is_active INTEGER NOT NULL DEFAULT 1,
                is_email_verified INTEGER NOT NULL DEFAULT 0,
                email_verification_token TEXT,
                email_verification_expires INTEGER,
                password_reset_token TEXT,
                password_reset_expires INTEGER,
                last_login INTEGER,
                login_attempts INTEGER NOT NULL DEFAULT 0,
                locked_until INTEGER,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS users")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateAuditLogsTable;

#[async_trait]
impl Migration<Sqlite> for CreateAuditLogsTable {
    fn version(&self) -> i64 {
        4
    }

    fn name(&self) -> &str {
        "CreateAuditLogsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id TEXT,
                details TEXT NOT NULL DEFAULT '{}',
                ip_address TEXT,
                user_agent TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS audit_logs")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateProductsTable;

#[async_trait]
impl Migration<Sqlite> for CreateProductsTable {
    fn version(&self) -> i64 {
        5
    }

    fn name(&self) -> &str {
        "CreateProductsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'ingredient'
                    CHECK (category IN ('beverage', 'ingredient', 'supply', 'packaging')),
                price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
                unit TEXT NOT NULL,
                sku TEXT UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS products")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateInventoryTable;

#[async_trait]
impl Migration<Sqlite> for CreateInventoryTable {
    fn version(&self) -> i64 {
        6
    }

    fn name(&self) -> &str {
        "CreateInventoryTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inventory (
                id TEXT PRIMARY KEY,
                branch_id TEXT NOT NULL REFERENCES branches(id),
                product_id TEXT NOT NULL REFERENCES products(id),
                quantity REAL NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                min_threshold REAL,
                last_restock_date INTEGER,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                last_updated INTEGER NOT NULL DEFAULT (unixepoch()),
                UNIQUE (branch_id, product_id)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS inventory")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateSalesTable;

#[async_trait]
impl Migration<Sqlite> for CreateSalesTable {
    fn version(&self) -> i64 {
        7
    }

    fn name(&self) -> &str {
        "CreateSalesTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales (
                id TEXT PRIMARY KEY,
                branch_id TEXT NOT NULL REFERENCES branches(id),
                product_id TEXT NOT NULL REFERENCES products(id),
                quantity REAL NOT NULL CHECK (quantity > 0),
                unit_price_cents INTEGER NOT NULL,
                total_price_cents INTEGER NOT NULL,
                discount_percent REAL NOT NULL DEFAULT 0,
                discount_amount_cents INTEGER NOT NULL DEFAULT 0,
                final_amount_cents INTEGER NOT NULL,
                recorded_by TEXT NOT NULL REFERENCES users(id),
                payment_method TEXT NOT NULL DEFAULT 'cash'
                    CHECK (payment_method IN ('cash', 'card', 'gcash', 'other')),
                transaction_reference TEXT,
                sale_date INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS sales")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateIndexes;

#[async_trait]
impl Migration<Sqlite> for CreateIndexes {
    fn version(&self) -> i64 {
        8
    }

    fn name(&self) -> &str {
        "CreateIndexes"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_users_invitation_code_id ON users(invitation_code_id)",
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_user_id ON audit_logs(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_action ON audit_logs(action)",
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at ON audit_logs(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_users_branch_id ON users(branch_id)",
            "CREATE INDEX IF NOT EXISTS idx_inventory_branch_id ON inventory(branch_id)",
            "CREATE INDEX IF NOT EXISTS idx_sales_branch_date ON sales(branch_id, sale_date)",
            "CREATE INDEX IF NOT EXISTS idx_sales_sale_date ON sales(sale_date)",
        ] {
            sqlx::query(statement).execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        for index in [
            "idx_users_invitation_code_id",
            "idx_audit_logs_user_id",
            "idx_audit_logs_action",
            "idx_audit_logs_created_at",
            "idx_users_branch_id",
            "idx_inventory_branch_id",
            "idx_sales_branch_date",
            "idx_sales_sale_date",
        ] {
            sqlx::query(&format!("DROP INDEX IF EXISTS {index}"))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}
