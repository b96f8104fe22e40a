#![allow(async_fn_in_trait)]

use cardpay_core::{GatewayId, SiteId};
use sqlx::SqlitePool;

use crate::error::StorageResult;
use crate::models::{AccountRow, PaymentGatewayAccount};

/// Repository trait for cached payment gateway accounts
///
/// Accounts are keyed by `(site_id, gateway_id)`; there is never more than
/// one row per key.
pub trait PaymentGatewayAccountRepository: Send + Sync {
    /// Find the account for a site and gateway
    async fn find(
        &self,
        site_id: SiteId,
        gateway_id: &GatewayId,
    ) -> StorageResult<Option<PaymentGatewayAccount>>;

    /// All cached accounts of a site
    async fn find_by_site(&self, site_id: SiteId) -> StorageResult<Vec<PaymentGatewayAccount>>;

    /// Insert the account, or update the row with the same key
    async fn upsert(&self, account: &PaymentGatewayAccount) -> StorageResult<()>;

    /// Delete the account with the given key.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, site_id: SiteId, gateway_id: &GatewayId) -> StorageResult<bool>;
}

/// SQLite implementation of PaymentGatewayAccountRepository
#[derive(Debug, Clone)]
pub struct SqlitePaymentGatewayAccountRepository {
    pool: SqlitePool,
}

impl SqlitePaymentGatewayAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PaymentGatewayAccountRepository for SqlitePaymentGatewayAccountRepository {
    async fn find(
        &self,
        site_id: SiteId,
        gateway_id: &GatewayId,
    ) -> StorageResult<Option<PaymentGatewayAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT site_id, gateway_id, status,
                   has_pending_requirements, has_overdue_requirements, current_deadline,
                   statement_descriptor, default_currency, supported_currencies, country,
                   is_card_present_eligible, is_live, is_in_test_mode
            FROM payment_gateway_accounts
            WHERE site_id = ? AND gateway_id = ?
            "#,
        )
        .bind(site_id.as_i64())
        .bind(gateway_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentGatewayAccount::try_from).transpose()
    }

    async fn find_by_site(&self, site_id: SiteId) -> StorageResult<Vec<PaymentGatewayAccount>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT site_id, gateway_id, status,
                   has_pending_requirements, has_overdue_requirements, current_deadline,
                   statement_descriptor, default_currency, supported_currencies, country,
                   is_card_present_eligible, is_live, is_in_test_mode
            FROM payment_gateway_accounts
            WHERE site_id = ?
            ORDER BY gateway_id
            "#,
        )
        .bind(site_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentGatewayAccount::try_from).collect()
    }

    async fn upsert(&self, account: &PaymentGatewayAccount) -> StorageResult<()> {
        let supported_currencies = serde_json::to_string(&account.supported_currencies)
            .map_err(|e| crate::error::StorageError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO payment_gateway_accounts (
                site_id, gateway_id, status,
                has_pending_requirements, has_overdue_requirements, current_deadline,
                statement_descriptor, default_currency, supported_currencies, country,
                is_card_present_eligible, is_live, is_in_test_mode
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (site_id, gateway_id) DO UPDATE SET
                status = excluded.status,
                has_pending_requirements = excluded.has_pending_requirements,
                has_overdue_requirements = excluded.has_overdue_requirements,
                current_deadline = excluded.current_deadline,
                statement_descriptor = excluded.statement_descriptor,
                default_currency = excluded.default_currency,
                supported_currencies = excluded.supported_currencies,
                country = excluded.country,
                is_card_present_eligible = excluded.is_card_present_eligible,
                is_live = excluded.is_live,
                is_in_test_mode = excluded.is_in_test_mode,
                updated_at = datetime('now')
            "#,
        )
        .bind(account.site_id.as_i64())
        .bind(account.gateway_id.as_str())
        .bind(account.status.as_str())
        .bind(account.has_pending_requirements)
        .bind(account.has_overdue_requirements)
        .bind(account.current_deadline)
        .bind(&account.statement_descriptor)
        .bind(&account.default_currency)
        .bind(supported_currencies)
        .bind(&account.country)
        .bind(account.is_card_present_eligible)
        .bind(account.is_live)
        .bind(account.is_in_test_mode)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, site_id: SiteId, gateway_id: &GatewayId) -> StorageResult<bool> {
        let result =
            sqlx::query("DELETE FROM payment_gateway_accounts WHERE site_id = ? AND gateway_id = ?")
                .bind(site_id.as_i64())
                .bind(gateway_id.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
