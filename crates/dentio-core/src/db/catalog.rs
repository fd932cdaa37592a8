//! Service price catalog database operations.

use rusqlite::{params, OptionalExtension};

use super::{decode_money, encode_money, Database, DbError, DbResult};
use crate::models::ServiceItem;

impl Database {
    /// Add or update a catalog entry.
    pub fn upsert_service(&self, service: &ServiceItem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO services (id, name, category, price, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                price = excluded.price,
                active = excluded.active,
                updated_at = datetime('now')
            "#,
            params![
                service.id,
                service.name,
                service.category,
                encode_money(service.price),
                service.active,
                service.created_at,
                service.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a catalog entry by id.
    pub fn get_service(&self, id: &str) -> DbResult<Option<ServiceItem>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, category, price, active, created_at, updated_at
                FROM services
                WHERE id = ?
                "#,
                [id],
                map_service_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List catalog entries, optionally restricted to active ones.
    pub fn list_services(&self, active_only: bool) -> DbResult<Vec<ServiceItem>> {
        let sql = if active_only {
            "SELECT id, name, category, price, active, created_at, updated_at
             FROM services WHERE active = 1 ORDER BY name"
        } else {
            "SELECT id, name, category, price, active, created_at, updated_at
             FROM services ORDER BY name"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_service_row)?;

        let mut services = Vec::new();
        for row in rows {
            services.push(row?.try_into()?);
        }
        Ok(services)
    }
}

/// Intermediate row struct for database mapping.
struct ServiceRow {
    id: String,
    name: String,
    category: Option<String>,
    price: String,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn map_service_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ServiceRow> {
    Ok(ServiceRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl TryFrom<ServiceRow> for ServiceItem {
    type Error = DbError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(ServiceItem {
            id: row.id,
            name: row.name,
            category: row.category,
            price: decode_money(&row.price)?,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let service = ServiceItem::new("Composite filling".into(), Decimal::new(7550, 2));
        db.upsert_service(&service).unwrap();

        let retrieved = db.get_service(&service.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Composite filling");
        assert_eq!(retrieved.price, Decimal::new(7550, 2));
    }

    #[test]
    fn test_upsert_updates_price() {
        let db = Database::open_in_memory().unwrap();

        let mut service = ServiceItem::new("Scaling".into(), Decimal::new(4000, 2));
        db.upsert_service(&service).unwrap();

        service.price = Decimal::new(4500, 2);
        db.upsert_service(&service).unwrap();

        let retrieved = db.get_service(&service.id).unwrap().unwrap();
        assert_eq!(retrieved.price, Decimal::new(4500, 2));
    }

    #[test]
    fn test_list_active_only() {
        let db = Database::open_in_memory().unwrap();

        let active = ServiceItem::new("Cleaning".into(), Decimal::new(3000, 2));
        let mut retired = ServiceItem::new("Amalgam filling".into(), Decimal::new(2500, 2));
        retired.active = false;

        db.upsert_service(&active).unwrap();
        db.upsert_service(&retired).unwrap();

        let all = db.list_services(false).unwrap();
        let active_list = db.list_services(true).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(active_list.len(), 1);
        assert_eq!(active_list[0].name, "Cleaning");
    }
}
