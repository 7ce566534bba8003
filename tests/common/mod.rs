//! Helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use diesel::RunQueryDsl;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pushkind_common::db::{DbPool, establish_connection_pool};
use pushkind_common::domain::auth::AuthenticatedUser;
use tempfile::TempDir;

use pushkind_bulk::domain::product::{NewProduct, Product, ProductPricing, VariantDraft};
use pushkind_bulk::forms::orders::{ItemPayload, OrderPayload};
use pushkind_bulk::repository::{DieselRepository, ProductWriter};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub const HUB_ID: i32 = 1;

/// Migrated SQLite database living in its own temporary directory.
pub struct TestDb {
    path: PathBuf,
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
        let path = dir.path().join(filename);
        let url = path.to_str().expect("Temporary path is not UTF-8.");

        let pool = establish_connection_pool(url).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");

        TestDb {
            path,
            pool,
            _dir: dir,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop a table so the next write touching it fails mid-transaction.
    pub fn drop_table(&self, table: &str) {
        let mut conn = self
            .pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        diesel::sql_query(format!("DROP TABLE {table}"))
            .execute(&mut conn)
            .expect("Failed to drop table.");
    }
}

pub fn user(email: &str, roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: email.into(),
        email: email.into(),
        hub_id: HUB_ID,
        name: email.split('@').next().unwrap_or(email).into(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        exp: 0,
    }
}

/// Chips sold as Small (₹20) and Large (₹35).
pub fn seed_chips(repo: &DieselRepository) -> Product {
    repo.create_product(&NewProduct::new(
        HUB_ID,
        "Chips",
        ProductPricing::Variants(vec![
            VariantDraft {
                id: None,
                name: "Small".into(),
                price: 2000,
            },
            VariantDraft {
                id: None,
                name: "Large".into(),
                price: 3500,
            },
        ]),
    ))
    .expect("create chips")
}

/// Maggi at a flat ₹14.
pub fn seed_maggi(repo: &DieselRepository) -> Product {
    repo.create_product(&NewProduct::new(HUB_ID, "Maggi", ProductPricing::Flat(1400)))
        .expect("create maggi")
}

pub fn variant_id(product: &Product, name: &str) -> i32 {
    product
        .variants
        .iter()
        .find(|variant| variant.name == name)
        .map(|variant| variant.id)
        .expect("variant exists")
}

pub fn line(product_id: i32, variant_id: Option<i32>, quantity: i32, paid: i64) -> ItemPayload {
    ItemPayload {
        id: None,
        product_id: Some(product_id),
        variant_id,
        quantity,
        amount_paid: Some(paid),
        discount: None,
    }
}

pub fn payload(items: Vec<ItemPayload>) -> OrderPayload {
    OrderPayload {
        customer_name: "Ravi Kumar".into(),
        customer_phone: "9876543210".into(),
        customer_alt_phone: None,
        customer_roll: Some("21CS10001".into()),
        hall: "nehru".into(),
        delivery_date: None,
        items,
    }
}
