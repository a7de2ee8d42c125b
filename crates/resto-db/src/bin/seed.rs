//! # Seed Data Generator
//!
//! Populates the database with staff accounts, a small menu and a sample
//! promo for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/resto.db (default)
//! cargo run -p resto-db --bin seed
//!
//! # Specify database path
//! cargo run -p resto-db --bin seed -- --db ./data/dev.db
//!
//! # Override the password given to every seeded account
//! cargo run -p resto-db --bin seed -- --password rahasia123
//! ```
//!
//! ## Generated Data
//! - Users: one admin, one kasir, one koki (argon2-hashed passwords)
//! - Categories: Makanan, Minuman, Camilan, each with a handful of menus
//! - Promo: `HEMAT20`, 20% off capped at 3,000.00, 100 uses, valid 30 days
//!
//! Users are skipped individually when their email already exists; the
//! catalog is skipped as a whole when any menu exists.

use std::env;

use anyhow::Context;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::{Duration, Utc};
use resto_core::{Category, Menu, Promo, PromoKind, Role, User};
use resto_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, email, role)
const USERS: &[(&str, &str, Role)] = &[
    ("Admin Utama", "admin@resto.local", Role::Admin),
    ("Siti Kasir", "kasir@resto.local", Role::Kasir),
    ("Joko Koki", "koki@resto.local", Role::Koki),
];

/// Category name → (menu name, price in cents).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Makanan",
        &[
            ("Nasi Goreng Spesial", 2_500_000),
            ("Mie Ayam Bakso", 2_000_000),
            ("Soto Ayam", 1_800_000),
            ("Ayam Geprek", 2_200_000),
            ("Sate Ayam (10 tusuk)", 3_000_000),
        ],
    ),
    (
        "Minuman",
        &[
            ("Es Teh Manis", 500_000),
            ("Es Jeruk", 700_000),
            ("Kopi Susu", 1_500_000),
            ("Jus Alpukat", 1_800_000),
        ],
    ),
    (
        "Camilan",
        &[
            ("Pisang Goreng", 1_000_000),
            ("Tahu Crispy", 800_000),
            ("Kentang Goreng", 1_500_000),
        ],
    ),
];

const DEFAULT_PASSWORD: &str = "resto12345";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/resto.db");
    let mut password = String::from(DEFAULT_PASSWORD);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Resto POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./data/resto.db)");
                println!("  -p, --password <PASS>    Password for seeded accounts (default: {DEFAULT_PASSWORD})");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Resto POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    seed_users(&db, &password).await?;
    seed_catalog(&db).await?;
    seed_promo(&db).await?;

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_users(db: &Database, password: &str) -> anyhow::Result<()> {
    println!();
    println!("Users:");

    for (name, email, role) in USERS {
        if db.users().get_by_email(email).await?.is_some() {
            println!("  ⚠ {} already exists, skipping", email);
            continue;
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: *role,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await?;
        println!("  ✓ {} <{}> / {}", role, email, password);
    }

    Ok(())
}

async fn seed_catalog(db: &Database) -> anyhow::Result<()> {
    println!();
    println!("Catalog:");

    let existing = db.menus().count().await?;
    if existing > 0 {
        println!("  ⚠ Database already has {} menus, skipping", existing);
        return Ok(());
    }

    let mut generated = 0;
    for (category_name, menus) in CATALOG {
        let now = Utc::now();
        let category = match db.categories().get_by_name(category_name).await? {
            Some(category) => category,
            None => {
                let category = Category {
                    id: Uuid::new_v4().to_string(),
                    name: category_name.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                db.categories().insert(&category).await?;
                category
            }
        };

        for (menu_name, price_cents) in *menus {
            let menu = Menu {
                id: Uuid::new_v4().to_string(),
                name: menu_name.to_string(),
                description: None,
                price_cents: *price_cents,
                is_available: true,
                category_id: category.id.clone(),
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.menus().insert(&menu).await {
                eprintln!("  Failed to insert {}: {}", menu.name, e);
                continue;
            }
            generated += 1;
        }

        println!("  ✓ {} ({} menus)", category.name, menus.len());
    }

    println!("  Generated {} menus", generated);
    Ok(())
}

async fn seed_promo(db: &Database) -> anyhow::Result<()> {
    println!();
    println!("Promo:");

    if db.promos().find_by_code("HEMAT20").await?.is_some() {
        println!("  ⚠ HEMAT20 already exists, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let promo = Promo {
        id: Uuid::new_v4().to_string(),
        code: "HEMAT20".to_string(),
        description: Some("Diskon 20% maksimal 3.000".to_string()),
        kind: PromoKind::Percentage,
        value: 20,
        min_purchase_cents: 2_000_000,
        max_discount_cents: 300_000,
        usage_limit: 100,
        usage_count: 0,
        is_active: true,
        start_date: now,
        end_date: now + Duration::days(30),
        created_at: now,
        updated_at: now,
    };
    db.promos().insert(&promo).await?;
    println!("  ✓ HEMAT20 (20%, max 3,000.00, 100 uses)");

    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}
