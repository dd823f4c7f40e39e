//! # Seed Data Generator
//!
//! Populates a fresh database with demo data for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p gestor-db --bin seed
//!
//! # Specify database path
//! cargo run -p gestor-db --bin seed -- --db ./data/gestor.db
//! ```
//!
//! ## Generated Data
//! - One branch on point of sale 1
//! - `admin` (SUPERADMIN) and two vendors with commission rates
//! - Clients covering every IVA condition
//! - A grocery catalog with 21% and 10.5% IVA products
//!
//! Demo passwords are printed at the end; change them before going live.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use std::env;

use gestor_core::{Role, TaxCondition};
use gestor_db::repository::{NewBranch, NewClient, NewProduct, NewUser};
use gestor_db::{Database, DbConfig};

/// (sku, name, price in centavos, IVA bps, stock)
const PRODUCTS: &[(&str, &str, i64, u32, i64)] = &[
    ("YERBA-1KG", "Yerba mate 1kg", 350_000, 2100, 40),
    ("YERBA-500", "Yerba mate 500g", 190_000, 2100, 60),
    ("AZUCAR-1KG", "Azucar 1kg", 120_000, 2100, 50),
    ("HARINA-000", "Harina 000 1kg", 95_000, 1050, 80),
    ("FIDEOS-500", "Fideos tirabuzon 500g", 110_000, 1050, 100),
    ("ARROZ-1KG", "Arroz largo fino 1kg", 140_000, 1050, 70),
    ("ACEITE-900", "Aceite de girasol 900ml", 230_000, 2100, 30),
    ("LECHE-1L", "Leche entera 1L", 105_000, 1050, 120),
    ("DDL-400", "Dulce de leche 400g", 210_000, 2100, 35),
    ("GALLETITAS", "Galletitas de agua", 85_000, 2100, 90),
    ("CAFE-250", "Cafe molido 250g", 420_000, 2100, 25),
    ("PAN-RALLADO", "Pan rallado 500g", 70_000, 1050, 40),
];

const ADMIN_PASSWORD: &str = "admin1234";
const VENDOR_PASSWORD: &str = "vendedor123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./gestor_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Gestor Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./gestor_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Gestor Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Branch
    let branch = db
        .branches()
        .insert(NewBranch {
            name: "Casa Central".to_string(),
            address: Some("Av. Corrientes 1234, CABA".to_string()),
            point_of_sale: 1,
        })
        .await?;
    println!("✓ Branch '{}' (punto de venta {})", branch.name, branch.point_of_sale);

    // Users
    let admin = db
        .users()
        .bootstrap(NewUser {
            username: "admin".to_string(),
            password_hash: hash(ADMIN_PASSWORD)?,
            name: "Administracion".to_string(),
            role: Role::Superadmin,
            branch_id: Some(branch.id.clone()),
            commission_bps: 0,
        })
        .await?;
    if admin.is_none() {
        println!("⚠ Users appeared while seeding, stopping.");
        return Ok(());
    }

    for (username, name, bps) in [("lucia", "Lucia Gomez", 300), ("martin", "Martin Diaz", 500)] {
        db.users()
            .insert(NewUser {
                username: username.to_string(),
                password_hash: hash(VENDOR_PASSWORD)?,
                name: name.to_string(),
                role: Role::Vendedor,
                branch_id: Some(branch.id.clone()),
                commission_bps: bps,
            })
            .await?;
    }
    println!("✓ Users: admin + 2 vendors");

    // Clients
    let clients = [
        ("Distribuidora del Sur SA", Some("30712345671"), TaxCondition::ResponsableInscripto),
        ("Kiosco El Pibe", Some("20123456786"), TaxCondition::Monotributo),
        ("Fundacion Manos Abiertas", None, TaxCondition::Exento),
        ("Consumidor Final", None, TaxCondition::ConsumidorFinal),
    ];
    for (name, tax_id, condition) in clients {
        db.clients()
            .insert(NewClient {
                name: name.to_string(),
                tax_id: tax_id.map(str::to_string),
                tax_condition: condition,
                address: None,
                email: None,
                phone: None,
            })
            .await?;
    }
    println!("✓ Clients: {}", clients.len());

    // Catalog
    let mut generated = 0;
    for (sku, name, price_cents, tax_rate_bps, stock) in PRODUCTS {
        let product = NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            description: None,
            price_cents: *price_cents,
            cost_cents: Some(price_cents * 70 / 100),
            tax_rate_bps: *tax_rate_bps,
            track_inventory: true,
            allow_negative_stock: false,
            current_stock: *stock,
        };
        if let Err(e) = db.products().insert(product).await {
            eprintln!("Failed to insert {}: {}", sku, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ Products: {}", generated);

    println!();
    println!("Logins:");
    println!("  admin  / {}", ADMIN_PASSWORD);
    println!("  lucia  / {}", VENDOR_PASSWORD);
    println!("  martin / {}", VENDOR_PASSWORD);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| e.to_string())
}
