use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    hours::timestamp,
    models::{BarbershopRow, BookingDetailRow, ServiceRow, UserRow},
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_catalog(pool).await?;
    seed_demo_user(pool).await?;
    Ok(())
}

pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    booking_id: Option<&str>,
) {
    let _ = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id, booking_id)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(timestamp(Utc::now()))
    .bind(user_id)
    .bind(booking_id)
    .execute(pool)
    .await;
}

pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<String, sqlx::Error> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO users (id, name, email, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, 1, ?)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(timestamp(Utc::now()))
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Option<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, active, created_at
           FROM users WHERE email = ? LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn list_barbershops(pool: &SqlitePool) -> Result<Vec<BarbershopRow>, sqlx::Error> {
    sqlx::query_as::<_, BarbershopRow>(
        "SELECT id, name, address, image_url FROM barbershops ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn search_barbershops(
    pool: &SqlitePool,
    query: &str,
) -> Result<Vec<BarbershopRow>, sqlx::Error> {
    sqlx::query_as::<_, BarbershopRow>(
        r#"SELECT id, name, address, image_url
           FROM barbershops
           WHERE name LIKE '%' || ? || '%'
           ORDER BY name"#,
    )
    .bind(query.trim())
    .fetch_all(pool)
    .await
}

pub async fn fetch_barbershop(pool: &SqlitePool, id: &str) -> Option<BarbershopRow> {
    sqlx::query_as::<_, BarbershopRow>(
        "SELECT id, name, address, image_url FROM barbershops WHERE id = ? LIMIT 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn list_services(
    pool: &SqlitePool,
    barbershop_id: &str,
) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, barbershop_id, name, description, price_cents, image_url
           FROM services
           WHERE barbershop_id = ?
           ORDER BY name"#,
    )
    .bind(barbershop_id)
    .fetch_all(pool)
    .await
}

/// Looks the service up scoped to its shop, so a mismatched pair 404s
/// instead of booking against the wrong barbershop.
pub async fn fetch_service(
    pool: &SqlitePool,
    barbershop_id: &str,
    service_id: &str,
) -> Option<ServiceRow> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, barbershop_id, name, description, price_cents, image_url
           FROM services
           WHERE id = ? AND barbershop_id = ?
           LIMIT 1"#,
    )
    .bind(service_id)
    .bind(barbershop_id)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn create_booking(
    pool: &SqlitePool,
    user_id: &str,
    service: &ServiceRow,
    scheduled_for: &str,
) -> Result<String, sqlx::Error> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO bookings (id, user_id, service_id, barbershop_id, scheduled_for, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&service.id)
    .bind(&service.barbershop_id)
    .bind(scheduled_for)
    .bind(timestamp(Utc::now()))
    .execute(pool)
    .await?;
    Ok(id)
}

/// Deletes the booking only when it belongs to `user_id`. Returns whether
/// a row was actually removed.
pub async fn cancel_booking(
    pool: &SqlitePool,
    booking_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = ? AND user_id = ?")
        .bind(booking_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn list_user_bookings(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetailRow>(
        r#"SELECT b.id, b.user_id, b.scheduled_for,
                  s.name AS service_name, s.price_cents,
                  p.name AS barbershop_name, p.address AS barbershop_address,
                  p.image_url AS barbershop_image_url
           FROM bookings b
           JOIN services s ON b.service_id = s.id
           JOIN barbershops p ON b.barbershop_id = p.id
           WHERE b.user_id = ?
           ORDER BY b.scheduled_for DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Bookings at or after `now_ts`, soonest first, for the home page rail.
pub async fn list_upcoming_bookings(
    pool: &SqlitePool,
    user_id: &str,
    now_ts: &str,
) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetailRow>(
        r#"SELECT b.id, b.user_id, b.scheduled_for,
                  s.name AS service_name, s.price_cents,
                  p.name AS barbershop_name, p.address AS barbershop_address,
                  p.image_url AS barbershop_image_url
           FROM bookings b
           JOIN services s ON b.service_id = s.id
           JOIN barbershops p ON b.barbershop_id = p.id
           WHERE b.user_id = ? AND b.scheduled_for >= ?
           ORDER BY b.scheduled_for ASC"#,
    )
    .bind(user_id)
    .bind(now_ts)
    .fetch_all(pool)
    .await
}

/// Timestamps already booked at a barbershop on one day. `day` is the
/// `YYYY-MM-DD` prefix of the stored timestamps.
pub async fn booked_times(
    pool: &SqlitePool,
    barbershop_id: &str,
    day: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String,)>(
        r#"SELECT scheduled_for FROM bookings
           WHERE barbershop_id = ? AND scheduled_for LIKE ? || 'T%'
           ORDER BY scheduled_for"#,
    )
    .bind(barbershop_id)
    .bind(day)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(ts,)| ts).collect())
}

pub async fn is_slot_taken(
    pool: &SqlitePool,
    barbershop_id: &str,
    scheduled_for: &str,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bookings WHERE barbershop_id = ? AND scheduled_for = ?",
    )
    .bind(barbershop_id)
    .bind(scheduled_for)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

struct CatalogService {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    image_url: &'static str,
}

struct CatalogShop {
    name: &'static str,
    address: &'static str,
    image_url: &'static str,
    services: &'static [CatalogService],
}

const CATALOG: &[CatalogShop] = &[
    CatalogShop {
        name: "Vintage Cuts",
        address: "12 Baker Street",
        image_url: "https://picsum.photos/seed/vintage-cuts/640/400",
        services: &[
            CatalogService {
                name: "Haircut",
                description: "Classic scissor cut with styling to finish.",
                price_cents: 4500,
                image_url: "https://picsum.photos/seed/haircut/220/220",
            },
            CatalogService {
                name: "Beard Sculpt",
                description: "Shape, trim, and hot-towel conditioning.",
                price_cents: 2500,
                image_url: "https://picsum.photos/seed/beard/220/220",
            },
            CatalogService {
                name: "Hair & Beard Combo",
                description: "Full cut plus beard work in one sitting.",
                price_cents: 6500,
                image_url: "https://picsum.photos/seed/combo/220/220",
            },
        ],
    },
    CatalogShop {
        name: "Clipper & Co.",
        address: "48 Union Avenue",
        image_url: "https://picsum.photos/seed/clipper-co/640/400",
        services: &[
            CatalogService {
                name: "Skin Fade",
                description: "Zero fade with sharp finishing lines.",
                price_cents: 4000,
                image_url: "https://picsum.photos/seed/fade/220/220",
            },
            CatalogService {
                name: "Neck Lineup",
                description: "Quick clean-up between full cuts.",
                price_cents: 1500,
                image_url: "https://picsum.photos/seed/lineup/220/220",
            },
            CatalogService {
                name: "Hot Towel Shave",
                description: "Straight-razor shave with hot towels.",
                price_cents: 3500,
                image_url: "https://picsum.photos/seed/shave/220/220",
            },
        ],
    },
    CatalogShop {
        name: "The Gent's Chair",
        address: "301 Market Street",
        image_url: "https://picsum.photos/seed/gents-chair/640/400",
        services: &[
            CatalogService {
                name: "Signature Cut",
                description: "Precision cut, styling, and lineup.",
                price_cents: 5000,
                image_url: "https://picsum.photos/seed/signature/220/220",
            },
            CatalogService {
                name: "Kids Cut",
                description: "Patient cuts for clients under twelve.",
                price_cents: 3000,
                image_url: "https://picsum.photos/seed/kids/220/220",
            },
            CatalogService {
                name: "Scalp Massage",
                description: "Fifteen relaxing minutes before any cut.",
                price_cents: 2000,
                image_url: "https://picsum.photos/seed/massage/220/220",
            },
        ],
    },
    CatalogShop {
        name: "Northside Fades",
        address: "77 Elm Street",
        image_url: "https://picsum.photos/seed/northside/640/400",
        services: &[
            CatalogService {
                name: "Fade & Line-Up",
                description: "Skin fade with sharp finishing touches.",
                price_cents: 4200,
                image_url: "https://picsum.photos/seed/fade-lineup/220/220",
            },
            CatalogService {
                name: "Eyebrow Trim",
                description: "Tidy brows, razor or tweezer finish.",
                price_cents: 1200,
                image_url: "https://picsum.photos/seed/brows/220/220",
            },
            CatalogService {
                name: "Deep Conditioning",
                description: "Treatment wash for dry or curly hair.",
                price_cents: 2800,
                image_url: "https://picsum.photos/seed/conditioning/220/220",
            },
        ],
    },
    CatalogShop {
        name: "Razor's Edge",
        address: "5 Dock Lane",
        image_url: "https://picsum.photos/seed/razors-edge/640/400",
        services: &[
            CatalogService {
                name: "Full Grooming",
                description: "Cut, beard, and grooming refresh.",
                price_cents: 7000,
                image_url: "https://picsum.photos/seed/grooming/220/220",
            },
            CatalogService {
                name: "Buzz Cut",
                description: "One guard all over, done fast.",
                price_cents: 2200,
                image_url: "https://picsum.photos/seed/buzz/220/220",
            },
        ],
    },
];

async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM barbershops")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    for shop in CATALOG {
        let shop_id = new_id();
        sqlx::query(
            "INSERT INTO barbershops (id, name, address, image_url) VALUES (?, ?, ?, ?)",
        )
        .bind(&shop_id)
        .bind(shop.name)
        .bind(shop.address)
        .bind(shop.image_url)
        .execute(pool)
        .await?;

        for service in shop.services {
            sqlx::query(
                r#"INSERT INTO services (id, barbershop_id, name, description, price_cents, image_url)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(new_id())
            .bind(&shop_id)
            .bind(service.name)
            .bind(service.description)
            .bind(service.price_cents)
            .bind(service.image_url)
            .execute(pool)
            .await?;
        }
    }

    log::info!("Seeded {} barbershops", CATALOG.len());
    Ok(())
}

async fn seed_demo_user(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let demo_seed = env::var("SEED_DEMO_USER").unwrap_or_else(|_| "false".to_string());
    if demo_seed != "true" {
        return Ok(());
    }

    let email = env::var("DEMO_EMAIL").unwrap_or_else(|_| "demo@barberbook.dev".to_string());
    if find_user_by_email(pool, &email).await.is_some() {
        return Ok(());
    }

    let password = env::var("DEMO_PASSWORD").unwrap_or_else(|_| "change-me".to_string());
    if password == "change-me" {
        log::warn!("DEMO_PASSWORD not set. Using default password 'change-me'. Set DEMO_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    create_user(pool, "Demo Client", &email, &password_hash).await?;
    Ok(())
}
