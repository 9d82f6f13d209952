use barberbook::auth::hash_password;
use barberbook::db;
use barberbook::hours;
use barberbook::models::ServiceRow;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn setup_pool() -> SqlitePool {
    // A wider pool would hand each connection its own empty in-memory db.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn seeded_pool() -> SqlitePool {
    let pool = setup_pool().await;
    db::seed_defaults(&pool).await.unwrap();
    pool
}

async fn register_user(pool: &SqlitePool, name: &str, email: &str) -> String {
    let hash = hash_password("sekret-pass-1").unwrap();
    db::create_user(pool, name, email, &hash).await.unwrap()
}

async fn first_service(pool: &SqlitePool) -> ServiceRow {
    let shops = db::list_barbershops(pool).await.unwrap();
    let services = db::list_services(pool, &shops[0].id).await.unwrap();
    services[0].clone()
}

fn ts_hours_from_now(offset: i64) -> String {
    hours::timestamp(Utc::now() + Duration::hours(offset))
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let pool = seeded_pool().await;
    let before = db::list_barbershops(&pool).await.unwrap().len();
    assert!(before > 0);

    db::seed_defaults(&pool).await.unwrap();
    let after = db::list_barbershops(&pool).await.unwrap().len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn every_seeded_shop_has_services() {
    let pool = seeded_pool().await;
    for shop in db::list_barbershops(&pool).await.unwrap() {
        let services = db::list_services(&pool, &shop.id).await.unwrap();
        assert!(!services.is_empty(), "{} has no services", shop.name);
        assert!(services.iter().all(|s| s.price_cents > 0));
    }
}

#[tokio::test]
async fn search_matches_case_insensitive_substring() {
    let pool = seeded_pool().await;

    let hits = db::search_barbershops(&pool, "vintage").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Vintage Cuts");

    let none = db::search_barbershops(&pool, "zzz-no-such-shop").await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn service_lookup_is_scoped_to_its_shop() {
    let pool = seeded_pool().await;
    let shops = db::list_barbershops(&pool).await.unwrap();
    let service = db::list_services(&pool, &shops[0].id).await.unwrap()[0].clone();

    assert!(db::fetch_service(&pool, &shops[0].id, &service.id).await.is_some());
    // The same service id under a different shop must not resolve.
    assert!(db::fetch_service(&pool, &shops[1].id, &service.id).await.is_none());
}

#[tokio::test]
async fn bookings_split_into_confirmed_and_finished() {
    let pool = seeded_pool().await;
    let user_id = register_user(&pool, "Ana Martins", "ana@example.com").await;
    let service = first_service(&pool).await;

    let future_ts = ts_hours_from_now(48);
    let past_ts = ts_hours_from_now(-48);
    db::create_booking(&pool, &user_id, &service, &future_ts).await.unwrap();
    db::create_booking(&pool, &user_id, &service, &past_ts).await.unwrap();

    let all = db::list_user_bookings(&pool, &user_id).await.unwrap();
    assert_eq!(all.len(), 2);

    let now = Utc::now();
    let confirmed: Vec<_> = all
        .iter()
        .filter(|b| hours::is_confirmed(&b.scheduled_for, now))
        .collect();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].scheduled_for, future_ts);

    let upcoming = db::list_upcoming_bookings(&pool, &user_id, &hours::timestamp(now))
        .await
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].scheduled_for, future_ts);
}

#[tokio::test]
async fn bookings_join_service_and_shop_details() {
    let pool = seeded_pool().await;
    let user_id = register_user(&pool, "Ana Martins", "ana@example.com").await;
    let service = first_service(&pool).await;

    db::create_booking(&pool, &user_id, &service, &ts_hours_from_now(24))
        .await
        .unwrap();

    let bookings = db::list_user_bookings(&pool, &user_id).await.unwrap();
    assert_eq!(bookings[0].service_name, service.name);
    assert_eq!(bookings[0].price_cents, service.price_cents);
    assert!(!bookings[0].barbershop_name.is_empty());
    assert!(!bookings[0].barbershop_address.is_empty());
}

#[tokio::test]
async fn cancel_removes_only_the_owners_booking() {
    let pool = seeded_pool().await;
    let ana = register_user(&pool, "Ana Martins", "ana@example.com").await;
    let bruno = register_user(&pool, "Bruno Costa", "bruno@example.com").await;
    let service = first_service(&pool).await;

    let booking_id = db::create_booking(&pool, &ana, &service, &ts_hours_from_now(24))
        .await
        .unwrap();

    // A different user cannot cancel it.
    assert!(!db::cancel_booking(&pool, &booking_id, &bruno).await.unwrap());
    assert_eq!(db::list_user_bookings(&pool, &ana).await.unwrap().len(), 1);

    // The owner can, exactly once.
    assert!(db::cancel_booking(&pool, &booking_id, &ana).await.unwrap());
    assert!(db::list_user_bookings(&pool, &ana).await.unwrap().is_empty());
    assert!(!db::cancel_booking(&pool, &booking_id, &ana).await.unwrap());
}

#[tokio::test]
async fn cancel_of_unknown_id_reports_nothing_removed() {
    let pool = seeded_pool().await;
    let ana = register_user(&pool, "Ana Martins", "ana@example.com").await;
    assert!(!db::cancel_booking(&pool, "no-such-booking", &ana).await.unwrap());
}

#[tokio::test]
async fn slot_availability_tracks_bookings() {
    let pool = seeded_pool().await;
    let user_id = register_user(&pool, "Ana Martins", "ana@example.com").await;
    let service = first_service(&pool).await;

    let day = (Utc::now() + Duration::days(2)).date_naive();
    let slot = day.and_hms_opt(10, 0, 0).unwrap();
    let ts = hours::naive_to_timestamp(slot);

    assert!(!db::is_slot_taken(&pool, &service.barbershop_id, &ts).await.unwrap());
    db::create_booking(&pool, &user_id, &service, &ts).await.unwrap();
    assert!(db::is_slot_taken(&pool, &service.barbershop_id, &ts).await.unwrap());

    let day_key = day.format("%Y-%m-%d").to_string();
    let booked = db::booked_times(&pool, &service.barbershop_id, &day_key)
        .await
        .unwrap();
    assert_eq!(booked, vec![ts.clone()]);

    // Other days and other shops stay clear.
    let other_day = (day + Duration::days(1)).format("%Y-%m-%d").to_string();
    assert!(db::booked_times(&pool, &service.barbershop_id, &other_day)
        .await
        .unwrap()
        .is_empty());
    let shops = db::list_barbershops(&pool).await.unwrap();
    let other_shop = shops.iter().find(|s| s.id != service.barbershop_id).unwrap();
    assert!(!db::is_slot_taken(&pool, &other_shop.id, &ts).await.unwrap());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let pool = setup_pool().await;
    register_user(&pool, "Ana Martins", "ana@example.com").await;
    let hash = hash_password("another-pass").unwrap();
    assert!(db::create_user(&pool, "Impostor", "ana@example.com", &hash)
        .await
        .is_err());
}
