#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BarbershopRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub image_url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub barbershop_id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub image_url: String,
}

/// One booking joined with its service and barbershop, shaped for the
/// booking cards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingDetailRow {
    pub id: String,
    pub user_id: String,
    pub scheduled_for: String,
    pub service_name: String,
    pub price_cents: i64,
    pub barbershop_name: String,
    pub barbershop_address: String,
    pub barbershop_image_url: String,
}
