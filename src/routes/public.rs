use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use actix_web::http::header::Header;
use actix_web_httpauth::headers::authorization::{Authorization, Basic};
use askama::Template;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    auth::{
        authenticate_credentials, clear_logout_cookie, hash_password, is_logged_out,
        logout_cookie, AuthUser, AUTH_REALM,
    },
    db, filters, hours,
    models::{BarbershopRow, BookingDetailRow},
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct BookingCard {
    id: String,
    scheduled_for: String,
    service_name: String,
    price_cents: i64,
    shop_name: String,
    shop_image_url: String,
    confirmed: bool,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    greeting: String,
    today: String,
    upcoming: Vec<BookingCard>,
    has_upcoming: bool,
    barbershops: Vec<BarbershopRow>,
}

#[derive(Template)]
#[template(path = "barbershops.html")]
struct ShopsTemplate {
    query: String,
    has_query: bool,
    barbershops: Vec<BarbershopRow>,
    has_results: bool,
}

#[derive(Clone, Debug, Default)]
struct RegisterView {
    name: String,
    email: String,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    form: RegisterView,
    errors: Vec<String>,
    has_errors: bool,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/barbershops").route(web::get().to(list_shops)))
        .service(
            web::resource("/register")
                .route(web::get().to(show_register))
                .route(web::post().to(register)),
        )
        .service(web::resource("/login").route(web::get().to(login)))
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn logout(req: HttpRequest) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(logout_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    let auth = match Authorization::<Basic>::parse(&req) {
        Ok(auth) => auth,
        Err(_) => return auth_challenge(),
    };
    let credentials = auth.into_scheme();
    let email = credentials.user_id();
    let password = credentials.password().unwrap_or_default();

    if authenticate_credentials(&state, email, password).await.is_none() {
        return auth_challenge();
    }

    let requested = query.next.as_deref().unwrap_or("");
    let redirect = if requested.starts_with('/') {
        requested
    } else {
        "/bookings"
    };

    HttpResponse::SeeOther()
        .append_header((header::LOCATION, redirect.to_string()))
        .cookie(clear_logout_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

fn auth_challenge() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", AUTH_REALM)))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn home(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let now = Utc::now();
    let user = current_user(&state, &req).await;

    let (greeting, upcoming) = match &user {
        Some(user) => {
            let cards = db::list_upcoming_bookings(&state.db, &user.id, &hours::timestamp(now))
                .await
                .unwrap_or_default()
                .into_iter()
                .map(|row| to_card(row, now))
                .collect::<Vec<_>>();
            (format!("Hello, {}!", first_name(&user.name)), cards)
        }
        None => ("Hello, ready for a fresh cut?".to_string(), Vec::new()),
    };

    let barbershops = db::list_barbershops(&state.db).await.unwrap_or_default();
    let has_upcoming = !upcoming.is_empty();

    Ok(render(HomeTemplate {
        greeting,
        today: now.format("%A, %B %-d").to_string(),
        upcoming,
        has_upcoming,
        barbershops,
    }))
}

async fn list_shops(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner().search.unwrap_or_default().trim().to_string();
    let barbershops = if query.is_empty() {
        db::list_barbershops(&state.db).await
    } else {
        db::search_barbershops(&state.db, &query).await
    }
    .unwrap_or_default();

    Ok(render(ShopsTemplate {
        has_query: !query.is_empty(),
        query,
        has_results: !barbershops.is_empty(),
        barbershops,
    }))
}

async fn show_register() -> Result<HttpResponse> {
    Ok(render(RegisterTemplate {
        form: RegisterView::default(),
        errors: Vec::new(),
        has_errors: false,
    }))
}

async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_lowercase();

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push("Your name is required.".to_string());
    }
    if email.is_empty() || !email.contains('@') {
        errors.push("A valid email address is required.".to_string());
    }
    if form.password.len() < 8 {
        errors.push("Pick a password of at least 8 characters.".to_string());
    }
    if errors.is_empty() && db::find_user_by_email(&state.db, &email).await.is_some() {
        errors.push("An account with that email already exists.".to_string());
    }

    if !errors.is_empty() {
        return Ok(render(RegisterTemplate {
            form: RegisterView { name, email },
            has_errors: true,
            errors,
        }));
    }

    let password_hash = hash_password(&form.password)
        .map_err(|_| actix_web::error::ErrorInternalServerError("password hash failed"))?;
    let user_id = db::create_user(&state.db, &name, &email, &password_hash)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    db::log_activity(
        &state.db,
        "user_registered",
        &format!("{} created an account.", name),
        Some(&user_id),
        None,
    )
    .await;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/login?next=/bookings"))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

/// The home page is public; a signed-in user is recognised from the Basic
/// credentials the browser keeps sending after /login, unless the logout
/// marker is set.
async fn current_user(state: &web::Data<AppState>, req: &HttpRequest) -> Option<AuthUser> {
    if is_logged_out(req) {
        return None;
    }
    let auth = Authorization::<Basic>::parse(req).ok()?;
    let credentials = auth.into_scheme();
    let password = credentials.password().unwrap_or_default().to_string();
    authenticate_credentials(state, credentials.user_id(), &password).await
}

fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

fn to_card(row: BookingDetailRow, now: DateTime<Utc>) -> BookingCard {
    BookingCard {
        confirmed: hours::is_confirmed(&row.scheduled_for, now),
        id: row.id,
        scheduled_for: row.scheduled_for,
        service_name: row.service_name,
        price_cents: row.price_cents,
        shop_name: row.barbershop_name,
        shop_image_url: row.barbershop_image_url,
    }
}
