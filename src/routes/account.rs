use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    auth::{logout_guard, user_validator, AuthUser},
    db, filters, hours,
    models::BookingDetailRow,
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
#[template(path = "bookings.html")]
struct BookingsTemplate {
    user_name: String,
    confirmed: Vec<BookingCard>,
    finished: Vec<BookingCard>,
    has_confirmed: bool,
    has_finished: bool,
    notice: String,
    has_notice: bool,
    error: String,
    has_error: bool,
}

#[derive(Deserialize)]
struct BookingsQuery {
    created: Option<String>,
    cancelled: Option<String>,
    error: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .wrap(HttpAuthentication::basic(user_validator))
            .wrap(from_fn(logout_guard))
            .service(web::resource("").route(web::get().to(list_bookings)))
            .service(web::resource("/{id}/cancel").route(web::post().to(cancel_booking))),
    );
}

async fn list_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    query: web::Query<BookingsQuery>,
) -> Result<HttpResponse> {
    let now = Utc::now();
    let rows = db::list_user_bookings(&state.db, &auth.id)
        .await
        .unwrap_or_default();

    let mut confirmed = Vec::new();
    let mut finished = Vec::new();
    for row in rows {
        let card = to_card(row, now);
        if card.confirmed {
            confirmed.push(card);
        } else {
            finished.push(card);
        }
    }
    // Rows arrive newest-first; upcoming bookings read better soonest-first.
    confirmed.reverse();

    let query = query.into_inner();
    let notice = if query.created.is_some() {
        "Booking confirmed. See you there!"
    } else if query.cancelled.is_some() {
        "Your booking was cancelled."
    } else {
        ""
    }
    .to_string();
    let error = match query.error.as_deref() {
        Some("not-found") => "We couldn't find that booking.",
        Some(_) => "Something went wrong cancelling your booking. Try again.",
        None => "",
    }
    .to_string();

    Ok(render(BookingsTemplate {
        user_name: auth.name.clone(),
        has_confirmed: !confirmed.is_empty(),
        has_finished: !finished.is_empty(),
        confirmed,
        finished,
        has_notice: !notice.is_empty(),
        notice,
        has_error: !error.is_empty(),
        error,
    }))
}

async fn cancel_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();

    let location = match db::cancel_booking(&state.db, &booking_id, &auth.id).await {
        Ok(true) => {
            db::log_activity(
                &state.db,
                "booking_cancelled",
                &format!("{} cancelled booking {}.", auth.name, booking_id),
                Some(&auth.id),
                Some(&booking_id),
            )
            .await;
            "/bookings?cancelled=1"
        }
        Ok(false) => "/bookings?error=not-found",
        Err(err) => {
            log::error!("Cancel failed for booking {booking_id}: {err}");
            "/bookings?error=cancel-failed"
        }
    };

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish())
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
