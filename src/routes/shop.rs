use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    auth::{logout_guard, user_validator, AuthUser},
    db, filters, hours,
    models::{BarbershopRow, ServiceRow},
    state::AppState,
    templates::render,
};

#[derive(Template)]
#[template(path = "shop.html")]
struct ShopTemplate {
    shop: BarbershopRow,
    services: Vec<ServiceRow>,
}

#[derive(Clone, Debug)]
struct DayOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct SlotOption {
    time: String,
    taken: bool,
}

#[derive(Template)]
#[template(path = "book.html")]
struct BookTemplate {
    shop: BarbershopRow,
    service: ServiceRow,
    days: Vec<DayOption>,
    slots: Vec<SlotOption>,
    selected_date: String,
    selected_date_label: String,
    errors: Vec<String>,
    has_errors: bool,
}

#[derive(Deserialize)]
struct BookingQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
struct BookingForm {
    date: String,
    time: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/barbershops/{id}").route(web::get().to(shop_page)))
        .service(
            web::scope("/barbershops/{id}/services/{service_id}")
                .wrap(HttpAuthentication::basic(user_validator))
                .wrap(from_fn(logout_guard))
                .service(
                    web::resource("/book")
                        .route(web::get().to(show_booking))
                        .route(web::post().to(create_booking)),
                ),
        );
}

async fn shop_page(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let shop_id = path.into_inner();
    let Some(shop) = db::fetch_barbershop(&state.db, &shop_id).await else {
        return Ok(redirect_to("/"));
    };

    let services = db::list_services(&state.db, &shop.id).await.unwrap_or_default();

    Ok(render(ShopTemplate { shop, services }))
}

async fn show_booking(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse> {
    let (shop_id, service_id) = path.into_inner();
    let Some(shop) = db::fetch_barbershop(&state.db, &shop_id).await else {
        return Ok(redirect_to("/"));
    };
    let Some(service) = db::fetch_service(&state.db, &shop_id, &service_id).await else {
        return Ok(redirect_to(&format!("/barbershops/{shop_id}")));
    };

    let today = Utc::now().date_naive();
    let selected = query
        .into_inner()
        .date
        .as_deref()
        .and_then(parse_day)
        .filter(|day| *day >= today)
        .unwrap_or(today);

    let template = booking_sheet(&state, shop, service, selected, Vec::new()).await;
    Ok(render(template))
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(String, String)>,
    form: web::Form<BookingForm>,
) -> Result<HttpResponse> {
    let (shop_id, service_id) = path.into_inner();
    let Some(shop) = db::fetch_barbershop(&state.db, &shop_id).await else {
        return Ok(redirect_to("/"));
    };
    let Some(service) = db::fetch_service(&state.db, &shop_id, &service_id).await else {
        return Ok(redirect_to(&format!("/barbershops/{shop_id}")));
    };

    let form = form.into_inner();
    let now = Utc::now();
    let today = now.date_naive();
    let mut errors = Vec::new();

    let day = parse_day(&form.date);
    if day.is_none() {
        errors.push("Please pick a day.".to_string());
    }

    // The submitted time must be one of the canonical half-hour slots.
    let slot = day.and_then(|day| {
        hours::day_time_slots(day)
            .into_iter()
            .find(|slot| slot.format("%H:%M").to_string() == form.time)
    });
    if day.is_some() && slot.is_none() {
        errors.push("Please pick one of the available times.".to_string());
    }

    let mut scheduled_for = None;
    if let Some(slot) = slot {
        let ts = hours::naive_to_timestamp(slot);
        if ts <= hours::timestamp(now) {
            errors.push("That time has already passed. Pick a time in the future.".to_string());
        } else {
            match db::is_slot_taken(&state.db, &shop.id, &ts).await {
                Ok(true) => {
                    errors.push("That time was just taken. Pick another slot.".to_string())
                }
                Ok(false) => scheduled_for = Some(ts),
                Err(err) => {
                    log::error!("Slot lookup failed: {err}");
                    errors.push("We couldn't check that time. Try again.".to_string());
                }
            }
        }
    }

    let Some(scheduled_for) = scheduled_for else {
        let selected = day.filter(|day| *day >= today).unwrap_or(today);
        let template = booking_sheet(&state, shop, service, selected, errors).await;
        return Ok(render(template));
    };

    let booking_id = db::create_booking(&state.db, &auth.id, &service, &scheduled_for)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    db::log_activity(
        &state.db,
        "booking_created",
        &format!("{} booked {} at {}.", auth.name, service.name, shop.name),
        Some(&auth.id),
        Some(&booking_id),
    )
    .await;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/bookings?created=1"))
        .finish())
}

async fn booking_sheet(
    state: &web::Data<AppState>,
    shop: BarbershopRow,
    service: ServiceRow,
    selected: NaiveDate,
    errors: Vec<String>,
) -> BookTemplate {
    let now = Utc::now();
    let now_ts = hours::timestamp(now);
    let today = now.date_naive();

    let days = hours::upcoming_days(today, hours::BOOKING_WINDOW_DAYS)
        .into_iter()
        .map(|day| DayOption {
            value: day.format("%Y-%m-%d").to_string(),
            label: day.format("%a %-d").to_string(),
            selected: day == selected,
        })
        .collect();

    let day_key = selected.format("%Y-%m-%d").to_string();
    let booked = db::booked_times(&state.db, &shop.id, &day_key)
        .await
        .unwrap_or_default();

    // A slot is unavailable once booked at this shop, or already past today.
    let slots = hours::day_time_slots(selected)
        .into_iter()
        .map(|slot| {
            let ts = hours::naive_to_timestamp(slot);
            SlotOption {
                time: slot.format("%H:%M").to_string(),
                taken: booked.contains(&ts) || ts <= now_ts,
            }
        })
        .collect();

    BookTemplate {
        selected_date_label: selected.format("%A, %B %-d").to_string(),
        selected_date: day_key,
        shop,
        service,
        days,
        slots,
        has_errors: !errors.is_empty(),
        errors,
    }
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location.to_string()))
        .finish()
}
