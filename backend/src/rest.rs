use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use tracing::info;

use crate::domain::{
    CalendarService, CostError, CostService, HolidayService, MarkingService, ReminderScheduler,
};
use crate::store::LocalStore;
use shared::interaction::DayAction;
use shared::{
    CalendarResponse, KeyValue, NotificationSettings, SavedPrices, SelectedMonthsResponse,
    SetNoteRequest, ToggleMarkResponse, ToggleMonthResponse,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub calendar: CalendarService,
    pub marking: MarkingService,
    pub cost: CostService,
    pub holidays: HolidayService,
    pub scheduler: ReminderScheduler,
}

/// All routes under /api
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/calendar", get(get_calendar))
        .route("/calendar/focus", post(set_focus))
        .route("/calendar/previous", post(previous_month))
        .route("/calendar/next", post(next_month))
        .route("/calendar/today", post(go_to_today))
        .route("/days/:date", get(get_day))
        .route("/days/:date/toggle", post(toggle_mark))
        .route("/days/:date/note", put(set_note))
        .route("/days/:date/gesture", post(day_gesture))
        .route("/months", get(list_months))
        .route("/months/:key/toggle", post(toggle_month))
        .route("/months/select-all", post(select_all_months))
        .route("/months/clear-all", post(clear_all_months))
        .route("/costs", post(calculate_costs))
        .route("/prices", get(get_prices))
        .route("/theme", get(get_theme).put(set_theme))
        .route("/notifications", get(get_notifications).put(set_notifications))
        .route("/values/:key", get(get_value))
        .route("/values", post(put_value))
        .with_state(state)
}

#[derive(Deserialize, Debug)]
pub struct FocusRequest {
    pub month: u32,
    pub year: i32,
}

#[derive(Deserialize, Debug)]
pub struct DayGestureRequest {
    pub action: DayAction,
}

#[derive(Deserialize, Debug)]
pub struct YearRequest {
    pub year: i32,
}

#[derive(Deserialize, Debug)]
pub struct ThemeRequest {
    pub theme: String,
}

/// Year/month of an ISO date string, for scoping the holiday lookup
fn date_scope(date: &str) -> Option<(i32, u32)> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((parsed.year(), parsed.month()))
}

/// Axum handler for GET /api/calendar
pub async fn get_calendar(State(state): State<AppState>) -> impl IntoResponse {
    let focus = state.calendar.get_focus_date();
    info!("GET /api/calendar - {}-{:02}", focus.year, focus.month);

    let marks = match state.store.marked_dates().await {
        Ok(marks) => marks,
        Err(e) => {
            tracing::error!("Error loading marks: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading marks").into_response();
        }
    };
    let notes = match state.store.day_notes().await {
        Ok(notes) => notes,
        Err(e) => {
            tracing::error!("Error loading notes: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading notes").into_response();
        }
    };
    let lookup = match state.holidays.get_holidays(focus.year, focus.month).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::error!("Error loading holiday cache: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading holidays").into_response();
        }
    };

    let grid = state.calendar.month_grid(
        focus.year,
        focus.month,
        Local::now().date_naive(),
        &marks,
        &notes,
        &lookup.table,
    );
    (
        StatusCode::OK,
        Json(CalendarResponse {
            grid,
            holiday_warning: lookup.warning,
        }),
    )
        .into_response()
}

/// Axum handler for POST /api/calendar/focus
pub async fn set_focus(
    State(state): State<AppState>,
    Json(request): Json<FocusRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/focus - {:?}", request);

    match state.calendar.set_focus_date(request.month, request.year) {
        Ok(focus) => (StatusCode::OK, Json(focus)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

/// Axum handler for POST /api/calendar/previous
pub async fn previous_month(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.calendar.navigate_previous_month())).into_response()
}

/// Axum handler for POST /api/calendar/next
pub async fn next_month(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.calendar.navigate_next_month())).into_response()
}

/// Axum handler for POST /api/calendar/today
pub async fn go_to_today(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.calendar.go_to_today())).into_response()
}

/// Axum handler for GET /api/days/:date
pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/days/{}", date);

    let Some((year, month)) = date_scope(&date) else {
        return (StatusCode::BAD_REQUEST, "Invalid date").into_response();
    };
    let lookup = match state.holidays.get_holidays(year, month).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::error!("Error loading holiday cache: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading holidays").into_response();
        }
    };

    match state.marking.day_detail(&date, &lookup.table).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => {
            tracing::error!("Error loading day detail: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler for POST /api/days/:date/toggle
pub async fn toggle_mark(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/days/{}/toggle", date);

    match state.marking.toggle_mark(&date).await {
        Ok(is_marked) => (
            StatusCode::OK,
            Json(ToggleMarkResponse { date, is_marked }),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Axum handler for PUT /api/days/:date/note
pub async fn set_note(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<SetNoteRequest>,
) -> impl IntoResponse {
    info!("PUT /api/days/{}/note", date);

    match state.marking.set_note(&date, &request.note).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Axum handler for POST /api/days/:date/gesture
pub async fn day_gesture(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<DayGestureRequest>,
) -> impl IntoResponse {
    info!("POST /api/days/{}/gesture - {:?}", date, request);

    let Some((year, month)) = date_scope(&date) else {
        return (StatusCode::BAD_REQUEST, "Invalid date").into_response();
    };
    let lookup = match state.holidays.get_holidays(year, month).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::error!("Error loading holiday cache: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading holidays").into_response();
        }
    };

    match state
        .marking
        .resolve_gesture(request.action, &date, &lookup.table)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Axum handler for GET /api/months
pub async fn list_months(State(state): State<AppState>) -> impl IntoResponse {
    match state.marking.selected_months().await {
        Ok(months) => (StatusCode::OK, Json(SelectedMonthsResponse { months })).into_response(),
        Err(e) => {
            tracing::error!("Error listing months: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing months").into_response()
        }
    }
}

/// Axum handler for POST /api/months/:key/toggle
pub async fn toggle_month(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/months/{}/toggle", key);

    match state.marking.toggle_month(&key).await {
        Ok(selected) => (
            StatusCode::OK,
            Json(ToggleMonthResponse {
                month_key: key,
                selected,
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Axum handler for POST /api/months/select-all
pub async fn select_all_months(
    State(state): State<AppState>,
    Json(request): Json<YearRequest>,
) -> impl IntoResponse {
    info!("POST /api/months/select-all - {:?}", request);

    match state.marking.select_all_months(request.year).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Error selecting months: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error selecting months").into_response()
        }
    }
}

/// Axum handler for POST /api/months/clear-all
pub async fn clear_all_months(
    State(state): State<AppState>,
    Json(request): Json<YearRequest>,
) -> impl IntoResponse {
    info!("POST /api/months/clear-all - {:?}", request);

    match state.marking.clear_all_months(request.year).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Error clearing months: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error clearing months").into_response()
        }
    }
}

/// Axum handler for POST /api/costs
pub async fn calculate_costs(
    State(state): State<AppState>,
    Json(prices): Json<SavedPrices>,
) -> impl IntoResponse {
    info!("POST /api/costs - {:?}", prices);

    match state.cost.calculate(prices, Local::now().date_naive()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(CostError::InvalidInput(message)) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }
        Err(e) => {
            tracing::error!("Error calculating costs: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error calculating costs").into_response()
        }
    }
}

/// Axum handler for GET /api/prices
pub async fn get_prices(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.saved_prices().await {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(e) => {
            tracing::error!("Error loading prices: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading prices").into_response()
        }
    }
}

/// Axum handler for GET /api/theme
pub async fn get_theme(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.theme().await {
        Ok(theme) => (StatusCode::OK, Json(theme)).into_response(),
        Err(e) => {
            tracing::error!("Error loading theme: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading theme").into_response()
        }
    }
}

/// Axum handler for PUT /api/theme
pub async fn set_theme(
    State(state): State<AppState>,
    Json(request): Json<ThemeRequest>,
) -> impl IntoResponse {
    info!("PUT /api/theme - {}", request.theme);

    match state.store.save_theme(&request.theme).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Error saving theme: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving theme").into_response()
        }
    }
}

/// Axum handler for GET /api/notifications
pub async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.notification_settings().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            tracing::error!("Error loading notification settings: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading settings").into_response()
        }
    }
}

/// Axum handler for PUT /api/notifications. Saving also arms or cancels
/// the reminder loop to match the new enabled flag.
pub async fn set_notifications(
    State(state): State<AppState>,
    Json(settings): Json<NotificationSettings>,
) -> impl IntoResponse {
    info!("PUT /api/notifications - enabled: {}", settings.enabled);

    if let Err(e) = state.store.save_notification_settings(&settings).await {
        tracing::error!("Error saving notification settings: {:?}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Error saving settings").into_response();
    }

    if settings.enabled {
        state.scheduler.start();
    } else {
        state.scheduler.stop().await;
    }
    (StatusCode::OK, Json(settings)).into_response()
}

/// Axum handler for GET /api/values/:key
pub async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/values/{}", key);

    match state.store.raw_value(&key).await {
        Ok(Some(value)) => (StatusCode::OK, Json(KeyValue { key, value })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Key not found").into_response(),
        Err(e) => {
            tracing::error!("Error retrieving value: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving value").into_response()
        }
    }
}

/// Axum handler for POST /api/values
pub async fn put_value(
    State(state): State<AppState>,
    Json(kv): Json<KeyValue>,
) -> impl IntoResponse {
    info!("POST /api/values - key: {}", kv.key);

    match state.store.set_raw_value(&kv.key, &kv.value).await {
        Ok(()) => (StatusCode::CREATED, Json(kv)).into_response(),
        Err(e) => {
            tracing::error!("Error storing value: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store value").into_response()
        }
    }
}
