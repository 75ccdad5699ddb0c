use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Duration;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{
    Car, CarAttributes, CarFilter, CarListQuery, CarRequest, ListMeta, ListResponse, NewRental,
    RentCarRequest,
};
use crate::repositories::RepositoryError;
use crate::utils::{Page, PageQuery};

const CAR_MODEL: &str = "Car";

pub async fn handle_list_cars(
    State(state): State<AppState>,
    AppQuery(page_query): AppQuery<PageQuery>,
    AppQuery(list_query): AppQuery<CarListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = Page::resolve(page_query, &state.pagination)?;
    let filter = CarFilter {
        size: list_query.size.filter(|size| !size.is_empty()),
        available_at: list_query.available_at,
    };

    let cars = state
        .cars
        .find_all(&filter, page.limit(), page.offset())
        .await?;
    let count = state.cars.count(&filter).await?;

    Ok(Json(ListResponse {
        data: cars,
        meta: ListMeta {
            pagination: page.summary(count),
        },
    }))
}

pub async fn handle_get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let car = find_car(&state, id).await?;
    Ok(Json(car))
}

pub async fn handle_create_car(
    State(state): State<AppState>,
    AppJson(request): AppJson<CarRequest>,
) -> AppResult<impl IntoResponse> {
    let attrs = CarAttributes {
        name: request.name,
        price: request.price,
        size: request.size,
        image: request.image,
        is_currently_rented: false,
    };

    let car = state.cars.create(attrs).await.map_err(AppError::Rejected)?;
    tracing::info!(car_id = car.id, "car created");

    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn handle_update_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<CarRequest>,
) -> AppResult<impl IntoResponse> {
    let attrs = CarAttributes {
        name: request.name,
        price: request.price,
        size: request.size,
        image: request.image,
        is_currently_rented: request.is_currently_rented.unwrap_or(false),
    };

    let car = state
        .cars
        .update(id, attrs)
        .await
        .map_err(AppError::Rejected)?
        .ok_or_else(|| AppError::record_not_found(CAR_MODEL))?;

    Ok(Json(car))
}

pub async fn handle_delete_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let car = state
        .cars
        .find_by_pk(id)
        .await
        .map_err(AppError::Rejected)?
        .ok_or_else(|| AppError::record_not_found(CAR_MODEL))?;

    let destroyed = state.cars.destroy(car.id).await.map_err(AppError::Rejected)?;
    if !destroyed {
        return Err(AppError::record_not_found(CAR_MODEL));
    }
    tracing::info!(car_id = car.id, "car deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_rent_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<RentCarRequest>,
) -> AppResult<impl IntoResponse> {
    let car = state
        .cars
        .find_by_pk(id)
        .await
        .map_err(AppError::Rejected)?
        .ok_or_else(|| AppError::record_not_found(CAR_MODEL))?;

    let rent_started_at = request.rent_started_at;
    let rent_ended_at = request
        .rent_ended_at
        .unwrap_or(rent_started_at + Duration::days(1));

    if rent_ended_at < rent_started_at {
        return Err(AppError::Rejected(RepositoryError::Validation(
            "rentEndedAt must not be before rentStartedAt".to_string(),
        )));
    }

    let active_rent = state
        .rentals
        .find_overlapping(car.id, rent_started_at, rent_ended_at)
        .await
        .map_err(AppError::Rejected)?;
    if active_rent.is_some() {
        return Err(AppError::car_already_rented(car));
    }

    let rental = state
        .rentals
        .create(NewRental {
            user_id: user.id,
            car_id: car.id,
            rent_started_at,
            rent_ended_at,
        })
        .await
        .map_err(AppError::Rejected)?;
    tracing::info!(car_id = car.id, user_id = user.id, rental_id = rental.id, "car rented");

    Ok((StatusCode::CREATED, Json(rental)))
}

async fn find_car(state: &AppState, id: i32) -> AppResult<Car> {
    state
        .cars
        .find_by_pk(id)
        .await?
        .ok_or_else(|| AppError::record_not_found(CAR_MODEL))
}
