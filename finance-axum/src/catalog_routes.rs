//! REST API endpoints shared by every lookup table.
//!
//! The five lookup tables differ only in their key and payload types, so one
//! generic router serves them all; [`crate::router`] mounts it once per table.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Catalog, CatalogRecord},
    ports::{Application as _, CatalogRepository},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A lookup table whose key and payload can cross the wire
pub trait ApiCatalog:
    Catalog<
        Id: Serialize + DeserializeOwned + JsonSchema,
        Data: Serialize + DeserializeOwned + JsonSchema,
    >
{
}

impl<C> ApiCatalog for C where
    C: Catalog<
            Id: Serialize + DeserializeOwned + JsonSchema,
            Data: Serialize + DeserializeOwned + JsonSchema,
        >
{
}

/// Path parameter for entry-specific endpoints.
#[derive(Deserialize, JsonSchema)]
struct Id<T> {
    /// The key of the entry
    id: T,
}

type Record<C> = CatalogRecord<<C as Catalog>::Id, <C as Catalog>::Data>;

/// Creates a router for the lookup table `C`, tagged `tag` in the docs.
pub fn router<T, C>(tag: &'static str) -> ApiRouter<T>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_entries::<T, C>).post(create_entry::<T, C>),
            move |route| route.security_requirement("jwt").tag(tag),
        )
        .api_route_with(
            "/{id}",
            get(get_entry::<T, C>)
                .put(update_entry::<T, C>)
                .delete(delete_entry::<T, C>),
            move |route| route.security_requirement("jwt").tag(tag),
        )
}

async fn list_entries<T, C>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Record<C>>>, ApiError>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    access::view(&app, &auth).await?;
    let entries = <T::Repository as CatalogRepository<C>>::list_entries(app.database())
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entries))
}

/// Retrieve one entry, or `404 Not Found`.
async fn get_entry<T, C>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { id }): Path<Id<C::Id>>,
) -> Result<Json<Record<C>>, ApiError>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    access::view(&app, &auth).await?;
    <T::Repository as CatalogRepository<C>>::get_entry(app.database(), id)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| C::not_found(id).into())
}

/// Create an entry. Requires administrator permissions.
async fn create_entry<T, C>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(data): Json<C::Data>,
) -> Result<(StatusCode, Json<Record<C>>), ApiError>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    let stamp = access::administer(&app, &auth).await?;
    let entry = <T::Repository as CatalogRepository<C>>::create_entry(app.database(), data, &stamp)
        .await
        .map_err(ApiError::repository)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Replace an entry's payload. Requires administrator permissions.
async fn update_entry<T, C>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { id }): Path<Id<C::Id>>,
    Json(data): Json<C::Data>,
) -> Result<Json<Record<C>>, ApiError>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    let stamp = access::administer(&app, &auth).await?;
    <T::Repository as CatalogRepository<C>>::update_entry(app.database(), id, data, &stamp)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| C::not_found(id).into())
}

/// Delete an entry; `409 Conflict` while anything still refers to it.
async fn delete_entry<T, C>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { id }): Path<Id<C::Id>>,
) -> Result<StatusCode, ApiError>
where
    T: ApiApplication,
    C: ApiCatalog,
    T::Repository: CatalogRepository<C>,
{
    access::administer(&app, &auth).await?;
    let deleted = <T::Repository as CatalogRepository<C>>::delete_entry(app.database(), id)
        .await
        .map_err(ApiError::repository)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(C::not_found(id).into())
    }
}
