//! Permission and partner checks shared by the handlers.

use crate::{ApiApplication, error::ApiError};
use finance_api::{
    models::{Failure, Partner, PartnerId, Stamp},
    ports::{Application as _, PartnerDirectory as _},
};
use headers::{Authorization, authorization::Bearer};
use tracing::{Level, event};

/// Require read access
pub(crate) async fn view<T: ApiApplication>(
    app: &T,
    auth: &Authorization<Bearer>,
) -> Result<(), ApiError> {
    if app.can_view(auth).await {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

/// Require edit access, returning the stamp for the mutation
pub(crate) async fn edit<T: ApiApplication>(
    app: &T,
    auth: &Authorization<Bearer>,
) -> Result<Stamp, ApiError> {
    let by = app.can_edit(auth).await.ok_or_else(ApiError::unauthorized)?;
    Ok(Stamp::new(app.now(), by).on(app.today()))
}

/// Require administrator access, returning the stamp for the mutation
pub(crate) async fn administer<T: ApiApplication>(
    app: &T,
    auth: &Authorization<Bearer>,
) -> Result<Stamp, ApiError> {
    let by = app
        .can_administer(auth)
        .await
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Stamp::new(app.now(), by).on(app.today()))
}

/// Require that the partner directory knows `partner_id`
pub(crate) async fn partner<T: ApiApplication>(
    app: &T,
    partner_id: PartnerId,
) -> Result<Partner, ApiError> {
    match app.partners().find_partner(partner_id).await {
        Ok(Some(partner)) => Ok(partner),
        Ok(None) => Err(Failure::PartnerNotFound(partner_id).into()),
        Err(err) => {
            event!(
                Level::WARN,
                partner_id = partner_id.0,
                err = err.to_string(),
                "partner directory lookup failed"
            );
            Err(Failure::PartnerUnavailable.into())
        }
    }
}
