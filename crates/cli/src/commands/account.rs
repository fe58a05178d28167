//! Sign-in, registration and profile commands.

use secrecy::SecretString;

use cardhub_storefront::error::AppError;
use cardhub_storefront::profile::ProfileForm;
use cardhub_storefront::session::Registration;

use super::Context;
use crate::render;

pub async fn login(ctx: &Context, email: &str, password: &SecretString) -> Result<(), AppError> {
    let user = ctx.session().login(email, password).await?;
    render::signed_in(&user);
    Ok(())
}

pub async fn register(ctx: &Context, form: &Registration) -> Result<(), AppError> {
    let user = ctx.session().register(form).await?;
    render::notice("Account created");
    render::signed_in(&user);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<(), AppError> {
    ctx.session().logout()?;
    render::notice("Signed out");
    Ok(())
}

pub async fn profile(ctx: &Context) -> Result<(), AppError> {
    let user = ctx.session().refresh_user().await?;
    render::profile(&ProfileForm::new(user));
    Ok(())
}

pub async fn update_profile(
    ctx: &Context,
    username: Option<&str>,
    telegram: Option<&str>,
) -> Result<(), AppError> {
    if username.is_none() && telegram.is_none() {
        return Err(AppError::BadRequest(
            "Nothing to change; pass --username or --telegram".to_string(),
        ));
    }

    let session = ctx.session();
    let user = session.refresh_user().await?;
    let mut form = ProfileForm::new(user);
    form.edit();
    if let Some(username) = username {
        form.set_username(username);
    }
    if let Some(handle) = telegram {
        form.set_telegram_username(handle);
    }

    match form.save(&session).await? {
        Some(message) => render::notice(&message),
        None => render::notice("Nothing changed"),
    }
    render::profile(&form);
    Ok(())
}
