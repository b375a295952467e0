//! User mutations: account creation and login
//!
//! Neither requires authentication. Every user shares the server's login
//! password, so `createUser` only records a username and favourite genre.

use super::prelude::*;
use crate::services::AuthError;
use crate::store::add_user;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        favorite_genre: String,
    ) -> Result<Option<User>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let user = add_user(
            store.as_ref(),
            CreateUser {
                username: username.clone(),
                favorite_genre,
            },
        )
        .await
        .map_err(|e| user_input_error("Creating the user failed", username, e))?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(Some(User::from(user)))
    }

    /// Exchange credentials for a session token
    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<Option<Token>> {
        let auth = ctx.data_unchecked::<Arc<AuthService>>();
        match auth.login(&username, &password).await {
            Ok(value) => Ok(Some(Token { value })),
            Err(AuthError::WrongCredentials) => Err(unauthenticated("wrong credentials")),
            Err(e) => Err(internal_error(e)),
        }
    }
}
