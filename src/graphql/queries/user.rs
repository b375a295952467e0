use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The logged-in user, or null for anonymous requests
    async fn me(&self, ctx: &Context<'_>) -> Option<User> {
        ctx.current_user().cloned().map(User::from)
    }
}
