use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// Get the current authenticated user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .users()
            .get_by_id(&user.user_id)
            .await?
            .ok_or_else(|| not_found("User not found"))?;

        Ok(record.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();

        Ok(db.users().get_by_id(&id).await?.map(User::from))
    }

    /// Users the requester has blocked
    async fn blocked_users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let records = db.blocked_users().blocked_users(&user.user_id).await?;
        Ok(records.into_iter().map(User::from).collect())
    }
}
