use super::entities::user;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

pub struct UserRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UserRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(user_id.to_string())
            .one(self.conn)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.conn)
            .await
    }

    pub async fn upsert(&self, user_data: &crate::domain::User) -> Result<user::Model, DbErr> {
        if let Some(existing) = self.find_by_id(&user_data.user_id).await? {
            let mut active: user::ActiveModel = existing.into();
            active.email = Set(user_data.email.clone());
            active.first_name = Set(user_data.first_name.clone());
            active.last_name = Set(user_data.last_name.clone());
            active.bio = Set(user_data.bio.clone());
            active.update(self.conn).await
        } else {
            let active = user::ActiveModel {
                user_id: Set(user_data.user_id.clone()),
                first_name: Set(user_data.first_name.clone()),
                last_name: Set(user_data.last_name.clone()),
                email: Set(user_data.email.clone()),
                bio: Set(user_data.bio.clone()),
            };
            active.insert(self.conn).await
        }
    }

    /// The database cascades the user's upvotes and comments and detaches
    /// their ideas.
    pub async fn delete(&self, user_id: &str) -> Result<u64, DbErr> {
        let result = user::Entity::delete_by_id(user_id.to_string())
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}

impl From<user::Model> for crate::domain::User {
    fn from(model: user::Model) -> Self {
        Self {
            user_id: model.user_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            bio: model.bio,
        }
    }
}
