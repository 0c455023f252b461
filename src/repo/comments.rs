use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::comment;
use crate::entities::user::Role;
use crate::middleware::auth::AuthUser;

/// All comments on a snippet, oldest first. Callers apply `visible_to` for
/// the public view; hidden comments are retained for moderation.
pub async fn for_snippet(
    db: &DatabaseConnection,
    snippet_id: Uuid,
) -> Result<Vec<comment::Model>, DbErr> {
    comment::Entity::find()
        .filter(comment::Column::SnippetId.eq(snippet_id))
        .order_by_asc(comment::Column::CreatedAt)
        .all(db)
        .await
}

/// A hidden comment stays visible to its author and to moderators, never to
/// the public.
pub fn visible_to(comment: &comment::Model, viewer: Option<&AuthUser>) -> bool {
    if comment.is_displayed {
        return true;
    }
    match viewer {
        Some(user) => user.role == Role::Admin || user.id == comment.user_id,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn comment_by(user_id: i32, is_displayed: bool) -> comment::Model {
        comment::Model {
            id: Uuid::new_v4(),
            user_id,
            snippet_id: Uuid::new_v4(),
            created_at: chrono::Utc::now().naive_utc(),
            content: "nice beat".to_string(),
            ip_address: Some("203.0.113.7".to_string()),
            is_displayed,
        }
    }

    fn viewer(id: i32, role: Role) -> AuthUser {
        AuthUser {
            id,
            username: format!("user{}", id),
            role,
        }
    }

    #[test]
    fn displayed_comments_are_public() {
        let comment = comment_by(1, true);
        assert!(visible_to(&comment, None));
        assert!(visible_to(&comment, Some(&viewer(2, Role::User))));
    }

    #[test]
    fn hidden_comments_only_show_to_author_and_moderators() {
        let comment = comment_by(1, false);
        assert!(!visible_to(&comment, None));
        assert!(!visible_to(&comment, Some(&viewer(2, Role::User))));
        assert!(visible_to(&comment, Some(&viewer(1, Role::User))));
        assert!(visible_to(&comment, Some(&viewer(3, Role::Admin))));
    }
}
