mod common;

use presong::entities::snippet::SnippetState;
use presong::repo;

use common::*;

#[tokio::test]
async fn anonymous_viewers_see_only_published_snippets() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let artist = create_artist(&db, &account).await;

    // One snippet per song, as uploads create them.
    let processing_song = create_song(&db, artist.id).await;
    create_snippet(&db, processing_song.id, SnippetFixture::default()).await;

    let ready_song = create_song(&db, artist.id).await;
    create_snippet(
        &db,
        ready_song.id,
        SnippetFixture {
            state: SnippetState::Ready,
            audio_mp3: Some("snippets/audio/mp3/a.mp3".to_string()),
            analysis_data: Some(analysis_blob()),
        },
    )
    .await;

    let published_song = create_song(&db, artist.id).await;
    let published = create_snippet(
        &db,
        published_song.id,
        SnippetFixture {
            state: SnippetState::Published,
            audio_mp3: Some("snippets/audio/mp3/b.mp3".to_string()),
            analysis_data: Some(analysis_blob()),
        },
    )
    .await;

    let visible = repo::snippets::visible_to(&db, None).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, published.id);
}

#[tokio::test]
async fn artists_see_their_own_drafts_but_not_others() {
    let db = setup_db().await;
    let owner_account = create_user(&db, "ada").await;
    let other_account = create_user(&db, "eve").await;
    let owner = create_artist(&db, &owner_account).await;
    let other = create_artist(&db, &other_account).await;

    let own_draft_song = create_song(&db, owner.id).await;
    let own_draft = create_snippet(&db, own_draft_song.id, SnippetFixture::default()).await;
    let own_published_song = create_song(&db, owner.id).await;
    let own_published = create_snippet(
        &db,
        own_published_song.id,
        SnippetFixture {
            state: SnippetState::Published,
            audio_mp3: Some("snippets/audio/mp3/a.mp3".to_string()),
            analysis_data: Some(analysis_blob()),
        },
    )
    .await;

    let foreign_draft_song = create_song(&db, other.id).await;
    let foreign_draft = create_snippet(&db, foreign_draft_song.id, SnippetFixture::default()).await;
    let foreign_published_song = create_song(&db, other.id).await;
    let foreign_published = create_snippet(
        &db,
        foreign_published_song.id,
        SnippetFixture {
            state: SnippetState::Published,
            audio_mp3: Some("snippets/audio/mp3/b.mp3".to_string()),
            analysis_data: Some(analysis_blob()),
        },
    )
    .await;

    let viewer = viewer_for(&owner_account);
    let visible = repo::snippets::visible_to(&db, Some(&viewer)).await.unwrap();
    let ids: Vec<_> = visible.iter().map(|s| s.id).collect();

    assert!(ids.contains(&own_draft.id));
    assert!(ids.contains(&own_published.id));
    assert!(ids.contains(&foreign_published.id));
    assert!(!ids.contains(&foreign_draft.id));
}

#[tokio::test]
async fn find_visible_hides_drafts_from_strangers() {
    let db = setup_db().await;
    let owner_account = create_user(&db, "ada").await;
    let other_account = create_user(&db, "eve").await;
    let owner = create_artist(&db, &owner_account).await;
    create_artist(&db, &other_account).await;
    let song = create_song(&db, owner.id).await;
    let draft = create_snippet(&db, song.id, SnippetFixture::default()).await;

    assert!(repo::snippets::find_visible(&db, None, draft.id)
        .await
        .unwrap()
        .is_none());

    let stranger = viewer_for(&other_account);
    assert!(repo::snippets::find_visible(&db, Some(&stranger), draft.id)
        .await
        .unwrap()
        .is_none());

    let viewer = viewer_for(&owner_account);
    assert!(repo::snippets::find_visible(&db, Some(&viewer), draft.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn artist_page_respects_visibility_rules() {
    let db = setup_db().await;
    let owner_account = create_user(&db, "ada").await;
    let other_account = create_user(&db, "eve").await;
    let owner = create_artist(&db, &owner_account).await;
    create_artist(&db, &other_account).await;

    let draft_song = create_song(&db, owner.id).await;
    let draft = create_snippet(&db, draft_song.id, SnippetFixture::default()).await;
    let published_song = create_song(&db, owner.id).await;
    let published = create_snippet(
        &db,
        published_song.id,
        SnippetFixture {
            state: SnippetState::Published,
            audio_mp3: Some("snippets/audio/mp3/a.mp3".to_string()),
            analysis_data: Some(analysis_blob()),
        },
    )
    .await;

    let public_view = repo::snippets::visible_for_artist(&db, None, owner.id)
        .await
        .unwrap();
    assert_eq!(public_view.len(), 1);
    assert_eq!(public_view[0].id, published.id);

    let owner_view =
        repo::snippets::visible_for_artist(&db, Some(&viewer_for(&owner_account)), owner.id)
            .await
            .unwrap();
    let ids: Vec<_> = owner_view.iter().map(|s| s.id).collect();
    assert!(ids.contains(&draft.id));
    assert!(ids.contains(&published.id));
}

#[tokio::test]
async fn comments_keep_creation_order_and_are_retained_when_hidden() {
    use presong::entities::comment;
    use sea_orm::{ActiveModelTrait, Set};
    use uuid::Uuid;

    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let snippet_model = create_snippet(&db, song.id, SnippetFixture::default()).await;

    let base = chrono::Utc::now().naive_utc();
    for (offset, (text, displayed)) in
        [("first", true), ("second", false), ("third", true)].into_iter().enumerate()
    {
        comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(account.id),
            snippet_id: Set(snippet_model.id),
            created_at: Set(base + chrono::Duration::seconds(offset as i64)),
            content: Set(text.to_string()),
            ip_address: Set(None),
            is_displayed: Set(displayed),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let all = repo::comments::for_snippet(&db, snippet_model.id).await.unwrap();
    let contents: Vec<_> = all.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    // The hidden one drops out of the public view but stays stored.
    let public: Vec<_> = all
        .iter()
        .filter(|c| repo::comments::visible_to(c, None))
        .map(|c| c.content.as_str())
        .collect();
    assert_eq!(public, vec!["first", "third"]);
}
