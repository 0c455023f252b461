use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short preview of a song, the unit users browse, comment on and order
/// against.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "snippets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub song_id: Uuid,
    pub title: String,
    pub state: SnippetState,
    /// Human-readable reason the last processing attempt failed. Only
    /// meaningful while state is `processing_error`.
    pub processing_error: Option<String>,
    pub created_at: DateTime,
    /// Blob key of the cover image.
    pub image: String,
    /// Blob key of the raw audio as uploaded by the artist.
    pub uploaded_audio: Option<String>,
    /// Blob key of the transcoded streaming rendition.
    pub audio_mp3: Option<String>,
    /// Beat/metadata blob from the analysis provider, used by the front-end
    /// visualisation.
    pub analysis_data: Option<Json>,
    pub visual_effect: VisualEffect,
}

#[derive(EnumIter, DeriveActiveEnum, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum SnippetState {
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "processing_error")]
    ProcessingError,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "published")]
    Published,
}

#[derive(EnumIter, DeriveActiveEnum, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum VisualEffect {
    #[sea_orm(string_value = "pulsate")]
    Pulsate,
    #[sea_orm(string_value = "none")]
    None,
}

impl Model {
    pub fn audio_ready(&self) -> bool {
        self.audio_mp3.is_some()
    }

    /// Beat start times in seconds, extracted from the analysis blob.
    /// Missing or malformed data yields an empty list rather than an error;
    /// the visualisation simply stays static.
    pub fn beat_locations(&self) -> Vec<f64> {
        let Some(data) = &self.analysis_data else {
            return Vec::new();
        };
        data.get("beats")
            .and_then(|beats| beats.as_array())
            .map(|beats| {
                beats
                    .iter()
                    .filter_map(|beat| beat.get("start").and_then(|s| s.as_f64()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::song::Entity",
        from = "Column::SongId",
        to = "super::song::Column::Id",
        on_delete = "Cascade"
    )]
    Song,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::job::Entity")]
    Job,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Song.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snippet_with_analysis(analysis: Option<serde_json::Value>) -> Model {
        Model {
            id: Uuid::new_v4(),
            song_id: Uuid::new_v4(),
            title: "test".to_string(),
            state: SnippetState::Processing,
            processing_error: None,
            created_at: chrono::Utc::now().naive_utc(),
            image: "snippets/images/x.jpg".to_string(),
            uploaded_audio: None,
            audio_mp3: None,
            analysis_data: analysis,
            visual_effect: VisualEffect::Pulsate,
        }
    }

    #[test]
    fn beat_locations_extracts_start_times() {
        let snippet = snippet_with_analysis(Some(json!({
            "beats": [
                {"start": 0.5, "duration": 0.4},
                {"start": 0.9, "duration": 0.4},
                {"start": 1.3, "duration": 0.4}
            ]
        })));
        assert_eq!(snippet.beat_locations(), vec![0.5, 0.9, 1.3]);
    }

    #[test]
    fn beat_locations_tolerates_missing_or_malformed_data() {
        assert!(snippet_with_analysis(None).beat_locations().is_empty());
        assert!(snippet_with_analysis(Some(json!({}))).beat_locations().is_empty());
        assert!(snippet_with_analysis(Some(json!({"beats": "nope"})))
            .beat_locations()
            .is_empty());
        // Entries without a numeric start are skipped, not fatal.
        let partial = snippet_with_analysis(Some(json!({
            "beats": [{"start": 0.5}, {"duration": 0.4}]
        })));
        assert_eq!(partial.beat_locations(), vec![0.5]);
    }

    #[test]
    fn audio_ready_tracks_transcoded_rendition() {
        let mut snippet = snippet_with_analysis(None);
        assert!(!snippet.audio_ready());
        snippet.audio_mp3 = Some("snippets/audio/mp3/x.mp3".to_string());
        assert!(snippet.audio_ready());
    }
}
