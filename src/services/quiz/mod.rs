pub mod distractors;
pub mod shuffle;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::instrument;

use crate::ports::catalog::{CatalogError, Song, SongCatalog, SongFilter};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

pub const CHOICE_COUNT: usize = distractors::DISTRACTOR_COUNT + 1;

/// One multiple-choice option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub title: String,
    pub artist: String,
}

impl From<&Song> for Choice {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id.to_string(),
            title: song.title.clone(),
            artist: song.artist.clone(),
        }
    }
}

/// A generated quiz round. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub clip: PlayableReference,
    pub choices: Vec<Choice>,
    pub correct_answer_id: String,
}

impl Question {
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == self.correct_answer_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("No songs available in the catalog")]
    EmptyCatalog,

    #[error("Failed to prepare a clip: {0}")]
    ClipExtractionFailed(#[from] ClipError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Builds quiz questions from the current catalog. Holds no state between calls.
pub struct QuizService<C: SongCatalog> {
    catalog: C,
    resolver: Arc<dyn ClipResolver>,
}

impl<C: SongCatalog> QuizService<C> {
    pub fn new(catalog: C, resolver: Arc<dyn ClipResolver>) -> Self {
        Self { catalog, resolver }
    }

    #[instrument(skip(self))]
    pub async fn generate_question(&self) -> Result<Question, QuizError> {
        let mut rng = StdRng::from_entropy();
        self.generate_question_with(&mut rng).await
    }

    /// Same as `generate_question`, drawing the placeholder order and the shuffle from `rng`.
    pub async fn generate_question_with<R: Rng + Send>(
        &self,
        rng: &mut R,
    ) -> Result<Question, QuizError> {
        let answer = self.pick_song().await?;
        tracing::debug!(
            "Selected song {} '{}' by '{}'",
            answer.id,
            answer.title,
            answer.artist
        );

        let clip = self.resolver.resolve(&answer).await.map_err(|e| {
            tracing::error!("Failed to resolve clip for song {}: {}", answer.id, e);
            e
        })?;

        let distractors =
            distractors::select_distractors(&self.catalog, &answer, &mut *rng).await?;

        let correct = Choice::from(&answer);
        let correct_answer_id = correct.id.clone();
        let mut choices = Vec::with_capacity(CHOICE_COUNT);
        choices.push(correct);
        choices.extend(distractors);
        debug_assert_eq!(choices.len(), CHOICE_COUNT);

        shuffle::fisher_yates(&mut choices, rng);

        Ok(Question {
            clip,
            choices,
            correct_answer_id,
        })
    }

    /// Picks uniformly among preferred songs when there are any, otherwise among all songs.
    async fn pick_song(&self) -> Result<Song, QuizError> {
        if self.catalog.count().await? == 0 {
            return Err(QuizError::EmptyCatalog);
        }

        let preferred = SongFilter::preferred();
        let filter = if self.catalog.count_where(&preferred).await? > 0 {
            Some(&preferred)
        } else {
            None
        };

        // The catalog may have been emptied since it was counted
        self.catalog
            .sample_one(filter)
            .await?
            .ok_or(QuizError::EmptyCatalog)
    }
}
