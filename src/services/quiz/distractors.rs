use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::ports::catalog::{CatalogError, Song, SongCatalog, SongFilter};
use crate::services::quiz::Choice;

pub const DISTRACTOR_COUNT: usize = 3;

/// Well-known songs used when the catalog is too small to supply enough wrong answers.
const PLACEHOLDER_POOL: &[(&str, &str)] = &[
    ("Shape of You", "Ed Sheeran"),
    ("Blinding Lights", "The Weeknd"),
    ("Someone Like You", "Adele"),
    ("Bohemian Rhapsody", "Queen"),
    ("Billie Jean", "Michael Jackson"),
    ("Hotel California", "Eagles"),
    ("Despacito", "Luis Fonsi"),
    ("Uptown Funk", "Mark Ronson ft. Bruno Mars"),
    ("Smells Like Teen Spirit", "Nirvana"),
    ("Rolling in the Deep", "Adele"),
    ("Let It Be", "The Beatles"),
    ("Take On Me", "a-ha"),
];

const PLACEHOLDER_ID_PREFIX: &str = "placeholder-";

pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_ID_PREFIX)
}

fn placeholder_id() -> String {
    format!("{PLACEHOLDER_ID_PREFIX}{}", Uuid::new_v4())
}

fn pair_key(title: &str, artist: &str) -> (String, String) {
    (title.trim().to_lowercase(), artist.trim().to_lowercase())
}

/// Distractors picked so far, plus what later picks must avoid.
struct Selection {
    excluded_ids: HashSet<i64>,
    taken_pairs: HashSet<(String, String)>,
    taken_titles: HashSet<String>,
    chosen: Vec<Choice>,
}

impl Selection {
    fn new(answer: &Song) -> Self {
        Self {
            excluded_ids: HashSet::from([answer.id]),
            taken_pairs: HashSet::from([pair_key(&answer.title, &answer.artist)]),
            taken_titles: HashSet::from([answer.title.trim().to_lowercase()]),
            chosen: Vec::with_capacity(DISTRACTOR_COUNT),
        }
    }

    fn missing(&self) -> usize {
        DISTRACTOR_COUNT.saturating_sub(self.chosen.len())
    }

    /// Takes catalog songs in order until full. Every offered id is excluded from
    /// later batches, including songs skipped as duplicates of a taken pair.
    fn admit(mut self, batch: Vec<Song>) -> Self {
        for song in batch {
            self.excluded_ids.insert(song.id);
            if self.missing() == 0 {
                continue;
            }
            if !self
                .taken_pairs
                .insert(pair_key(&song.title, &song.artist))
            {
                tracing::debug!(
                    "Skipping duplicate distractor '{}' by '{}'",
                    song.title,
                    song.artist
                );
                continue;
            }
            self.taken_titles.insert(song.title.trim().to_lowercase());
            self.chosen.push(Choice::from(&song));
        }
        self
    }

    /// Pads with placeholders whose titles are not already on offer.
    fn fill_with_placeholders<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let mut pool: Vec<&(&str, &str)> = PLACEHOLDER_POOL.iter().collect();
        pool.shuffle(rng);

        for (title, artist) in pool {
            if self.missing() == 0 {
                break;
            }
            if !self.taken_titles.insert(title.to_lowercase()) {
                continue;
            }
            self.chosen.push(Choice {
                id: placeholder_id(),
                title: title.to_string(),
                artist: artist.to_string(),
            });
        }
        self
    }
}

/// Pulls batches matching `filter` until the selection is full or the catalog runs dry.
async fn drain<C: SongCatalog + ?Sized>(
    catalog: &C,
    mut selection: Selection,
    filter: Option<&SongFilter>,
) -> Result<Selection, CatalogError> {
    while selection.missing() > 0 {
        let batch = catalog
            .sample_excluding(&selection.excluded_ids, filter, selection.missing())
            .await?;
        if batch.is_empty() {
            break;
        }
        selection = selection.admit(batch);
    }
    Ok(selection)
}

/// Picks three wrong answers for `answer`: same-source songs first, then any other
/// catalog song, then placeholders.
pub async fn select_distractors<C, R>(
    catalog: &C,
    answer: &Song,
    rng: &mut R,
) -> Result<Vec<Choice>, CatalogError>
where
    C: SongCatalog + ?Sized,
    R: Rng + Send + ?Sized,
{
    let selection = Selection::new(answer);
    let same_source = SongFilter::by_source(answer.source);
    let selection = drain(catalog, selection, Some(&same_source)).await?;
    let selection = drain(catalog, selection, None).await?;

    if selection.missing() > 0 {
        tracing::info!(
            "Catalog only supplied {} distractor(s) for song {}, padding with placeholders",
            selection.chosen.len(),
            answer.id
        );
    }

    Ok(selection.fill_with_placeholders(rng).chosen)
}
