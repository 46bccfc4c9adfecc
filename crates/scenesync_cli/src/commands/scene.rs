//! Scene load and save commands.

use scenesync_codec::{Element, RoomKey};
use scenesync_engine::{AppState, ConnectionId, Room, SaveOutcome, SceneSync};
use scenesync_storage::{SceneStore, StoreConfig};
use serde::Serialize;
use std::path::Path;

/// Summary printed after a save.
#[derive(Debug, Serialize)]
pub struct SaveReport {
    /// Room id.
    pub room: String,
    /// `skipped`, `created` or `reconciled`.
    pub outcome: &'static str,
    /// Number of elements now stored.
    pub elements: usize,
}

impl SaveReport {
    fn new(room: &str, outcome: &SaveOutcome) -> Self {
        let label = match outcome {
            SaveOutcome::Skipped => "skipped",
            SaveOutcome::Created(_) => "created",
            SaveOutcome::Reconciled(_) => "reconciled",
        };
        Self {
            room: room.to_string(),
            outcome: label,
            elements: outcome.elements().map_or(0, <[Element]>::len),
        }
    }
}

/// Runs the load command.
pub async fn load(
    config: &StoreConfig,
    room_id: &str,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = RoomKey::parse(key)?;
    let engine = SceneSync::with_store(SceneStore::open(config).await?);

    let elements = engine
        .load(room_id, &key, None)
        .await?
        .ok_or_else(|| format!("No scene stored for room {room_id:?}"))?;
    println!("{}", serde_json::to_string_pretty(&elements)?);
    Ok(())
}

/// Runs the save command.
pub async fn save(
    config: &StoreConfig,
    room_id: &str,
    key: &str,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = RoomKey::parse(key)?;
    let elements = read_elements(input)?;
    let engine = SceneSync::with_store(SceneStore::open(config).await?);

    let room = Room::new(room_id, key, ConnectionId::new());
    let outcome = engine.save(&room, &elements, &AppState::new()).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&SaveReport::new(room_id, &outcome))?
    );
    Ok(())
}

fn read_elements(path: &Path) -> Result<Vec<Element>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let elements = serde_json::from_slice(&bytes)
        .map_err(|e| format!("{} is not an element array: {e}", path.display()))?;
    Ok(elements)
}
