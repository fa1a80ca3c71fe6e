use std::time::Duration;

use rand::seq::IndexedRandom;
use uuid::Uuid;

use repsync_core::player::Player;
use repsync_core::room::RoomStatus;

use crate::state::AppState;
use crate::store::NewPlayer;
use crate::ws::room_sync_frame;

/// Fixed display-name pool for synthetic players.
const BOT_NAMES: &[&str] = &[
    "CyberJock",
    "RepReaper",
    "CardioKing",
    "GlitchFit",
    "NeonStrider",
    "PulseRider",
    "Zinc",
    "Chrom",
    "Flux",
];

/// Pick an unused name from the pool, falling back to a numbered name
/// once the pool is exhausted. The numbered fallback skips names already
/// in the roster, so a player named `Bot-11` never collides.
fn pick_bot_name(existing: &[Player]) -> String {
    let available: Vec<&&str> = BOT_NAMES
        .iter()
        .filter(|name| !existing.iter().any(|p| p.name == **name))
        .collect();
    match available.choose(&mut rand::rng()) {
        Some(name) => (*name).to_string(),
        None => {
            let mut n = existing.len() + 1;
            loop {
                let candidate = format!("Bot-{n}");
                if !existing.iter().any(|p| p.name == candidate) {
                    break candidate;
                }
                n += 1;
            }
        },
    }
}

/// Schedule a delayed fill check for an under-populated lobby. Called on
/// every inbound message; at most one check is pending per room, and it
/// is canceled if the room starts or empties out before it fires.
pub(crate) async fn maybe_schedule_fill(state: &AppState, room_code: &str) {
    let min_players = state.config.bots.min_players;
    {
        let registry = state.registry.read().await;
        if registry.connection_count(room_code) >= min_players
            || registry.has_pending_botfill(room_code)
        {
            return;
        }
    }
    let in_lobby = {
        let store = state.store.read().await;
        store
            .get_room(room_code)
            .is_some_and(|r| r.status == RoomStatus::Lobby)
    };
    if !in_lobby {
        return;
    }

    tracing::debug!(room = room_code, "Scheduling bot-fill check");
    let handle = tokio::spawn(fill_check(state.clone(), room_code.to_string()));
    let mut registry = state.registry.write().await;
    registry.set_botfill(room_code, handle);
}

/// The delayed check. Re-reads the durable player count rather than the
/// live-connection count so a transient disconnect does not spawn a bot
/// into a room that is actually populated.
async fn fill_check(state: AppState, room_code: String) {
    tokio::time::sleep(Duration::from_millis(state.config.bots.fill_delay_ms)).await;

    let min_players = state.config.bots.min_players;
    let bot = {
        let mut store = state.store.write().await;
        let still_lobby = store
            .get_room(&room_code)
            .is_some_and(|r| r.status == RoomStatus::Lobby);
        let roster = store.get_room_players(&room_code);
        if !still_lobby || roster.len() >= min_players {
            None
        } else {
            let name = pick_bot_name(&roster);
            Some(store.add_player(NewPlayer {
                room_code: room_code.clone(),
                session_id: Uuid::new_v4().to_string(),
                name,
                ready: true,
                is_host: false,
                is_bot: true,
            }))
        }
    };

    if let Some(bot) = bot {
        tracing::info!(
            room = %room_code,
            bot_id = bot.id,
            name = %bot.name,
            "Filled under-populated room with bot"
        );
        if let Some(sync) = room_sync_frame(&state, &room_code).await {
            let registry = state.registry.read().await;
            registry.broadcast(&room_code, &sync);
        }
    }

    let mut registry = state.registry.write().await;
    registry.clear_botfill(&room_code);
}
